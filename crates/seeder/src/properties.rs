//! Line-oriented `key=value` documents

use std::collections::BTreeMap;

use crate::document::DocumentError;

/// Parses a Java-style `.properties` document.
///
/// Supports `#`/`!` comment lines, `=`, `:` or whitespace separators,
/// backslash line continuation and the `\t \n \r \f \\ \uXXXX` escapes.
/// A repeated key keeps its last value.
pub fn parse_properties(input: &str) -> Result<BTreeMap<String, String>, DocumentError> {
    let mut props = BTreeMap::new();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        let line_no = index + 1;
        props.insert(unescape(key, line_no)?, unescape(value, line_no)?);
    }

    Ok(props)
}

/// Parses the simple `key = value` TOML subset used by flat legacy files.
///
/// Section headers and comments are ignored; surrounding spaces and quotes
/// are trimmed from keys and values.
pub fn parse_line_toml(input: &str) -> BTreeMap<String, String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with('['))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (trim_quoted(key), trim_quoted(value)))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn trim_quoted(s: &str) -> String {
    s.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\'' || c == '"')
        .to_string()
}

/// A line continues when it ends in an odd number of backslashes.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim_start();
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, DocumentError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| DocumentError::Properties {
                        line,
                        message: format!("invalid unicode escape \\u{hex}"),
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}
