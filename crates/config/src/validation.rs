//! Configuration validation

use crate::{ConfigError, RegistryConfig, Result, SeedConfig, SeedSettings};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire process configuration
pub fn validate_config(config: &SeedConfig) -> Result<()> {
    let mut errors = validate_registry(&config.registry);
    errors.extend(validate_seed(&config.seed));

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::Invalid(error_msg));
    }

    Ok(())
}

fn validate_registry(registry: &RegistryConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match registry.protocol.as_str() {
        "http" | "https" => {}
        other => errors.push(ValidationError::new(
            "registry.protocol",
            format!("invalid protocol '{other}', must be one of: http, https"),
        )),
    }

    if registry.host.trim().is_empty() {
        errors.push(ValidationError::new("registry.host", "host is required"));
    }

    if registry.port == 0 {
        errors.push(ValidationError::new(
            "registry.port",
            "port must be greater than 0",
        ));
    }

    if registry.fail_limit == 0 {
        errors.push(ValidationError::new(
            "registry.fail_limit",
            "must be greater than 0",
        ));
    }

    errors
}

fn validate_seed(seed: &SeedSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if seed.global_prefix.trim_matches('/').is_empty() {
        errors.push(ValidationError::new(
            "seed.global_prefix",
            "global prefix is required",
        ));
    }

    if seed.legacy_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("seed.legacy_path", "path is required"));
    }

    if seed.structured_path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "seed.structured_path",
            "path is required",
        ));
    }

    if seed.acceptable_property_extensions.is_empty() {
        errors.push(ValidationError::new(
            "seed.acceptable_property_extensions",
            "at least one extension is required",
        ));
    }

    if seed.toml_extensions.is_empty() {
        errors.push(ValidationError::new(
            "seed.toml_extensions",
            "at least one extension is required",
        ));
    }

    let lists = [
        ("seed.acceptable_property_extensions", &seed.acceptable_property_extensions),
        ("seed.yaml_extensions", &seed.yaml_extensions),
        ("seed.toml_extensions", &seed.toml_extensions),
    ];
    for (field, list) in lists {
        for (idx, ext) in list.iter().enumerate() {
            if ext.contains(['/', '\\']) {
                errors.push(ValidationError::new(
                    format!("{field}[{idx}]"),
                    format!("'{ext}' is not a file extension"),
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SeedConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = SeedConfig::default();
        config.registry.protocol = "ftp".to_string();
        config.registry.port = 0;
        config.seed.global_prefix = "/".to_string();
        config.seed.toml_extensions.clear();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("registry.protocol"));
        assert!(err.contains("registry.port"));
        assert!(err.contains("seed.global_prefix"));
        assert!(err.contains("seed.toml_extensions"));
    }

    #[test]
    fn test_extension_with_separator_rejected() {
        let mut config = SeedConfig::default();
        config.seed.yaml_extensions = vec!["yaml".to_string(), "a/b".to_string()];

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("seed.yaml_extensions[1]"));
    }
}
