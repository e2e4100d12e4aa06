use async_trait::async_trait;
use config_seed_config::RegistryConfig;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::{RegistryClient, RegistryError, Result};

/// Agent endpoint used by the reachability poll
pub const AGENT_STATUS_PATH: &str = "v1/agent/self";

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul HTTP API client
pub struct ConsulClient {
    base_url: Url,
    client: reqwest::Client,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| RegistryError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            token: None,
        })
    }

    /// Create a client for the agent described by the process configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let client = Self::new(&config.url())?;
        Ok(match &config.token {
            Some(token) if !token.is_empty() => client.with_token(token.clone()),
            _ => client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Probe the local agent; any 2xx response counts as reachable.
    pub async fn agent_self(&self) -> Result<()> {
        let url = self.endpoint(AGENT_STATUS_PATH.split('/'))?;
        let response = self.request(Method::GET, url).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Reachability probe: the agent answers and the cluster has a leader.
    pub async fn ping(&self) -> Result<()> {
        self.agent_self().await?;
        self.leader_status().await
    }

    /// URL of the KV endpoint for `key`, each segment percent-encoded.
    pub fn kv_url(&self, key: &str) -> Result<Url> {
        self.endpoint(["v1", "kv"].into_iter().chain(key.split('/')))
    }

    fn endpoint<I, S>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!("Consul API error: {} - {}", status, body);
    Err(RegistryError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RegistryClient for ConsulClient {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let url = self.kv_url(key)?;
        debug!(%url, bytes = value.len(), "PUT key");

        let response = self
            .request(Method::PUT, url)
            .body(value.to_vec())
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        // Consul answers a KV write with a bare JSON boolean.
        if body.trim() == "true" {
            Ok(())
        } else {
            Err(RegistryError::Rejected(key.to_string()))
        }
    }

    async fn delete_tree(&self, prefix: &str) -> Result<()> {
        let url = self.kv_url(prefix)?;
        debug!(%url, "DELETE tree");

        let response = self
            .request(Method::DELETE, url)
            .query(&[("recurse", "true")])
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let url = self.kv_url(prefix)?;

        let response = self
            .request(Method::GET, url)
            .query(&[("keys", "true")])
            .send()
            .await?;

        // No key under the prefix.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        check_status(response)
            .await?
            .json::<Vec<String>>()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("Failed to parse key list: {e}")))
    }

    async fn leader_status(&self) -> Result<()> {
        let url = self.endpoint(["v1", "status", "leader"])?;
        let response = self.request(Method::GET, url).send().await?;
        let leader: String = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::Unavailable(format!("Failed to parse leader: {e}")))?;
        if leader.is_empty() {
            return Err(RegistryError::NoLeader);
        }
        debug!(%leader, "registry leader elected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serves one canned `(status line, body)` response per connection and
    /// hands back the raw requests it received.
    async fn stub_agent(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (ConsulClient, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
            requests
        });

        let client = ConsulClient {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..ConsulClient::new(&format!("http://{addr}")).unwrap()
        };
        (client, handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_put_sends_raw_body_and_token() {
        let (client, server) = stub_agent(vec![("200 OK", "true")]).await;
        let client = client.with_token("secret");

        client.put("config/core-data/Service/Port", b"48080").await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("PUT /v1/kv/config/core-data/Service/Port HTTP/1.1"));
        assert!(requests[0].to_lowercase().contains("x-consul-token: secret"));
        assert!(requests[0].ends_with("\r\n\r\n48080"));
    }

    #[tokio::test]
    async fn test_put_rejected_when_consul_answers_false() {
        let (client, server) = stub_agent(vec![("200 OK", "false")]).await;

        let err = client.put("config/a", b"1").await.unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(ref key) if key == "config/a"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_put_error_status() {
        let (client, server) = stub_agent(vec![("403 Forbidden", "ACL not found")]).await;

        let err = client.put("config/a", b"1").await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Status { status: 403, ref body } if body == "ACL not found"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_tree_is_recursive() {
        let (client, server) = stub_agent(vec![("200 OK", "true")]).await;

        client.delete_tree("config").await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("DELETE /v1/kv/config?recurse=true HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_list_keys() {
        let (client, server) = stub_agent(vec![
            ("200 OK", r#"["config/a","config/b/c"]"#),
            ("404 Not Found", ""),
        ])
        .await;

        let keys = client.list_keys("config").await.unwrap();
        assert_eq!(keys, vec!["config/a".to_string(), "config/b/c".to_string()]);

        // No key under the prefix.
        assert!(client.list_keys("missing").await.unwrap().is_empty());

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /v1/kv/config?keys=true HTTP/1.1"));
        assert!(requests[1].starts_with("GET /v1/kv/missing?keys=true HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_list_keys_malformed_body() {
        let (client, server) = stub_agent(vec![("200 OK", "not json")]).await;

        let err = client.list_keys("config").await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_leader_status() {
        let (client, server) = stub_agent(vec![
            ("200 OK", r#""10.0.0.1:8300""#),
            ("200 OK", r#""""#),
        ])
        .await;

        client.leader_status().await.unwrap();
        assert!(matches!(
            client.leader_status().await,
            Err(RegistryError::NoLeader)
        ));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /v1/status/leader HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_agent_self_accepts_any_success_status() {
        let (client, server) = stub_agent(vec![
            ("204 No Content", ""),
            ("500 Internal Server Error", "agent down"),
        ])
        .await;

        client.agent_self().await.unwrap();
        assert!(matches!(
            client.agent_self().await,
            Err(RegistryError::Status { status: 500, .. })
        ));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /v1/agent/self HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_ping_requires_leader() {
        let (client, server) = stub_agent(vec![("200 OK", "{}"), ("200 OK", r#""""#)]).await;

        assert!(matches!(client.ping().await, Err(RegistryError::NoLeader)));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /v1/agent/self HTTP/1.1"));
        assert!(requests[1].starts_with("GET /v1/status/leader HTTP/1.1"));
    }

    #[test]
    fn test_kv_url_encodes_segments() {
        let client = ConsulClient::new("http://localhost:8500").unwrap();

        assert_eq!(
            client.kv_url("config/core-data/Service/Port").unwrap().as_str(),
            "http://localhost:8500/v1/kv/config/core-data/Service/Port"
        );
        assert_eq!(
            client.kv_url("config/a b/50%").unwrap().as_str(),
            "http://localhost:8500/v1/kv/config/a%20b/50%25"
        );
    }

    #[test]
    fn test_base_url_with_path() {
        let client = ConsulClient::new("https://gateway.local/consul/").unwrap();
        assert_eq!(
            client.kv_url("config").unwrap().as_str(),
            "https://gateway.local/consul/v1/kv/config"
        );
    }

    #[test]
    fn test_from_config() {
        let config = RegistryConfig {
            host: "edgex-core-consul".to_string(),
            token: Some("secret".to_string()),
            ..Default::default()
        };
        let client = ConsulClient::from_config(&config).unwrap();

        assert_eq!(client.base_url().as_str(), "http://edgex-core-consul:8500/");
        assert_eq!(client.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            ConsulClient::new("not a url"),
            Err(RegistryError::InvalidUrl(_))
        ));
        assert!(matches!(
            ConsulClient::new("mailto:ops@example.com"),
            Err(RegistryError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires a local Consul agent
    async fn test_consul_round_trip() {
        let client = ConsulClient::new("http://localhost:8500").unwrap();
        client.agent_self().await.unwrap();
        client.leader_status().await.unwrap();

        client.put("config-seed-test/key", b"value").await.unwrap();
        let keys = client.list_keys("config-seed-test").await.unwrap();
        assert_eq!(keys, vec!["config-seed-test/key".to_string()]);

        client.delete_tree("config-seed-test").await.unwrap();
        assert!(client.list_keys("config-seed-test").await.unwrap().is_empty());
    }
}
