use crate::config::{PortalConfig, RequestMethod};
use crate::models::target::PollTarget;
use anyhow::Context;
use log::debug;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl NetworkError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout { url: url.to_string() }
        } else if let Some(status) = e.status() {
            NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            NetworkError::Connection {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

/// Source of status pages.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, target: &PollTarget) -> Result<String, NetworkError>;
}

/// Fetches status pages from the Mobile Alerts web portal.
pub struct PortalClient {
    client: reqwest::Client,
    url: String,
    method: RequestMethod,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: config.url(),
            method: config.method,
        })
    }
}

impl Fetch for PortalClient {
    async fn fetch(&self, target: &PollTarget) -> Result<String, NetworkError> {
        let start = Instant::now();
        let params = [("phoneid", target.phone_id.as_str())];

        let request = match self.method {
            RequestMethod::Get => self.client.get(&self.url).query(&params),
            RequestMethod::Post => self.client.post(&self.url).form(&params),
        };

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| NetworkError::from_reqwest(&self.url, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::from_reqwest(&self.url, e))?;

        debug!(
            "Fetched {} bytes for phone id {} in {} ms",
            body.len(),
            target.phone_id,
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

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
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|value| value.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serves `response` to a single connection and hands back the raw request.
    async fn serve_once(response: &'static str) -> (PortalConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });

        (local_config(port), server)
    }

    fn local_config(port: u16) -> PortalConfig {
        PortalConfig {
            scheme: "http".to_string(),
            hostname: format!("127.0.0.1:{}", port),
            timeout: 2,
            ..PortalConfig::default()
        }
    }

    fn target() -> PollTarget {
        PollTarget::new("123456789012", Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_get_sends_phone_id_query() {
        let (config, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<h1>Hallo</h1",
        )
        .await;

        let body = PortalClient::new(&config).unwrap().fetch(&target()).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(body, "<h1>Hallo</h1");
        assert!(request.starts_with("GET /Home/SensorsOverview?phoneid=123456789012 HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("user-agent: mobilealerts/"));
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let (mut config, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        )
        .await;
        config.method = RequestMethod::Post;

        let body = PortalClient::new(&config).unwrap().fetch(&target()).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(body, "ok");
        assert!(request.starts_with("POST /Home/SensorsOverview HTTP/1.1"));
        assert!(request.ends_with("phoneid=123456789012"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (config, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let result = PortalClient::new(&config).unwrap().fetch(&target()).await;
        server.await.unwrap();

        assert!(matches!(result, Err(NetworkError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config(listener.local_addr().unwrap().port());
        config.timeout = 1;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = PortalClient::new(&config).unwrap().fetch(&target()).await;
        server.abort();

        assert!(matches!(result, Err(NetworkError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = local_config(listener.local_addr().unwrap().port());
        drop(listener);

        let result = PortalClient::new(&config).unwrap().fetch(&target()).await;
        assert!(matches!(result, Err(NetworkError::Connection { .. })));
    }
}
