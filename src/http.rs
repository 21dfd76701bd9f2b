use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONNECTION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, redirect};

use crate::config::{HttpOptions, PingOptions};
use crate::destination::Destination;
use crate::error::{PingError, Result};
use crate::history::Outcome;
use crate::probe::Probe;

/// One HTTP request per probe against the destination URL.
///
/// Connections are never reused so every sample includes the connect
/// and TLS handshake. Certificates are not verified and redirects are
/// not followed, so anything other than a 2xx answer is a loss.
pub struct HttpProbe {
    client: Client,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl HttpProbe {
    pub fn new(opts: &PingOptions, http: &HttpOptions) -> Result<Self> {
        let method = Method::from_bytes(http.method.to_uppercase().as_bytes())
            .map_err(|_| PingError::InvalidOptions(format!("invalid HTTP method {:?}", http.method)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &http.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PingError::InvalidOptions(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PingError::InvalidOptions(format!("invalid header value {value:?}: {e}")))?;
            headers.append(name, value);
        }
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let client = Client::builder()
            .timeout(opts.timeout)
            .connect_timeout(opts.timeout)
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(1))
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| PingError::setup("http", e))?;

        Ok(Self {
            client,
            method,
            headers,
            body: http.body.clone(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn measure(&self, dest: &Destination) -> Outcome {
        let mut request = self
            .client
            .request(self.method.clone(), dest.host())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("ping host({}) error: {e}", dest.host());
                return Outcome::Failure;
            }
        };

        let status = response.status();
        if let Err(e) = response.bytes().await {
            log::warn!("ping host({}) read body error: {e}", dest.host());
            return Outcome::Failure;
        }
        let rtt = start.elapsed();

        if !status.is_success() {
            log::warn!("ping host({}) answered {status}", dest.host());
            return Outcome::Failure;
        }
        log::debug!("http {} {} -> {status} in {rtt:?}", self.method, dest.host());
        Outcome::Success(rtt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `status_line` to every connection and returns the base URL.
    async fn serve(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut chunk = [0u8; 1024];
                    while let Ok(Ok(n)) =
                        tokio::time::timeout(Duration::from_millis(100), socket.read(&mut chunk)).await
                    {
                        if n == 0 {
                            break;
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/")
    }

    fn probe(http: HttpOptions) -> HttpProbe {
        HttpProbe::new(&PingOptions::default(), &http).unwrap()
    }

    #[tokio::test]
    async fn ok_response_is_a_success() {
        let url = serve("200 OK").await;
        let dest = Destination::new(url, 4);
        assert!(probe(HttpOptions::default()).measure(&dest).await.is_success());
    }

    #[tokio::test]
    async fn unfollowed_redirect_is_a_failure() {
        let url = serve("301 Moved Permanently").await;
        let dest = Destination::new(url, 4);
        assert_eq!(probe(HttpOptions::default()).measure(&dest).await, Outcome::Failure);
    }

    #[tokio::test]
    async fn server_error_is_a_failure() {
        let url = serve("503 Service Unavailable").await;
        let dest = Destination::new(url, 4);
        assert_eq!(probe(HttpOptions::default()).measure(&dest).await, Outcome::Failure);
    }

    #[tokio::test]
    async fn post_with_body_and_headers() {
        let url = serve("201 Created").await;
        let http = HttpOptions::default()
            .with_method("post")
            .with_body("{}")
            .with_header("Content-Type", "application/json");
        let dest = Destination::new(url, 4);
        assert!(probe(http).measure(&dest).await.is_success());
    }

    #[tokio::test]
    async fn invalid_url_is_a_failure() {
        let dest = Destination::new("not a url", 4);
        assert_eq!(probe(HttpOptions::default()).measure(&dest).await, Outcome::Failure);
    }

    #[test]
    fn invalid_method_is_rejected() {
        let http = HttpOptions::default().with_method("GE T");
        let err = HttpProbe::new(&PingOptions::default(), &http).err().unwrap();
        assert!(matches!(err, PingError::InvalidOptions(_)));
    }

    #[test]
    fn connection_close_is_always_sent() {
        let probe = probe(HttpOptions::default().with_header("Connection", "keep-alive"));
        assert_eq!(probe.headers.get_all(CONNECTION).iter().count(), 1);
        assert_eq!(probe.headers[CONNECTION], "close");
    }
}
