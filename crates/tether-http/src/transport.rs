//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use tether_core::config::ClientConfig;
use tether_core::error::TransportError;
use tether_core::http::{HttpRequest, HttpResponse, Method, Transport};

/// Sends [`HttpRequest`]s over a pooled `reqwest::Client`.
///
/// Every HTTP status is a successful transport outcome; only failures to
/// obtain a response are errors.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport using the config's user agent and timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| map_reqwest(e, config.timeout))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest(e, self.timeout))?;
        let status = response.status().as_u16();
        trace!(status, url = %request.url, "HTTP response");

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest(e, self.timeout))?;

        Ok(HttpResponse::new(status, body))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Classify a reqwest failure.
pub(crate) fn map_reqwest(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::types::BaseUrl;

    #[test]
    fn methods_map_to_reqwest() {
        assert_eq!(reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(reqwest_method(Method::Put), reqwest::Method::PUT);
        assert_eq!(reqwest_method(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let config = ClientConfig::new(BaseUrl::new("http://127.0.0.1:9").unwrap())
            .with_timeout(Duration::from_secs(2));
        let transport = ReqwestTransport::new(&config).unwrap();

        let request = HttpRequest {
            method: Method::Get,
            url: config.base_url.endpoint("/ping"),
            headers: Vec::new(),
            body: None,
        };

        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connection { .. } | TransportError::Timeout { .. }
        ));
    }
}
