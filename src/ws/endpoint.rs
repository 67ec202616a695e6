//! Connection endpoint: target URL plus handshake headers.

use crate::base::error::WsError;
use http::HeaderMap;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use url::Url;

/// An opaque connection target: a `ws`/`wss` URL and the headers applied
/// at handshake time. Immutable once handed to a session.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: Url,
    headers: HeaderMap,
}

impl Endpoint {
    /// Parse an endpoint address.
    ///
    /// Fails with [`WsError::InvalidEndpoint`] if the address is empty,
    /// malformed, has no host, or uses a scheme other than `ws`/`wss`.
    ///
    /// # Example
    /// ```ignore
    /// let endpoint = Endpoint::parse("wss://example.test/v1/uploads/42?websocket=true")?
    ///     .header("Authorization", "Bearer <token>");
    /// ```
    pub fn parse(address: &str) -> Result<Self, WsError> {
        if address.is_empty() {
            return Err(WsError::InvalidEndpoint("empty address".into()));
        }

        let url = Url::parse(address)
            .map_err(|e| WsError::InvalidEndpoint(format!("{address}: {e}")))?;

        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(WsError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(WsError::InvalidEndpoint(format!("{address}: missing host")));
        }

        Ok(Self {
            url,
            headers: HeaderMap::new(),
        })
    }

    /// Add a header to the WebSocket handshake.
    ///
    /// Invalid header names or values are dropped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!("dropping invalid handshake header: {name}"),
        }
        self
    }

    /// The target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The handshake headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Check if secure (wss://).
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Build the HTTP upgrade request for the handshake, with the
    /// endpoint's headers applied on top of the standard upgrade set.
    pub(crate) fn client_request(&self) -> Result<Request, WsError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| WsError::InvalidEndpoint(e.to_string()))?;
        for (name, value) in &self.headers {
            request.headers_mut().insert(name, value.clone());
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let endpoint = Endpoint::parse("ws://example.test/echo").unwrap();
        assert!(!endpoint.is_secure());
        assert_eq!(endpoint.url().host_str(), Some("example.test"));
    }

    #[test]
    fn test_parse_secure_with_query() {
        let endpoint =
            Endpoint::parse("wss://localhost/v1/uploads/42?websocket=true").unwrap();
        assert!(endpoint.is_secure());
        assert_eq!(endpoint.url().query(), Some("websocket=true"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            Endpoint::parse(""),
            Err(WsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_parse_bad_scheme() {
        assert!(matches!(
            Endpoint::parse("http://example.test"),
            Err(WsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(Endpoint::parse("not a url").is_err());
    }

    #[test]
    fn test_headers() {
        let endpoint = Endpoint::parse("ws://example.test")
            .unwrap()
            .header("Authorization", "Bearer token")
            .header("Content-Type", "application/json");
        assert_eq!(endpoint.headers().len(), 2);
        assert!(endpoint.headers().contains_key("authorization"));
    }

    #[test]
    fn test_invalid_header_dropped() {
        let endpoint = Endpoint::parse("ws://example.test")
            .unwrap()
            .header("bad name", "value");
        assert!(endpoint.headers().is_empty());
    }

    #[test]
    fn test_client_request_carries_headers() {
        let endpoint = Endpoint::parse("ws://example.test/echo")
            .unwrap()
            .header("Authorization", "Bearer token");
        let request = endpoint.client_request().unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer token"
        );
        // Standard upgrade headers are filled in by the handshake builder
        assert!(request.headers().contains_key("sec-websocket-key"));
    }
}
