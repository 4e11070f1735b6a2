use async_trait::async_trait;
use thiserror::Error;

pub mod mock;
pub mod sefaz;
pub mod soap;

/// Content type of SOAP 1.2 requests.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Maximum number of characters of an error response body kept in
/// [`TransportError::Http`].
pub const ERROR_BODY_LIMIT: usize = 400;

/// Failure of the single request/response exchange with SEFAZ.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Client certificate or private key could not be read or parsed.
    #[error("client certificate error: {0}")]
    Certificate(String),

    /// TLS handshake or server certificate verification failed.
    #[error("SSL error: {0}")]
    Tls(String),

    /// The service answered with a non-2xx status. The SOAP fault reason,
    /// when present, is shown instead of the raw body.
    #[error("HTTP {status}: {}", fault.as_deref().unwrap_or(body))]
    Http {
        status: u16,
        body: String,
        /// SOAP fault reason, when the body carried one.
        fault: Option<String>,
    },

    /// Timeout, connection refused, DNS failure and everything else.
    #[error("request error: {0}")]
    Request(String),
}

impl TransportError {
    pub fn http(status: u16, body: &str) -> Self {
        TransportError::Http {
            status,
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            fault: soap::fault_reason(body),
        }
    }
}

#[async_trait]
pub trait StatusQueryClient: Send + Sync {
    /// POST a SOAP envelope and return the raw response body.
    async fn consult(&self, envelope: &str) -> Result<String, TransportError>;

    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_body_is_truncated() {
        let body = "x".repeat(1000);
        match TransportError::http(500, &body) {
            TransportError::Http { status, body, fault } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), ERROR_BODY_LIMIT);
                assert_eq!(fault, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn http_error_shows_soap_fault_reason() {
        let body = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body><soap:Fault><soap:Code><soap:Value>soap:Receiver</soap:Value></soap:Code><soap:Reason><soap:Text xml:lang="pt-BR">Certificado digital nao informado</soap:Text></soap:Reason></soap:Fault></soap:Body></soap:Envelope>"#;
        let err = TransportError::http(403, body);
        assert_eq!(err.to_string(), "HTTP 403: Certificado digital nao informado");

        let err = TransportError::http(500, "Internal Server Error");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[test]
    fn tls_and_request_errors_render_differently() {
        let tls = TransportError::Tls("handshake failure".into()).to_string();
        let req = TransportError::Request("handshake failure".into()).to_string();
        assert!(tls.starts_with("SSL error"));
        assert!(req.starts_with("request error"));
        assert_ne!(tls, req);
    }
}
