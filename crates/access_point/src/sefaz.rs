use super::{StatusQueryClient, TransportError, SOAP_CONTENT_TYPE};
use async_trait::async_trait;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Lower-cased fragments that mark a TLS failure in an error chain.
const TLS_MARKERS: [&str; 6] = [
    "certificate",
    "handshake",
    "tls",
    "invalidcontenttype",
    "corrupt message",
    "alert",
];

/// PEM certificate and private key (e-CNPJ A1) presented to SEFAZ.
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl ClientCertificate {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// Concatenate both PEM files into one rustls identity.
    pub fn load_identity(&self) -> Result<reqwest::Identity, TransportError> {
        let mut pem = read_pem(&self.cert_path)?;
        pem.push(b'\n');
        pem.extend(read_pem(&self.key_path)?);
        reqwest::Identity::from_pem(&pem).map_err(|e| {
            TransportError::Certificate(format!(
                "{} / {}: {}",
                self.cert_path.display(),
                self.key_path.display(),
                error_chain(&e)
            ))
        })
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TransportError> {
    std::fs::read(path)
        .map_err(|e| TransportError::Certificate(format!("{}: {}", path.display(), e)))
}

/// SEFAZ `NFeConsultaProtocolo4` client over HTTPS with a client certificate.
///
/// One POST per call; no retries.
#[derive(Clone)]
pub struct SefazClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl SefazClient {
    /// Build a client for `endpoint`.
    ///
    /// `certificate` is the mTLS identity; `None` only makes sense against
    /// servers that do not ask for one. With `verify_tls` false the server
    /// certificate is not checked at all.
    pub fn new(
        endpoint: impl Into<String>,
        certificate: Option<&ClientCertificate>,
        verify_tls: bool,
        timeout: Duration,
    ) -> Result<Arc<Self>, TransportError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls);

        if let Some(certificate) = certificate {
            builder = builder.identity(certificate.load_identity()?);
        }

        let http_client = builder
            .build()
            .map_err(|e| TransportError::Tls(error_chain(&e)))?;

        Ok(Arc::new(Self {
            endpoint: endpoint.into(),
            http_client,
        }))
    }
}

#[async_trait]
impl StatusQueryClient for SefazClient {
    async fn consult(&self, envelope: &str) -> Result<String, TransportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(envelope.to_owned())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            let err = TransportError::http(status.as_u16(), &body);
            if let TransportError::Http { fault, .. } = &err {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    %status,
                    fault = fault.as_deref().unwrap_or("-"),
                    "SEFAZ rejected request"
                );
            }
            return Err(err);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            %status,
            bytes = body.len(),
            "SEFAZ response received"
        );
        Ok(body)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if !err.is_timeout() && is_tls_failure(&err) {
        TransportError::Tls(error_chain(&err))
    } else {
        TransportError::Request(error_chain(&err))
    }
}

/// Whether any cause below the top-level reqwest error comes from TLS.
///
/// tokio-rustls reports handshake and verification errors as
/// `io::ErrorKind::InvalidData`. The top-level message is skipped since it
/// embeds the URL.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::InvalidData {
                return true;
            }
        }
        let msg = cause.to_string().to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|m| msg.contains(m)) {
            return true;
        }
        source = cause.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}
