use super::{StatusQueryClient, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Canned `StatusQueryClient` that never touches the network.
pub struct MockClient {
    outcome: Result<String, TransportError>,
    calls: AtomicUsize,
    last_envelope: Mutex<Option<String>>,
}

impl MockClient {
    pub fn responding(body: impl Into<String>) -> Arc<Self> {
        Self::with_outcome(Ok(body.into()))
    }

    pub fn failing(err: TransportError) -> Arc<Self> {
        Self::with_outcome(Err(err))
    }

    /// Reply of an authorized NF-e for `key`.
    pub fn authorized(key: &str) -> Arc<Self> {
        Self::responding(authorized_reply(key, "135240000000001"))
    }

    fn with_outcome(outcome: Result<String, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_envelope: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_envelope(&self) -> Option<String> {
        self.last_envelope
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl StatusQueryClient for MockClient {
    async fn consult(&self, envelope: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_envelope.lock() {
            *last = Some(envelope.to_string());
        }
        self.outcome.clone()
    }

    fn endpoint(&self) -> &str {
        "mock://sefaz"
    }
}

/// A `retConsSitNFe` SOAP reply with `cStat` 100 and protocol `n_prot`.
pub fn authorized_reply(key: &str, n_prot: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <soap:Body>
    <nfeResultMsg xmlns="http://www.portalfiscal.inf.br/nfe/wsdl/NFeConsultaProtocolo4">
      <retConsSitNFe versao="4.00" xmlns="http://www.portalfiscal.inf.br/nfe">
        <tpAmb>1</tpAmb>
        <verAplic>SP_NFE_PL009_V4</verAplic>
        <cStat>100</cStat>
        <xMotivo>Autorizado o uso da NF-e</xMotivo>
        <cUF>35</cUF>
        <dhRecbto>2024-01-01T10:00:00-03:00</dhRecbto>
        <chNFe>{key}</chNFe>
        <protNFe versao="4.00">
          <infProt>
            <tpAmb>1</tpAmb>
            <verAplic>SP_NFE_PL009_V4</verAplic>
            <chNFe>{key}</chNFe>
            <dhRecbto>2024-01-01T10:00:00-03:00</dhRecbto>
            <nProt>{n_prot}</nProt>
            <digVal>q1w2e3r4t5y6u7i8o9p0a1s2d3f=</digVal>
            <cStat>100</cStat>
            <xMotivo>Autorizado o uso da NF-e</xMotivo>
          </infProt>
        </protNFe>
      </retConsSitNFe>
    </nfeResultMsg>
  </soap:Body>
</soap:Envelope>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfe_status_core::parsing::parse_status_response;

    #[tokio::test]
    async fn records_calls_and_envelope() {
        let mock = MockClient::responding("<ok/>");
        assert_eq!(mock.calls(), 0);
        assert_eq!(mock.consult("<env/>").await.unwrap(), "<ok/>");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.last_envelope().as_deref(), Some("<env/>"));
    }

    #[tokio::test]
    async fn failing_returns_error_every_time() {
        let mock = MockClient::failing(TransportError::Request("timed out".into()));
        assert!(mock.consult("a").await.is_err());
        assert!(mock.consult("b").await.is_err());
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn authorized_reply_parses() {
        let key = "35240112345678000190550010000001231234567890";
        let record = parse_status_response(&authorized_reply(key, "135240000000001")).unwrap();
        assert_eq!(record.c_stat.as_deref(), Some("100"));
        assert_eq!(record.n_prot.as_deref(), Some("135240000000001"));
        assert_eq!(record.dh_recbto.as_deref(), Some("2024-01-01T10:00:00-03:00"));
    }
}
