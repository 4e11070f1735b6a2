//! SOAP 1.2 envelope for `NFeConsultaProtocolo4`.

use nfe_status_core::models::SOAP12_NAMESPACE;

/// WSDL namespace of the status query service, bound to the `nfe` prefix.
pub const WSDL_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe/wsdl/NFeConsultaProtocolo4";

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(xml: &str) -> String {
    xml.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Wrap a serialized `consSitNFe` in the SOAP envelope.
///
/// The header `nfeCabecMsg` carries the UF code and the data version; the
/// payload goes verbatim into `nfeDadosMsg`. Nothing is escaped, the
/// payload is expected to be XML already.
pub fn build_envelope(payload: &str, uf: &str, versao: &str) -> String {
    format!(
        r#"<soap12:Envelope xmlns:soap12="{SOAP12_NAMESPACE}" xmlns:nfe="{WSDL_NAMESPACE}">
    <soap12:Header>
        <nfe:nfeCabecMsg>
            <nfe:cUF>{uf}</nfe:cUF>
            <nfe:versaoDados>{versao}</nfe:versaoDados>
        </nfe:nfeCabecMsg>
    </soap12:Header>
    <soap12:Body>
        <nfe:nfeDadosMsg>
            {payload}
        </nfe:nfeDadosMsg>
    </soap12:Body>
</soap12:Envelope>"#
    )
}

/// `Fault/Reason/Text` of a SOAP 1.2 fault, if `body` is one.
pub fn fault_reason(body: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(body).ok()?;
    let fault = doc.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == "Fault"
            && n.tag_name().namespace() == Some(SOAP12_NAMESPACE)
    })?;
    fault
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "Text")
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
