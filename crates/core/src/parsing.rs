use crate::error::NfeError;
use crate::models::{StatusRecord, NFE_NAMESPACE};
use sha2::{Digest, Sha256};

pub fn compute_sha256_hex(xml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(xml.as_bytes());
    let bytes = hasher.finalize();
    hex::encode(bytes)
}

/// Text of the first element named `local` in the NF-e namespace, in
/// document order.
fn find_nfe_text(doc: &roxmltree::Document, local: &str) -> Option<String> {
    doc.descendants()
        .find(|n| {
            n.is_element()
                && n.tag_name().name() == local
                && n.tag_name().namespace() == Some(NFE_NAMESPACE)
        })
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract the status fields from a raw SOAP reply.
///
/// `retConsSitNFe` carries `cStat`/`xMotivo` both at its top level and
/// inside `protNFe/infProt`; the first occurrence wins. Missing fields are
/// not an error.
pub fn parse_status_response(xml: &str) -> Result<StatusRecord, NfeError> {
    let doc = roxmltree::Document::parse(xml.trim_start_matches('\u{feff}'))?;

    Ok(StatusRecord {
        c_stat: find_nfe_text(&doc, "cStat"),
        x_motivo: find_nfe_text(&doc, "xMotivo"),
        n_prot: find_nfe_text(&doc, "nProt"),
        dh_recbto: find_nfe_text(&doc, "dhRecbto"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <nfeResultMsg xmlns="http://www.portalfiscal.inf.br/nfe/wsdl/NFeConsultaProtocolo4">
      <retConsSitNFe xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
        <tpAmb>1</tpAmb>
        {inner}
      </retConsSitNFe>
    </nfeResultMsg>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    #[test]
    fn extracts_all_four_fields() {
        let xml = reply(
            "<cStat>100</cStat><xMotivo>Autorizado</xMotivo>\
             <protNFe versao=\"4.00\"><infProt>\
             <nProt>123456789012345</nProt>\
             <dhRecbto>2024-01-01T10:00:00-03:00</dhRecbto>\
             </infProt></protNFe>",
        );
        let record = parse_status_response(&xml).unwrap();
        assert_eq!(
            record,
            StatusRecord {
                c_stat: Some("100".into()),
                x_motivo: Some("Autorizado".into()),
                n_prot: Some("123456789012345".into()),
                dh_recbto: Some("2024-01-01T10:00:00-03:00".into()),
            }
        );
        assert_eq!(record.fields().len(), 4);
    }

    #[test]
    fn missing_n_prot_is_omitted() {
        let xml = reply(
            "<cStat>100</cStat><xMotivo>Autorizado</xMotivo>\
             <dhRecbto>2024-01-01T10:00:00-03:00</dhRecbto>",
        );
        let record = parse_status_response(&xml).unwrap();
        assert_eq!(record.n_prot, None);
        let names: Vec<&str> = record.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["cStat", "xMotivo", "dhRecbto"]);
    }

    #[test]
    fn first_occurrence_wins_and_text_is_trimmed() {
        let xml = reply(
            "<cStat> 217 </cStat><xMotivo>Rejeicao: NF-e nao consta na base de dados da SEFAZ</xMotivo>\
             <protNFe><infProt><cStat>100</cStat></infProt></protNFe>",
        );
        let record = parse_status_response(&xml).unwrap();
        assert_eq!(record.c_stat.as_deref(), Some("217"));
    }

    #[test]
    fn elements_outside_nfe_namespace_are_ignored() {
        let xml = r#"<Envelope><Body><cStat>100</cStat></Body></Envelope>"#;
        let record = parse_status_response(xml).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn empty_elements_are_absent() {
        let record = parse_status_response(&reply("<cStat></cStat><xMotivo>  </xMotivo>")).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_status_response("<html><body>Service Unavailable").unwrap_err();
        assert!(matches!(err, NfeError::Parse(_)));
        assert!(parse_status_response("").is_err());
    }

    #[test]
    fn sha256_hex() {
        assert_eq!(
            compute_sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
