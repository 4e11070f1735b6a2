//! The `consSitNFe` status query document.

use crate::error::NfeError;
use crate::models::{AccessKey, Ambiente, NFE_NAMESPACE, SCHEMA_VERSION, SERVICE_CONSULTAR};
use crate::xml_writer::XmlWriter;

/// A status query for one access key.
///
/// Serializes to
/// `<consSitNFe xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">`
/// with the children `tpAmb`, `xServ`, `chNFe` in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsSitNFe {
    pub versao: String,
    pub tp_amb: Ambiente,
    pub ch_nfe: AccessKey,
}

impl ConsSitNFe {
    pub fn new(ch_nfe: AccessKey, tp_amb: Ambiente) -> Self {
        Self {
            versao: SCHEMA_VERSION.to_string(),
            tp_amb,
            ch_nfe,
        }
    }

    pub fn with_versao(mut self, versao: impl Into<String>) -> Self {
        self.versao = versao.into();
        self
    }

    /// Compact serialization without XML declaration.
    pub fn to_xml(&self) -> Result<String, NfeError> {
        let mut w = XmlWriter::compact();
        self.write(&mut w)?;
        w.into_string()
    }

    /// Indented standalone document with XML declaration, as saved to disk.
    pub fn to_document(&self) -> Result<String, NfeError> {
        let mut w = XmlWriter::document()?;
        self.write(&mut w)?;
        let mut out = w.into_string()?;
        out.push('\n');
        Ok(out)
    }

    fn write(&self, w: &mut XmlWriter) -> Result<(), NfeError> {
        w.start_element_with_attrs(
            "consSitNFe",
            &[("xmlns", NFE_NAMESPACE), ("versao", self.versao.as_str())],
        )?
        .text_element("tpAmb", self.tp_amb.code())?
        .text_element("xServ", SERVICE_CONSULTAR)?
        .text_element("chNFe", self.ch_nfe.as_str())?
        .end_element("consSitNFe")?;
        Ok(())
    }
}
