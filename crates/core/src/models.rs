use crate::error::NfeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace of the NF-e schema documents.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";
/// SOAP 1.2 envelope namespace.
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";
/// Layout version of `consSitNFe` and of the `versaoDados` header.
pub const SCHEMA_VERSION: &str = "4.00";
/// Value of `xServ` for a status query.
pub const SERVICE_CONSULTAR: &str = "CONSULTAR";

/// A validated 44-digit NF-e access key (chave de acesso).
///
/// Only constructible through [`crate::validation::validate_access_key`]
/// or [`FromStr`], so holding one means the digit count was checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    pub(crate) fn from_digits(digits: String) -> Self {
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the key into its positional fields.
    ///
    /// Purely informational: none of the fields are checked, including the
    /// check digit.
    pub fn parts(&self) -> KeyParts<'_> {
        let k = self.0.as_str();
        KeyParts {
            uf: &k[0..2],
            year_month: &k[2..6],
            cnpj: &k[6..20],
            modelo: &k[20..22],
            serie: &k[22..25],
            numero: &k[25..34],
            tp_emis: &k[34..35],
            codigo: &k[35..43],
            dv: &k[43..44],
        }
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccessKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccessKey {
    type Err = NfeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::validation::validate_access_key(s)
    }
}

/// Positional fields of an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub uf: &'a str,
    pub year_month: &'a str,
    pub cnpj: &'a str,
    pub modelo: &'a str,
    pub serie: &'a str,
    pub numero: &'a str,
    pub tp_emis: &'a str,
    pub codigo: &'a str,
    pub dv: &'a str,
}

/// SEFAZ environment (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ambiente {
    #[default]
    Producao,
    Homologacao,
}

impl Ambiente {
    /// Wire code: `1` production, `2` homologation.
    pub fn code(&self) -> &'static str {
        match self {
            Ambiente::Producao => "1",
            Ambiente::Homologacao => "2",
        }
    }
}

impl fmt::Display for Ambiente {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Ambiente {
    type Err = NfeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Ambiente::Producao),
            "2" => Ok(Ambiente::Homologacao),
            other => Err(NfeError::InvalidAmbiente(other.to_string())),
        }
    }
}

/// Status fields extracted from a `retConsSitNFe` reply.
///
/// Fields missing from the reply stay `None` and are left out of the JSON
/// form entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "cStat", default, skip_serializing_if = "Option::is_none")]
    pub c_stat: Option<String>,
    #[serde(rename = "xMotivo", default, skip_serializing_if = "Option::is_none")]
    pub x_motivo: Option<String>,
    #[serde(rename = "nProt", default, skip_serializing_if = "Option::is_none")]
    pub n_prot: Option<String>,
    #[serde(rename = "dhRecbto", default, skip_serializing_if = "Option::is_none")]
    pub dh_recbto: Option<String>,
}

impl StatusRecord {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Present fields as `(name, value)` pairs in schema order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("cStat", &self.c_stat),
            ("xMotivo", &self.x_motivo),
            ("nProt", &self.n_prot),
            ("dhRecbto", &self.dh_recbto),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    pub fn situacao(&self) -> Situacao {
        match self.c_stat.as_deref().map(str::parse::<u16>) {
            Some(Ok(code)) => Situacao::from_c_stat(code),
            _ => Situacao::Desconhecida,
        }
    }
}

/// Coarse reading of `cStat` for a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situacao {
    Autorizada,
    Cancelada,
    Denegada,
    NaoEncontrada,
    Outra(u16),
    Desconhecida,
}

impl Situacao {
    pub fn from_c_stat(code: u16) -> Self {
        match code {
            100 | 150 => Situacao::Autorizada,
            101 | 151 | 155 => Situacao::Cancelada,
            110 | 301 | 302 | 303 => Situacao::Denegada,
            217 => Situacao::NaoEncontrada,
            other => Situacao::Outra(other),
        }
    }
}

impl fmt::Display for Situacao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Situacao::Autorizada => f.write_str("authorized"),
            Situacao::Cancelada => f.write_str("cancelled"),
            Situacao::Denegada => f.write_str("denied"),
            Situacao::NaoEncontrada => f.write_str("not found"),
            Situacao::Outra(code) => write!(f, "other (cStat {code})"),
            Situacao::Desconhecida => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "35240112345678000190550010000001231234567890";

    #[test]
    fn ambiente_codes() {
        assert_eq!("1".parse::<Ambiente>().unwrap(), Ambiente::Producao);
        assert_eq!(" 2 ".parse::<Ambiente>().unwrap(), Ambiente::Homologacao);
        assert!("3".parse::<Ambiente>().is_err());
        assert_eq!(Ambiente::Homologacao.to_string(), "2");
    }

    #[test]
    fn key_parts_are_positional() {
        let key: AccessKey = KEY.parse().unwrap();
        let parts = key.parts();
        assert_eq!(parts.uf, "35");
        assert_eq!(parts.year_month, "2401");
        assert_eq!(parts.cnpj, "12345678000190");
        assert_eq!(parts.modelo, "55");
        assert_eq!(parts.serie, "001");
        assert_eq!(parts.numero, "000000123");
        assert_eq!(parts.tp_emis, "1");
        assert_eq!(parts.codigo, "23456789");
        assert_eq!(parts.dv, "0");
    }

    #[test]
    fn status_record_omits_missing_fields_in_json() {
        let record = StatusRecord {
            c_stat: Some("100".into()),
            x_motivo: Some("Autorizado o uso da NF-e".into()),
            n_prot: None,
            dh_recbto: Some("2024-01-01T10:00:00-03:00".into()),
        };
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(!obj.contains_key("nProt"));
        assert_eq!(obj["cStat"], "100");
    }

    #[test]
    fn situacao_from_c_stat() {
        let mut record = StatusRecord::default();
        assert_eq!(record.situacao(), Situacao::Desconhecida);
        assert!(record.is_empty());

        record.c_stat = Some("100".into());
        assert_eq!(record.situacao(), Situacao::Autorizada);
        record.c_stat = Some("101".into());
        assert_eq!(record.situacao(), Situacao::Cancelada);
        record.c_stat = Some("302".into());
        assert_eq!(record.situacao(), Situacao::Denegada);
        record.c_stat = Some("217".into());
        assert_eq!(record.situacao(), Situacao::NaoEncontrada);
        record.c_stat = Some("999".into());
        assert_eq!(record.situacao(), Situacao::Outra(999));
        record.c_stat = Some("abc".into());
        assert_eq!(record.situacao(), Situacao::Desconhecida);
    }
}
