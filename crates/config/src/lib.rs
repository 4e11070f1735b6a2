//! Layered settings: CLI overrides, then environment (`.env` included),
//! then the persisted confy file, then built-in defaults.

use anyhow::{bail, Context, Result};
use nfe_status_core::models::SCHEMA_VERSION;
use nfe_status_core::validation::{validate_uf, UF_CODES};
use nfe_status_core::Ambiente;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const APP_NAME: &str = "nfe-status";

/// SP production endpoint of `NFeConsultaProtocolo4`.
pub const DEFAULT_ENDPOINT: &str = "https://nfe.fazenda.sp.gov.br/ws/nfeconsultaprotocolo4.asmx";
/// SP homologation endpoint, used when `tp_amb=2` and no endpoint is configured.
pub const HOMOLOGACAO_ENDPOINT: &str =
    "https://homologacao.nfe.fazenda.sp.gov.br/ws/nfeconsultaprotocolo4.asmx";

pub const DEFAULT_KEY_PATH: &str = "tmp/key.pem";
pub const DEFAULT_CERT_PATH: &str = "tmp/cert.pem";
pub const DEFAULT_XML_ENTRADA: &str = "entrada.xml";
pub const DEFAULT_PASTA_SAIDA: &str = "xml_respostas";
pub const DEFAULT_UF: &str = "35";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Optional values persisted with confy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub chave_acesso: Option<String>,
    pub uf: Option<String>,
    pub tp_amb: Option<String>,
    pub endpoint: Option<String>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub xml_entrada: Option<String>,
    pub pasta_saida: Option<String>,
    pub ssl_verify: Option<bool>,
    pub http_timeout: Option<f64>,
    pub versao: Option<String>,
}

/// Load `.env` from the working directory into the process environment.
/// Variables already set are left alone; a missing file is fine.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

pub fn load() -> Result<FileConfig> {
    let cfg: FileConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn config_path() -> Result<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).context("Failed to locate app config")
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub chave: Option<String>,
    pub uf: Option<String>,
    pub tp_amb: Option<String>,
    pub endpoint: Option<String>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub entrada_xml: Option<PathBuf>,
    pub saida: Option<PathBuf>,
    pub verify: Option<String>,
    pub timeout: Option<f64>,
    pub versao: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Raw access key, validated later by the pipeline.
    pub chave: String,
    pub uf: String,
    pub tp_amb: Ambiente,
    pub endpoint: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub entrada_xml: PathBuf,
    pub saida: PathBuf,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub versao: String,
}

/// `1`, `true` and `yes` (any case) are true, everything else false.
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_timeout(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("HTTP timeout must be a positive number of seconds, got {secs}");
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("HTTP timeout of {secs} seconds is out of range"))
}

/// Treat a blank value given on the command line as not given.
fn given(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Resolve against the real process environment.
    pub fn from_env(overrides: Overrides, file: &FileConfig) -> Result<Self> {
        Self::resolve(overrides, file, |name| std::env::var(name).ok())
    }

    /// Resolve with an arbitrary environment lookup. Empty values count as
    /// unset.
    pub fn resolve<F>(overrides: Overrides, file: &FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let tp_amb_raw = given(overrides.tp_amb)
            .or_else(|| env("TP_AMB"))
            .or_else(|| file.tp_amb.clone())
            .unwrap_or_else(|| Ambiente::Producao.code().to_string());
        let tp_amb: Ambiente = tp_amb_raw.parse()?;

        let uf_raw = given(overrides.uf)
            .or_else(|| env("UF"))
            .or_else(|| file.uf.clone())
            .unwrap_or_else(|| DEFAULT_UF.to_string());
        let uf = validate_uf(&uf_raw)?;
        if !UF_CODES.contains(&uf.as_str()) {
            tracing::warn!(uf = %uf, "UF code is not one of the 27 federal units");
        }

        let endpoint = given(overrides.endpoint)
            .or_else(|| env("ENDPOINT"))
            .or_else(|| file.endpoint.clone())
            .unwrap_or_else(|| match tp_amb {
                Ambiente::Producao => DEFAULT_ENDPOINT.to_string(),
                Ambiente::Homologacao => HOMOLOGACAO_ENDPOINT.to_string(),
            });
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            bail!("Endpoint must start with http:// or https://, got {endpoint}");
        }

        let verify_tls = match given(overrides.verify).or_else(|| env("SSL_VERIFY")) {
            Some(raw) => parse_bool(&raw),
            None => file.ssl_verify.unwrap_or(false),
        };

        let timeout_secs = match overrides.timeout {
            Some(secs) => secs,
            None => match env("HTTP_TIMEOUT") {
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("HTTP_TIMEOUT is not a number: {raw}"))?,
                None => file.http_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
        };

        let path = |cli: Option<PathBuf>, var: &str, stored: &Option<String>, default: &str| {
            cli.filter(|p| !p.as_os_str().is_empty())
                .or_else(|| env(var).map(PathBuf::from))
                .or_else(|| stored.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Ok(Self {
            chave: given(overrides.chave)
                .or_else(|| env("CHAVE_ACESSO"))
                .or_else(|| file.chave_acesso.clone())
                .unwrap_or_default(),
            uf,
            tp_amb,
            endpoint,
            cert_path: path(overrides.cert, "CERT_PATH", &file.cert_path, DEFAULT_CERT_PATH),
            key_path: path(overrides.key, "KEY_PATH", &file.key_path, DEFAULT_KEY_PATH),
            entrada_xml: path(
                overrides.entrada_xml,
                "XML_ENTRADA",
                &file.xml_entrada,
                DEFAULT_XML_ENTRADA,
            ),
            saida: path(overrides.saida, "PASTA_SAIDA", &file.pasta_saida, DEFAULT_PASTA_SAIDA),
            verify_tls,
            timeout: parse_timeout(timeout_secs)?,
            versao: given(overrides.versao)
                .or_else(|| file.versao.clone())
                .unwrap_or_else(|| SCHEMA_VERSION.to_string()),
        })
    }
}
