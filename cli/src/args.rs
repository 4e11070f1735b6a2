use clap::Parser;
use config::Overrides;
use std::path::PathBuf;

/// Command line arguments. Anything left out falls back to the environment,
/// then the config file, then the built-in default.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    name = "nfe-status",
    about = "Query the status/protocol of an NF-e (NFeConsultaProtocolo4)"
)]
pub struct Args {
    /// Access key, 44 digits (formatting characters are stripped) [env: CHAVE_ACESSO]
    #[arg(long)]
    pub chave: Option<String>,

    /// IBGE UF code, e.g. 35 for SP [env: UF]
    #[arg(long)]
    pub uf: Option<String>,

    /// Environment: 1 production, 2 homologation [env: TP_AMB]
    #[arg(long, value_parser = ["1", "2"])]
    pub tp_amb: Option<String>,

    /// SOAP service URL [env: ENDPOINT]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Client certificate (PEM) [env: CERT_PATH]
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub cert: Option<PathBuf>,

    /// Client private key (PEM) [env: KEY_PATH]
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub key: Option<PathBuf>,

    /// Where to save the query XML [env: XML_ENTRADA]
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub entrada_xml: Option<PathBuf>,

    /// Output directory for responses [env: PASTA_SAIDA]
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub saida: Option<PathBuf>,

    /// Verify the server certificate: true/false [env: SSL_VERIFY]
    #[arg(long)]
    pub verify: Option<String>,

    /// HTTP timeout in seconds [env: HTTP_TIMEOUT]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Schema version sent in versao and versaoDados
    #[arg(long)]
    pub versao: Option<String>,

    /// Build and save the query, print the envelope, do not send it
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            chave: self.chave.clone(),
            uf: self.uf.clone(),
            tp_amb: self.tp_amb.clone(),
            endpoint: self.endpoint.clone(),
            cert: self.cert.clone(),
            key: self.key.clone(),
            entrada_xml: self.entrada_xml.clone(),
            saida: self.saida.clone(),
            verify: self.verify.clone(),
            timeout: self.timeout,
            versao: self.versao.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "nfe-status",
            "--chave",
            "3524 0112 3456",
            "--uf",
            "35",
            "--tp-amb",
            "2",
            "--endpoint",
            "https://example/ws",
            "--cert",
            "c.pem",
            "--key",
            "k.pem",
            "--entrada-xml",
            "in.xml",
            "--saida",
            "out",
            "--verify",
            "true",
            "--timeout",
            "12.5",
            "--dry-run",
        ])
        .unwrap();
        assert!(args.dry_run);
        let o = args.overrides();
        assert_eq!(o.chave.as_deref(), Some("3524 0112 3456"));
        assert_eq!(o.tp_amb.as_deref(), Some("2"));
        assert_eq!(o.timeout, Some(12.5));
        assert_eq!(o.saida, Some(PathBuf::from("out")));
        assert_eq!(o.versao, None);
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let args = Args::try_parse_from(["nfe-status"]).unwrap();
        assert!(!args.dry_run);
        let o = args.overrides();
        assert!(o.chave.is_none() && o.uf.is_none() && o.timeout.is_none());
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!(Args::try_parse_from(["nfe-status", "--tp-amb", "3"]).is_err());
        assert!(Args::try_parse_from(["nfe-status", "--timeout", "soon"]).is_err());
    }
}
