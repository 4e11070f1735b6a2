use access_point::sefaz::{ClientCertificate, SefazClient};
use access_point::StatusQueryClient;
use anyhow::Result;
use clap::Parser;
use config::{FileConfig, Settings};
use nfe_status_cli::args::Args;
use nfe_status_cli::commands;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_client(settings: &Settings) -> Result<Arc<dyn StatusQueryClient>> {
    let certificate = ClientCertificate::new(&settings.cert_path, &settings.key_path);
    tracing::debug!(
        cert = %certificate.cert_path.display(),
        key = %certificate.key_path.display(),
        verify_tls = settings.verify_tls,
        timeout = ?settings.timeout,
        "Building SEFAZ client"
    );
    if !settings.verify_tls {
        tracing::warn!("Server certificate verification is disabled");
    }
    let client = SefazClient::new(
        settings.endpoint.clone(),
        Some(&certificate),
        settings.verify_tls,
        settings.timeout,
    )?;
    Ok(client)
}

async fn run(args: Args) -> Result<()> {
    let file = config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring config file");
        FileConfig::default()
    });
    if let Ok(path) = config::config_path() {
        tracing::debug!(path = %path.display(), "Config file");
    }

    let settings = Settings::from_env(args.overrides(), &file)?;
    let prepared = commands::prepare(&settings)?;
    if args.dry_run {
        tracing::info!("Dry run, query not sent");
        return Ok(());
    }

    let client = create_client(&settings)?;
    commands::execute(&settings, client.as_ref(), prepared).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = config::load_dotenv();
    init_tracing();
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), ".env loaded");
    }

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
