//! The status query pipeline: validate, build, wrap, send, parse, persist.

use access_point::{soap, StatusQueryClient, TransportError};
use config::Settings;
use nfe_status_core::parsing::{compute_sha256_hex, parse_status_response};
use nfe_status_core::query::ConsSitNFe;
use nfe_status_core::validation::validate_access_key;
use nfe_status_core::{AccessKey, NfeError, StatusRecord};
use std::path::{Path, PathBuf};
use store::audit::{write_audit_event, AuditEvent};
use thiserror::Error;

/// Characters of the raw response echoed to stdout.
pub const RESPONSE_PREVIEW_CHARS: usize = 2000;

/// The stage that stopped a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid input: {0}")]
    Validation(#[source] NfeError),

    #[error("failed to build query XML: {0}")]
    Query(#[source] NfeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not parse SEFAZ response: {0}")]
    Parse(#[source] NfeError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Query built and saved, envelope ready to send.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub key: AccessKey,
    pub query_path: PathBuf,
    pub envelope: String,
}

/// Artifacts of a completed exchange.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub key: AccessKey,
    pub query_path: PathBuf,
    pub response_path: PathBuf,
    /// `None` when no status field could be extracted.
    pub status_path: Option<PathBuf>,
    pub record: StatusRecord,
}

/// First [`RESPONSE_PREVIEW_CHARS`] characters of `raw`, marked when cut.
pub fn response_preview(raw: &str) -> String {
    let mut preview: String = raw.chars().take(RESPONSE_PREVIEW_CHARS).collect();
    if preview.len() < raw.len() {
        preview.push_str("...\n[truncado]");
    }
    preview
}

fn audit(dir: &Path, event: AuditEvent) {
    if let Err(e) = write_audit_event(dir, &event) {
        tracing::warn!(error = %e, "Failed to write audit event");
    }
}

/// Validate the key, save the query document and build the SOAP envelope.
pub fn prepare(settings: &Settings) -> Result<Prepared, RunError> {
    store::ensure_output_dir(&settings.saida)?;

    let key = validate_access_key(&settings.chave).map_err(RunError::Validation)?;
    let parts = key.parts();
    if parts.uf != settings.uf {
        tracing::warn!(
            key_uf = parts.uf,
            uf = %settings.uf,
            "Access key was issued in a different UF than the one queried"
        );
    }
    tracing::info!(
        key = %key,
        modelo = parts.modelo,
        serie = parts.serie,
        numero = parts.numero,
        tp_amb = %settings.tp_amb,
        "Access key validated"
    );

    let query = ConsSitNFe::new(key.clone(), settings.tp_amb).with_versao(settings.versao.clone());
    let document = query.to_document().map_err(RunError::Query)?;
    let query_path = store::save_query_xml(&settings.entrada_xml, &document)?;

    let payload = soap::collapse_whitespace(&query.to_xml().map_err(RunError::Query)?);
    let envelope = soap::build_envelope(&payload, &settings.uf, &settings.versao);
    println!("\nSOAP envelope:\n{envelope}");

    Ok(Prepared {
        key,
        query_path,
        envelope,
    })
}

/// Send the envelope once, then persist and parse the reply.
///
/// The raw response is saved before parsing, so a malformed reply still
/// leaves `resposta_<key>.xml` behind. Nothing is written for a failed
/// exchange.
pub async fn execute(
    settings: &Settings,
    client: &dyn StatusQueryClient,
    prepared: Prepared,
) -> Result<Outcome, RunError> {
    let Prepared { key, query_path, .. } = &prepared;
    let dir = settings.saida.as_path();

    tracing::info!(endpoint = client.endpoint(), key = %key, "Sending query to SEFAZ");
    let raw = match client.consult(&prepared.envelope).await {
        Ok(raw) => raw,
        Err(err) => {
            audit(
                dir,
                AuditEvent::new("transport_failed", key.as_str())
                    .with_endpoint(client.endpoint())
                    .with_error(err.to_string()),
            );
            return Err(err.into());
        }
    };

    println!("\nSEFAZ response (raw):\n{}", response_preview(&raw));

    let response_path = store::save_response(dir, key, &raw)?;
    let response_hash = compute_sha256_hex(&raw);

    let record = match parse_status_response(&raw) {
        Ok(record) => record,
        Err(err) => {
            audit(
                dir,
                AuditEvent::new("parse_failed", key.as_str())
                    .with_endpoint(client.endpoint())
                    .with_hash(response_hash)
                    .with_error(err.to_string()),
            );
            return Err(RunError::Parse(err));
        }
    };

    let status_path = if record.is_empty() {
        tracing::warn!(key = %key, "No status fields could be extracted from the response");
        None
    } else {
        Some(store::save_status(dir, key, &record)?)
    };

    tracing::info!(
        key = %key,
        c_stat = record.c_stat.as_deref().unwrap_or("-"),
        x_motivo = record.x_motivo.as_deref().unwrap_or("-"),
        n_prot = record.n_prot.as_deref().unwrap_or("-"),
        situacao = %record.situacao(),
        "NF-e status"
    );
    audit(
        dir,
        AuditEvent::new("status_received", key.as_str())
            .with_endpoint(client.endpoint())
            .with_hash(response_hash)
            .with_c_stat(record.c_stat.clone()),
    );

    Ok(Outcome {
        key: key.clone(),
        query_path: query_path.clone(),
        response_path,
        status_path,
        record,
    })
}

/// Whole pipeline against an already built client.
pub async fn consult_status(
    settings: &Settings,
    client: &dyn StatusQueryClient,
) -> Result<Outcome, RunError> {
    let prepared = prepare(settings)?;
    execute(settings, client, prepared).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_responses() {
        assert_eq!(response_preview("<ok/>"), "<ok/>");
        let exact = "a".repeat(RESPONSE_PREVIEW_CHARS);
        assert_eq!(response_preview(&exact), exact);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let raw = "ç".repeat(RESPONSE_PREVIEW_CHARS + 5);
        let preview = response_preview(&raw);
        assert!(preview.ends_with("...\n[truncado]"));
        assert_eq!(
            preview.trim_end_matches("...\n[truncado]").chars().count(),
            RESPONSE_PREVIEW_CHARS
        );
    }

    #[test]
    fn error_messages_name_the_stage() {
        let err = RunError::Validation(NfeError::InvalidAccessKey { digits: 3 });
        assert_eq!(
            err.to_string(),
            "invalid input: access key must contain exactly 44 digits, got 3"
        );
        let err = RunError::from(TransportError::Tls("bad certificate".into()));
        assert_eq!(err.to_string(), "SSL error: bad certificate");
    }
}
