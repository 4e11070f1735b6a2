//! Domain types for the NF-e status query (`consSitNFe` / `NFeConsultaProtocolo4`).
//!
//! Everything in this crate is pure: access key validation, building the
//! query document and extracting the status fields from a SEFAZ reply.

pub mod error;
pub mod models;
pub mod parsing;
pub mod query;
pub mod validation;
mod xml_writer;

pub use error::NfeError;
pub use models::{AccessKey, Ambiente, Situacao, StatusRecord};
