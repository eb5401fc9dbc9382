//! The differ's fatal error taxonomy.
//!
//! Every variant names the offending identity so a caller can report exactly which object
//! in the new/old schema defeated the diff, rather than a bare message.

use thiserror::Error;

use crate::model::ObjectId;

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("{kind} definition for {identity:?} does not match the expected catalog shape")]
    MalformedDefinition { kind: &'static str, identity: String },

    #[error(
        "table {table} has parent table {parent} in schema {schema}; only parent tables in the public schema are supported"
    )]
    UnsupportedCrossSchemaParent {
        table: String,
        parent: String,
        schema: String,
    },

    #[error("dependency cycle detected among {0:?}; cannot produce a total ordering")]
    SchemaCycle(Vec<ObjectId>),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("schema ingestion was cancelled")]
    IngestCancelled,
}

impl DriftError {
    pub fn malformed_definition(kind: &'static str, identity: impl Into<String>) -> Self {
        DriftError::MalformedDefinition {
            kind,
            identity: identity.into(),
        }
    }
}

pub type DriftResult<T> = Result<T, DriftError>;
