//! Per-invocation transaction context.
//!
//! Every engine call runs under a [`TxContext`]: a unique invocation id and a
//! timestamp supplied by the caller. Replicas replaying the same invocation
//! pass the same context and therefore derive the same record ids and
//! `updated_at` stamps.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Doc;
use crate::constants::{ID_LENGTH, MAX_ID_LENGTH};
use crate::hash::sha256_hex;

/// Invocation id and timestamp for one engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub invocation_id: String,
    pub timestamp: DateTime<Utc>,
    id_length: usize,
}

impl TxContext {
    /// Fresh context: UUIDv7 invocation id, wall-clock timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Uuid::now_v7().to_string(), Utc::now())
    }

    /// Context with an explicit id and timestamp, for deterministic replay.
    #[must_use]
    pub fn at(invocation_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            timestamp,
            id_length: ID_LENGTH,
        }
    }

    /// Override the derived id length (clamped to `1..=64`).
    #[must_use]
    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length.clamp(1, MAX_ID_LENGTH);
        self
    }

    /// Deterministic record id: the last `id_length` hex characters of
    /// SHA-256(doc prefix ‖ invocation id ‖ discriminator).
    ///
    /// The discriminator separates several records of the same namespace
    /// created by one invocation.
    #[must_use]
    pub fn derive_id(&self, doc: Doc, discriminator: &str) -> String {
        let mut preimage = String::with_capacity(
            doc.prefix().len() + self.invocation_id.len() + discriminator.len(),
        );
        preimage.push_str(doc.prefix());
        preimage.push_str(&self.invocation_id);
        preimage.push_str(discriminator);
        let digest = sha256_hex(preimage.as_bytes());
        digest[digest.len() - self.id_length..].to_string()
    }
}

impl Default for TxContext {
    fn default() -> Self {
        Self::new()
    }
}
