//! Hash-chained activity log
//!
//! Every appended entry carries a token derived from the previous entry's
//! token, so editing an old entry invalidates every later one. The chain
//! tip is threaded explicitly through [`AuditChain::append`]; no other
//! call site can touch it. This is a demonstration linkage built on a
//! non-cryptographic digest, not a security primitive.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::fnv1a_hex;

/// Token of the implicit entry before the first real one.
pub const GENESIS_TOKEN: &str = "0x0000000000000000";

/// The three actor classes an entry can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    User,
    System,
    Agent,
}

impl Actor {
    pub fn label(self) -> &'static str {
        match self {
            Actor::User => "User",
            Actor::System => "System",
            Actor::Agent => "AI Agent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub timestamp: String,
    pub actor: Actor,
    pub action: String,
    pub detail: Option<String>,
    pub token: String,
}

/// Append-only log with a chained token per entry.
#[derive(Debug)]
pub struct AuditChain {
    tip: String,
    entries: Vec<AuditEntry>,
}

impl AuditChain {
    pub fn new() -> Self {
        Self {
            tip: GENESIS_TOKEN.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn append(
        &mut self,
        actor: Actor,
        action: impl Into<String>,
        detail: Option<String>,
    ) -> &AuditEntry {
        let action = action.into();
        let seq = self.entries.len() as u64;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let token = chain_token(&self.tip, seq, &timestamp, actor, &action, detail.as_deref());

        self.tip = token.clone();
        self.entries.push(AuditEntry {
            seq,
            timestamp,
            actor,
            action,
            detail,
            token,
        });
        self.entries.last().expect("entry was just pushed")
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }

    /// Recompute the whole chain from genesis and compare tokens.
    pub fn verify(&self) -> bool {
        let mut prev = GENESIS_TOKEN.to_string();
        for entry in &self.entries {
            let expected = chain_token(
                &prev,
                entry.seq,
                &entry.timestamp,
                entry.actor,
                &entry.action,
                entry.detail.as_deref(),
            );
            if expected != entry.token {
                return false;
            }
            prev = expected;
        }
        prev == self.tip
    }

    /// JSON document of all entries, for the audit log export.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

impl Default for AuditChain {
    fn default() -> Self {
        Self::new()
    }
}

fn chain_token(
    prev: &str,
    seq: u64,
    timestamp: &str,
    actor: Actor,
    action: &str,
    detail: Option<&str>,
) -> String {
    // Sequence number stands in for the randomness the demo would
    // otherwise add; it keeps tokens distinct while leaving the chain
    // recomputable by verify().
    let input = format!(
        "{}:{}:{}:{}:{}:{}",
        prev,
        seq,
        timestamp,
        actor.label(),
        action,
        detail.unwrap_or("")
    );
    fnv1a_hex(&input)
}
