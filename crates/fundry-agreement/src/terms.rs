use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Economic terms copied from the campaign at the instant of signing.
/// Stored as JSON on the agreement row so later campaign edits never
/// retroactively change what the investor signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsSnapshot {
    pub company_name: String,
    pub amount_cents: i64,
    pub discount_rate_bps: i64,
    pub valuation_cap_cents: i64,
    pub governing_law: String,
    pub signed_at: DateTime<Utc>,
}

impl TermsSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
