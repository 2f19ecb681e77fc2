//! Ownership claim model.

use serde::{Deserialize, Serialize};

/// Status of an ownership claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClaimStatus::Pending),
            "approved" => Some(ClaimStatus::Approved),
            _ => None,
        }
    }
}

/// A user's request to be recognized as the owner of a restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub restaurant_id: String,
    pub claimant_id: String,
    pub status: ClaimStatus,
    pub created_at: String,
}

/// Pending claim with the context an administrator needs to decide on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingClaim {
    #[serde(flatten)]
    pub claim: Claim,
    pub restaurant_name: String,
    pub claimant_email: String,
}
