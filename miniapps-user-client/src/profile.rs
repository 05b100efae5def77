//! Wire types for the miniapps user API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A miniapps user profile.
///
/// Only `id` is required on the wire; every other known field is defaulted
/// and nothing beyond shape is validated client-side. Fields the server adds
/// beyond the known set are retained in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub auth_type: String,
    /// ISO-8601 timestamp, passed through unparsed.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Response envelope shared by every endpoint of the miniapps user API.
///
/// All fields are defaulted so partial bodies still parse; the server's own
/// `success` flag is authoritative, not the HTTP status.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}
