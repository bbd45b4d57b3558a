use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Hex-encoded SHA-256 digest of a document's bytes, used as the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    /// Object key inside the storage container
    pub location: Option<String>,
    pub error_message: Option<String>,
    /// True when the location came from the dedup cache and nothing was uploaded
    #[serde(default)]
    pub cached: bool,
}

impl UploadResult {
    pub fn stored(location: String) -> Self {
        Self {
            success: true,
            location: Some(location),
            error_message: None,
            cached: false,
        }
    }

    pub fn from_cache(location: String) -> Self {
        Self {
            cached: true,
            ..Self::stored(location)
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            location: None,
            error_message: Some(message.into()),
            cached: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizationResult {
    pub success: bool,
    /// Object key of the encrypted summary
    pub result_location: Option<String>,
    pub decryption_key: Option<String>,
    pub encryption_initial_state: Option<String>,
    pub auth_tag: Option<String>,
    /// Diagnostic reason, only set on failure
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
    /// Set when the failure was the call exceeding its deadline
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub timed_out: bool,
}

impl SummarizationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result_location: None,
            decryption_key: None,
            encryption_initial_state: None,
            auth_tag: None,
            error_message: Some(message.into()),
            timed_out: false,
        }
    }

    pub fn has_content(&self) -> bool {
        self.result_location.is_some()
            || self.decryption_key.is_some()
            || self.encryption_initial_state.is_some()
            || self.auth_tag.is_some()
    }
}

/// Body sent to the summarization service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryServiceRequest<'a> {
    pub pdf_doc_path: &'a str,
    pub public_key_pem: &'a str,
}

/// Body returned by the summarization service on success.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryServiceResponse {
    #[serde(alias = "result_doc_name")]
    pub result_doc_name: String,
    #[serde(alias = "decryption_key")]
    pub decryption_key: Option<String>,
    #[serde(alias = "encryption_initial_state")]
    pub encryption_initial_state: Option<String>,
    #[serde(alias = "auth_tag")]
    pub auth_tag: Option<String>,
}

impl From<SummaryServiceResponse> for SummarizationResult {
    fn from(res: SummaryServiceResponse) -> Self {
        Self {
            success: true,
            result_location: Some(res.result_doc_name.trim().trim_matches('"').to_string()),
            decryption_key: res.decryption_key,
            encryption_initial_state: res.encryption_initial_state,
            auth_tag: res.auth_tag,
            error_message: None,
            timed_out: false,
        }
    }
}
