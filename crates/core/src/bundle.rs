use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Id reported on every patient search bundle
pub const SEARCH_BUNDLE_ID: &str = "patient-search-results";

/// FHIR Bundle types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Searchset,
    History,
    Collection,
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
}

/// FHIR Bundle resource (simplified for search responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    // Always serialized: an empty search still reports `entry: []`.
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Search result bundle whose total is the number of entries
    pub fn searchset(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id: Some(SEARCH_BUNDLE_ID.to_string()),
            bundle_type: BundleType::Searchset,
            total: Some(u32::try_from(entries.len()).unwrap_or(u32::MAX)),
            link: Vec::new(),
            entry: entries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<JsonValue>,
}

impl BundleEntry {
    pub fn new(full_url: Option<String>, resource: JsonValue) -> Self {
        Self {
            full_url,
            resource: Some(resource),
        }
    }
}
