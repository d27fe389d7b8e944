use serde::{Deserialize, Serialize};

/// FHIR release served by this implementation
pub const FHIR_VERSION: &str = "4.0.1";

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    pub status: String,
    pub date: String,
    pub kind: String,
    pub fhir_version: String,
    pub format: Vec<String>,
    pub rest: Vec<CapabilityRest>,
}

impl CapabilityStatement {
    /// Capability statement for a server exposing Patient CRUD, dated `date`
    pub fn new(date: &str) -> Self {
        Self {
            resource_type: "CapabilityStatement".to_string(),
            status: "active".to_string(),
            date: date.to_string(),
            kind: "instance".to_string(),
            fhir_version: FHIR_VERSION.to_string(),
            format: vec!["json".to_string()],
            rest: vec![CapabilityRest {
                mode: "server".to_string(),
                security: Some(CapabilitySecurity {
                    description: "Bearer token required for all Patient interactions".to_string(),
                }),
                resource: vec![CapabilityResource::patient()],
            }],
        }
    }
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<CapabilitySecurity>,
    pub resource: Vec<CapabilityResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySecurity {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub interaction: Vec<CapabilityInteraction>,
    pub versioning: String,
    pub update_create: bool,
}

impl CapabilityResource {
    fn patient() -> Self {
        let interaction = ["create", "read", "update", "delete", "search-type"]
            .into_iter()
            .map(|code| CapabilityInteraction {
                code: code.to_string(),
            })
            .collect();

        Self {
            resource_type: "Patient".to_string(),
            interaction,
            versioning: "no-version".to_string(),
            update_create: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityInteraction {
    pub code: String,
}
