use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// An OTM threat-model document.
///
/// Field names follow the OTM wire format (`otmVersion`, `trustZones`,
/// `trustZone` on components). Entity ids are unique within their own
/// collection; the three id spaces (zone/component/dataflow) are
/// independent. References (`trust_zone`, `source`, `destination`) are not
/// required to resolve: a dangling reference is still a valid document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Otm {
    pub otm_version: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust_zones: Vec<TrustZone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dataflows: Vec<Dataflow>,

    // Carried for round-tripping; the engine does not interpret these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<Threat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mitigations: Vec<Mitigation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,

    /// Open-ended tool-specific side-channel data (e.g. diagram layout).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<BTreeMap<String, JsonValue>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustZone {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    /// Free-form component type (`process`, `store`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Reference to a trust-zone id; may dangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataflow {
    pub id: String,
    /// Component-id reference; may dangle.
    pub source: String,
    /// Component-id reference; may dangle.
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mitigation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// Lookup tables built once per evaluation, used by the helper predicates.
#[derive(Clone, Debug, Default)]
pub struct OtmIndex<'a> {
    pub trust_zones: BTreeMap<&'a str, &'a TrustZone>,
    pub components: BTreeMap<&'a str, &'a Component>,
}

impl<'a> OtmIndex<'a> {
    pub fn build(otm: &'a Otm) -> Self {
        OtmIndex {
            trust_zones: otm.trust_zones.iter().map(|z| (z.id.as_str(), z)).collect(),
            components: otm.components.iter().map(|c| (c.id.as_str(), c)).collect(),
        }
    }
}
