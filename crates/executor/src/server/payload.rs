use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alertmanager/Grafana webhook payload. Only `receiver`, `status` and
/// `alerts` are required; the rest of the v4 envelope is accepted and
/// ignored.
#[derive(Debug, Deserialize, Serialize)]
pub struct AlertPayload {
    pub receiver: String,
    pub status: String,
    pub alerts: Vec<Alert>,
    #[serde(rename = "groupLabels", default)]
    pub group_labels: Option<HashMap<String, String>>,
    #[serde(rename = "commonLabels", default)]
    pub common_labels: Option<HashMap<String, String>>,
    #[serde(rename = "commonAnnotations", default)]
    pub common_annotations: Option<HashMap<String, String>>,
    #[serde(rename = "externalURL", default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "groupKey", default)]
    pub group_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Alert {
    pub status: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    #[serde(rename = "startsAt", default)]
    pub starts_at: Option<String>,
    #[serde(rename = "endsAt", default)]
    pub ends_at: Option<String>,
}

impl Alert {
    /// Display name for logs and response records.
    pub fn name(&self) -> &str {
        self.labels
            .get("alertname")
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}
