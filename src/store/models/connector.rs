use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Reachability of a registered connector as last reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorStatus {
    #[default]
    Connected,
    Disconnected,
    Error,
}

impl std::str::FromStr for ConnectorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "connected" => Ok(ConnectorStatus::Connected),
            "disconnected" => Ok(ConnectorStatus::Disconnected),
            "error" => Ok(ConnectorStatus::Error),
            other => Err(format!("unknown connector status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub bpn: String,
    pub endpoint: String,
    pub status: ConnectorStatus,
}

/// Body of a create request. Id and status are assigned by the server.
///
/// Missing fields deserialize as empty so they surface as field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewConnector {
    pub name: String,
    pub version: String,
    pub bpn: String,
    pub endpoint: String,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

pub type FieldErrors = HashMap<String, String>;

impl NewConnector {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "name", &self.name);
        check_required(&mut errors, "version", &self.version);
        check_required(&mut errors, "bpn", &self.bpn);
        if check_required(&mut errors, "endpoint", &self.endpoint) {
            check_endpoint(&mut errors, &self.endpoint);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl ConnectorPatch {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            check_required(&mut errors, "name", name);
        }
        if let Some(version) = &self.version {
            check_required(&mut errors, "version", version);
        }
        if let Some(bpn) = &self.bpn {
            check_required(&mut errors, "bpn", bpn);
        }
        if let Some(endpoint) = &self.endpoint {
            if check_required(&mut errors, "endpoint", endpoint) {
                check_endpoint(&mut errors, endpoint);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn apply_to(self, connector: &mut Connector) {
        if let Some(name) = self.name {
            connector.name = name;
        }
        if let Some(version) = self.version {
            connector.version = version;
        }
        if let Some(bpn) = self.bpn {
            connector.bpn = bpn;
        }
        if let Some(endpoint) = self.endpoint {
            connector.endpoint = endpoint;
        }
    }
}

fn check_required(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "This field is required".to_string());
        return false;
    }
    true
}

fn check_endpoint(errors: &mut FieldErrors, endpoint: &str) {
    if let Err(e) = url::Url::parse(endpoint) {
        errors.insert("endpoint".to_string(), format!("Invalid URL: {}", e));
    }
}
