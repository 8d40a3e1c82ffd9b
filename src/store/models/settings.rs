use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Singleton dataspace settings record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataspaceSettings {
    pub id: Uuid,
    pub wallet_url: Option<String>,
    pub portal_url: Option<String>,
    pub central_idp_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    #[serde(default)]
    pub wallet_url: Option<String>,
    #[serde(default)]
    pub portal_url: Option<String>,
    #[serde(default)]
    pub central_idp_url: Option<String>,
}

impl DataspaceSettings {
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            wallet_url: None,
            portal_url: None,
            central_idp_url: None,
        }
    }

    /// Replace all URLs with the input, normalizing blanks to `None`
    pub fn from_input(id: Uuid, input: SettingsInput) -> Self {
        Self {
            id,
            wallet_url: blank_to_none(input.wallet_url),
            portal_url: blank_to_none(input.portal_url),
            central_idp_url: blank_to_none(input.central_idp_url),
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
