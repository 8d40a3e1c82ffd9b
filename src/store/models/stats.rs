use serde::{Deserialize, Serialize};

/// Dashboard figures derived from the registered connectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub connectors: u64,
    pub assets: u64,
    pub policies: u64,
    pub contracts: u64,
    pub contract_agreements: u64,
    pub data_offers: u64,
}

impl Stats {
    pub fn from_connector_count(n: u64) -> Self {
        Self {
            connectors: n,
            assets: n * 3 + 2,
            policies: n * 2,
            contracts: (n * 3 / 2).max(1),
            contract_agreements: (n * 2).max(1),
            data_offers: (n * 5 / 2).max(1),
        }
    }
}
