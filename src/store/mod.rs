pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::{
    Connector, ConnectorPatch, ConnectorStatus, DataspaceSettings, NewConnector, SettingsInput, Stats,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
}
