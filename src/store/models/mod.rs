pub mod connector;
pub mod settings;
pub mod stats;

pub use connector::{Connector, ConnectorPatch, ConnectorStatus, FieldErrors, NewConnector};
pub use settings::{DataspaceSettings, SettingsInput};
pub use stats::Stats;
