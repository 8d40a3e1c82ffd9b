pub mod collection;
pub mod record;

pub use collection::get as connectors_get;
pub use collection::post as connectors_post;
pub use record::delete as connector_delete;
pub use record::get as connector_get;
pub use record::put as connector_put;
pub use record::status_patch as connector_status_patch;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a connector id from the path; a malformed id names no connector
pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found(format!("Connector {} not found", id)))
}
