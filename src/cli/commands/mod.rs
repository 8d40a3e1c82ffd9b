pub mod auth;
pub mod connector;
pub mod settings;
pub mod stats;
