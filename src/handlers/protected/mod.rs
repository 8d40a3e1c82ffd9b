// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind `middleware::require_auth`, so handlers can
// rely on an `AuthUser` in the request extensions.
//
// Security Level: Verified bearer token
// Route Prefix: /api/*
// Middleware: require_auth

pub mod auth;       // Current principal and session end
pub mod connectors; // Connector registrations CRUD
pub mod settings;   // Dataspace settings singleton
pub mod stats;      // Derived dashboard figures
