// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Endpoints for service discovery and for obtaining a credential.
//
// Security Level: None
// Route Prefix: No /api prefix (/, /health, /auth/*)
// Middleware: None

pub mod auth;
pub mod root;
