// handlers/mod.rs - Handler tiers
//
// Public (no credential) → Protected (bearer token verified by the gatekeeper)
//
// Declare the security tiers
pub mod public;    // Tier 1: No authentication required (/, /health, /auth/*)
pub mod protected; // Tier 2: Gatekeeper required (/api/*)
