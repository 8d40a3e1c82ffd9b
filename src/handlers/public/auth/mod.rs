// handlers/public/auth - credential issuance and refresh
//
// GET  /auth/authorize  → 303 to the provider login page
// POST /auth/authorize  → authorization URL as JSON, for non-browser clients
// GET  /auth/callback   → provider redirect target, returns a credential
// POST /auth/token      → direct username/password exchange
// POST /auth/refresh    → new credential from a refresh token

pub mod authorize;
pub mod callback;
pub mod refresh;
pub mod token;

pub use authorize::get as authorize_get;
pub use authorize::post as authorize_post;
pub use callback::get as callback_get;
pub use refresh::post as refresh_post;
pub use token::post as token_post;
