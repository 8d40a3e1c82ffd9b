pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod oidc;
pub mod store;

#[cfg(test)]
pub mod testing;
