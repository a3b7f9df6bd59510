// Public API for the server binary and integration tests

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod hunt;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;
pub mod upload;
