//! CloudGuard API library
//!
//! Stateless session authentication for the CloudGuard backend: password
//! verification, signed session tokens, the request gate, and the account
//! endpoints that exercise them.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod user;
