//! # Project Organiser Shared Library
//!
//! Domain types, persistence and authentication used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: users, projects and tasks
//! - `store`: persistence traits with PostgreSQL and in-memory backends
//! - `db`: connection pool and embedded migrations
//! - `auth`: password hashing, session tokens, signup/login and access control
//! - `blob`: image storage returning public references

pub mod auth;
pub mod blob;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
