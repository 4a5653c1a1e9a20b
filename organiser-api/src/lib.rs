//! # Project Organiser API Server Library
//!
//! HTTP surface for the project organiser: signup/login, users, projects,
//! tasks and image uploads.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
