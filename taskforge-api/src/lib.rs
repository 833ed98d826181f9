//! # TaskForge API Server Library
//!
//! This library provides the core functionality for the TaskForge API
//! server: the consistency and query layer over the task store.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `audit`: Asynchronous audit trail dispatch
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod routes;
