//! Lendix Core - Shared domain types.
//!
//! This crate provides the types shared by every Lendix component:
//! - `admin` - The server-rendered lending console
//! - `cli` - Operator tooling against the lending backend
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! The lending backend owns persistence and business rules; these types only
//! describe what crosses the wire and what the console keeps in a session.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, email, roles, credit status and wizard steps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
