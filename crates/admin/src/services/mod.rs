//! Console services.
//!
//! - `cache` - in-process cache for branding and the credit catalog

pub mod cache;

pub use cache::ConsoleCache;
