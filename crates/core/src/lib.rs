//! Prickly Pear Core - Shared types library.
//!
//! This crate provides common types used across all Prickly Pear components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, payments)
//! - `admin` - Internal staff panel (inventory, suppliers, analytics)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email addresses, money arithmetic, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
