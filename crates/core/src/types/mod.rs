//! Core types for Prickly Pear Commerce.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{percentage, quantize};
pub use role::{AccessDecision, AccountKind, StaffRole};
