//! Prickly Pear Admin library.
//!
//! This crate provides the staff panel functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This binary is for staff only and must not be exposed publicly - deploy
//! it behind the VPN. Every entry point runs the role policy in [`auth`]
//! before touching data.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
