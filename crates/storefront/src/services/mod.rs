//! Application services that sit between routes and repositories.

pub mod auth;
