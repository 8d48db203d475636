//! Functional core for the social sign-up demo.
//!
//! Pure types, traits and decision functions shared by the auth crate and the
//! web binary. Nothing in here performs I/O on its own.

pub mod auth;
pub mod flow;
pub mod forms;
pub mod identity;
pub mod tab;
