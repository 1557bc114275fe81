//! Gatekeeper service library crate.
//!
//! # Purpose
//! Hosts the access-control core (capability registry, role composite,
//! principal directory, permission resolution, registry sync and the
//! authorization checker), the store contract it persists through, and the
//! boot wiring the binary uses.
pub mod access;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod observability;
pub mod seed;
pub mod store;
