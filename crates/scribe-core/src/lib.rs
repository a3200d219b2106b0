//! Core data model and sandbox engine for scribe.
//!
//! A [`sandbox::Sandbox`] is the disposable filesystem state one transcript
//! run operates on. The [`identity::IdentityVirtualizer`] keeps commit hashes
//! and dates stable across runs by mapping every real commit seen in the
//! sandbox onto an entry of a fixed [`identity::IdentityPool`].

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod sandbox;
