//! atelier-core — message routing and role scheduling for multi-agent
//! pipelines.
//!
//! Roles subscribe to action kinds, react to delivered messages by running
//! one action per turn, and publish the result back through the
//! environment. The environment drives synchronous rounds until no role
//! has pending work, a role fails for good, or the round budget runs out.
//! Frontends stay thin: everything here is UI-agnostic.

pub mod action;
pub mod config;
pub mod environment;
pub mod error;
pub mod memory;
pub mod message;
pub mod persist;
pub mod prompts;
pub mod provider;
pub mod role;
pub mod schema;
pub mod team;
pub mod tool;
