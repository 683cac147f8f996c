//! push-pilot - push-triggered pull request automation for GitHub Apps
//!
//! Receives signed `push` deliveries, and when the configured branch is
//! pushed, opens a pull request into the base branch, merges it and deletes
//! the branch.
//!
//! - [`webhook`] - HTTP server, signature checks, payload decoding
//! - [`workflow`] - trigger predicate, action planning and execution
//! - [`platform`] - repository service trait and its GitHub implementation
//! - [`auth`] - GitHub App JWT and installation tokens
//! - [`config`] - flags / environment configuration

pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod types;
pub mod webhook;
pub mod workflow;
