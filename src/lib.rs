//! A small launcher for running project commands in a containerized
//! development environment.
//!
//! The crate wraps external programs in two ways: silently, capturing the
//! combined output of the child process, or interactively, attaching the
//! caller's terminal streams and forwarding every OS signal to the child
//! until it exits. Invocations of `docker-compose` automatically receive
//! the project-selection arguments derived from the environment, so every
//! command operates on the right compose project without callers spelling
//! it out.
//!
//! The main entry point is [`Runner`]; the [`env`] module documents the
//! environment variables the launcher reacts to.

pub mod env;
mod lookup;
mod redirect;
mod runner;
#[cfg(test)]
mod testutil;

/// Just a convenient re-export of the process runner and its verdict type.
///
/// See [`Runner`] for the high-level API and examples.
pub use runner::{Outcome, Runner};
