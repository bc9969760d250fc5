//! Idempotent provisioning engine.
//!
//! Declarative "ensure desired state" operations for servers: directories,
//! whole files, single lines, and key/value configuration files that are
//! edited in place without disturbing anything else.  Every operation reports
//! whether it changed something, and a session-wide tracker aggregates that
//! over a run.
//!
//! The public API is organised into four layers:
//!
//! - **[`keyvalue`]**: line grammar, style detection and the reconciler
//! - **[`resources`]**: idempotent `check + apply` primitives
//! - **[`manifest`]**: TOML description of a run
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `set`, `detect`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backup;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod diff;
pub mod error;
pub mod exec;
pub mod keyvalue;
pub mod logging;
pub mod manifest;
pub mod operations;
pub mod resources;
pub mod session;
