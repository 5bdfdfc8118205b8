//! Declarative dotfiles engine.
//!
//! Reads a `dotctl.toml` plus host-selected recipe fragments and converges
//! the home directory towards it: links and copies, directories, cloned
//! repositories, a managed block of shell aliases/functions/env vars in the
//! shell startup files, and build steps gated by a completion ledger.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse the base file, resolve recipes, merge and validate
//! - **[`resources`]**: idempotent `current_state + create` primitives and the reconciler
//! - **[`builds`]**: build ledger, git probe and the run-mode gate
//! - **[`tasks`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `build`, `builds`, `check`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod builds;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
pub mod template;
