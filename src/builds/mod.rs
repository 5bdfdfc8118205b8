//! Build steps: completion ledger, git probe and the run-mode gate.
//!
//! The gate ([`gate::should_run`]) is a pure decision over a loaded
//! [`ledger::BuildLedger`] and a [`git::GitProbe`]; executing the commands
//! and saving the ledger happens in [`crate::tasks::builds`].
pub mod gate;
pub mod git;
pub mod ledger;

pub use gate::{Decision, GateInput, RunReason, SkipReason, should_run};
pub use git::{CommandGitProbe, GitProbe};
pub use ledger::{BuildLedger, BuildRecord, LEDGER_FILE};
