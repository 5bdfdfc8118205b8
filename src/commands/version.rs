//! Command: print version information.

/// Version string: `DOTCTL_VERSION` from the build script, else the crate
/// version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTCTL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the dotctl version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("dotctl {}", version());
}
