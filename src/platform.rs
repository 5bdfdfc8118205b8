//! Identity of the machine dotctl is running on.
use std::path::Path;

use crate::exec::Executor;

/// Files consulted, in order, before falling back to the `hostname` program.
const HOSTNAME_FILES: &[&str] = &["/proc/sys/kernel/hostname", "/etc/hostname"];

/// Host information used for `hosts` filters and default shell files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Lowercase host name matched against `hosts` filters.
    pub hostname: String,
    /// Basename of the login shell from `$SHELL` (e.g. `"zsh"`), if known.
    pub shell: Option<String>,
}

impl Platform {
    /// Detect the current host, honouring an explicit override.
    ///
    /// An override (from `--host` or `DOTCTL_HOST`) wins over detection.
    #[must_use]
    pub fn detect(host_override: Option<&str>, executor: &dyn Executor) -> Self {
        let hostname = host_override
            .map(str::to_string)
            .or_else(|| detect_hostname(executor))
            .unwrap_or_default();
        Self {
            hostname: normalize_host(&hostname),
            shell: std::env::var("SHELL").ok().and_then(|s| shell_name(&s)),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub fn new(hostname: &str, shell: Option<&str>) -> Self {
        Self {
            hostname: normalize_host(hostname),
            shell: shell.map(str::to_string),
        }
    }

    /// Default managed-block targets for the login shell, home-relative.
    #[must_use]
    pub fn default_shell_files(&self) -> Vec<String> {
        match self.shell.as_deref() {
            Some("zsh") => vec!["~/.zshrc".to_string()],
            _ => vec!["~/.bashrc".to_string()],
        }
    }
}

/// Lowercase and trim a host name for comparison.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

fn shell_name(shell: &str) -> Option<String> {
    Path::new(shell)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
}

fn detect_hostname(executor: &dyn Executor) -> Option<String> {
    for file in HOSTNAME_FILES {
        if let Ok(content) = std::fs::read_to_string(file) {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    executor
        .run("hostname", &[])
        .ok()
        .map(|r| r.stdout.trim().to_string())
        .filter(|h| !h.is_empty())
}
