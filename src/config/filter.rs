//! Host and enable gating shared by every filterable entry.
use serde::Deserialize;
use std::fmt;

/// Tri-state enable flag.
///
/// Absent in the TOML means [`Enabled::Inherited`], which behaves as enabled
/// unless an enclosing scope (e.g. a recipe override) says otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<bool>")]
pub enum Enabled {
    /// Not specified; defer to the enclosing scope (default: enabled).
    #[default]
    Inherited,
    /// Explicitly enabled.
    Enabled,
    /// Explicitly disabled.
    Disabled,
}

impl From<Option<bool>> for Enabled {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Inherited,
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
        }
    }
}

impl Enabled {
    /// Resolve against an outer value: an explicit inner setting wins.
    #[must_use]
    pub const fn or(self, outer: Self) -> Self {
        match self {
            Self::Inherited => outer,
            explicit => explicit,
        }
    }

    /// Whether the flag allows the entry (`Inherited` counts as enabled).
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Why an entry was gated out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateReason {
    /// `enabled = false`.
    Disabled,
    /// The current host is not listed in `hosts`.
    HostMismatch {
        /// Current host.
        host: String,
        /// Hosts the entry is limited to.
        hosts: Vec<String>,
    },
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::HostMismatch { host, hosts } => {
                write!(f, "host '{host}' not in [{}]", hosts.join(", "))
            }
        }
    }
}

/// Evaluate an enable flag and host list against the current host.
///
/// An empty host list matches every host. Hosts are compared
/// case-insensitively.
///
/// # Errors
///
/// Returns the [`GateReason`] when the entry must be skipped.
pub fn check(enabled: Enabled, hosts: &[String], host: &str) -> Result<(), GateReason> {
    if !enabled.is_enabled() {
        return Err(GateReason::Disabled);
    }
    if hosts.is_empty() || hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        return Ok(());
    }
    Err(GateReason::HostMismatch {
        host: host.to_string(),
        hosts: hosts.to_vec(),
    })
}

/// Entries that carry their own `enabled` / `hosts` filter.
pub trait Filtered {
    /// The entry's enable flag.
    fn enabled(&self) -> Enabled;
    /// The entry's host list (empty = all hosts).
    fn hosts(&self) -> &[String];
    /// Mutable access for normalisation and host push-down.
    fn hosts_mut(&mut self) -> &mut Vec<String>;

    /// Gate this entry for `host`.
    ///
    /// # Errors
    ///
    /// Returns the [`GateReason`] when the entry must be skipped.
    fn gate(&self, host: &str) -> Result<(), GateReason> {
        check(self.enabled(), self.hosts(), host)
    }

    /// Copy `hosts` onto this entry unless it already has its own.
    fn inherit_hosts(&mut self, hosts: &[String]) {
        let own = self.hosts_mut();
        if own.is_empty() {
            own.extend(hosts.iter().cloned());
        }
    }

    /// Lowercase the host list in place.
    fn normalize_hosts(&mut self) {
        for h in self.hosts_mut() {
            *h = crate::platform::normalize_host(h);
        }
    }
}

/// Implement [`Filtered`] for structs with `enabled: Enabled` and
/// `hosts: Vec<String>` fields.
macro_rules! impl_filtered {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::config::filter::Filtered for $ty {
                fn enabled(&self) -> $crate::config::filter::Enabled {
                    self.enabled
                }
                fn hosts(&self) -> &[String] {
                    &self.hosts
                }
                fn hosts_mut(&mut self) -> &mut Vec<String> {
                    &mut self.hosts
                }
            }
        )+
    };
}

pub(crate) use impl_filtered;
