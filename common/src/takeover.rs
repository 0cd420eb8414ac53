use std::fmt;

/// Outcome of probing one subdomain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub is_vulnerable: bool,
    pub platform: Option<String>,
}

impl Verdict {
    /// No fingerprint matched, or the probe failed.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn flagged(platform: impl Into<String>) -> Self {
        Self {
            is_vulnerable: true,
            platform: Some(platform.into()),
        }
    }
}

/// A subdomain whose response carried a known fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TakeoverFinding {
    pub subdomain: String,
    pub platform: String,
}

impl fmt::Display for TakeoverFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.subdomain, self.platform)
    }
}
