use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_WORKERS: usize = 20;
pub const DEFAULT_SOURCE_WORKERS: usize = 6;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_WORDLIST: &str = "/usr/share/wordlists/amass/subdomains-top1mil-5000.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Settings of the takeover probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub scheme: Scheme,
    pub timeout: Duration,
    /// Follow up to ten redirects and inspect the final body.
    pub follow_redirects: bool,
    /// Overrides the scheme's default port.
    pub port: Option<u16>,
    /// Bodies are truncated to this many bytes before matching.
    pub max_body_bytes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            timeout: DEFAULT_PROBE_TIMEOUT,
            follow_redirects: true,
            port: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

pub struct Config {
    /// Directory receiving the raw source logs and the subdomain lists.
    pub output_dir: PathBuf,
    pub probe: ProbeConfig,
    pub probe_workers: usize,
    pub source_workers: usize,
    /// Upper bound on the runtime of a single discovery tool.
    pub source_timeout: Duration,
    /// Wordlist handed to the fuzzing source.
    pub wordlist: PathBuf,
    /// Slugs of the sources that must not run.
    pub skip_sources: Vec<String>,
    /// Replaces the builtin takeover signatures.
    pub signatures: Option<PathBuf>,
    /// Stop after persisting the subdomain list.
    pub no_takeover: bool,
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            probe: ProbeConfig::default(),
            probe_workers: DEFAULT_PROBE_WORKERS,
            source_workers: DEFAULT_SOURCE_WORKERS,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            wordlist: PathBuf::from(DEFAULT_WORDLIST),
            skip_sources: Vec::new(),
            signatures: None,
            no_takeover: false,
            quiet: 0,
        }
    }
}
