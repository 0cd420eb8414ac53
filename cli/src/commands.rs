pub mod enumerate;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use subtake_common::config::{
    Config, DEFAULT_PROBE_WORKERS, DEFAULT_SOURCE_WORKERS, DEFAULT_WORDLIST, ProbeConfig, Scheme,
};
use subtake_common::domain::Domain;
use subtake_core::source::SOURCE_SLUGS;

#[derive(Parser)]
#[command(name = "subtake")]
#[command(version, about = "Subdomain enumeration with takeover detection.")]
pub struct CommandLine {
    /// Root domains to enumerate
    #[arg(required = true, value_name = "DOMAIN")]
    pub domains: Vec<Domain>,

    /// Directory receiving source logs and subdomain lists
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Seconds to wait for each takeover probe
    #[arg(short, long, value_name = "SECS", default_value_t = 5)]
    pub timeout: u64,

    /// Takeover probes in flight at once
    #[arg(short, long, default_value_t = DEFAULT_PROBE_WORKERS)]
    pub workers: usize,

    /// Discovery tools running at once
    #[arg(long, default_value_t = DEFAULT_SOURCE_WORKERS)]
    pub source_workers: usize,

    /// Minutes a single discovery tool may run
    #[arg(long, value_name = "MINS", default_value_t = 30)]
    pub source_timeout: u64,

    /// Probe over HTTPS instead of plain HTTP
    #[arg(long)]
    pub https: bool,

    /// Inspect the first response instead of following redirects
    #[arg(long)]
    pub no_redirects: bool,

    /// Wordlist for the fuzzing source
    #[arg(long, value_name = "FILE", default_value = DEFAULT_WORDLIST)]
    pub wordlist: PathBuf,

    /// Disable a discovery source, may be repeated
    #[arg(
        long = "skip",
        value_name = "SOURCE",
        value_parser = PossibleValuesParser::new(SOURCE_SLUGS.iter().copied())
    )]
    pub skip: Vec<String>,

    /// JSON file replacing the builtin takeover signatures
    #[arg(long, value_name = "FILE")]
    pub signatures: Option<PathBuf>,

    /// Only enumerate, skip takeover probing
    #[arg(long)]
    pub no_takeover: bool,

    /// Less output, repeat for findings only
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_config(&self) -> Config {
        let probe = ProbeConfig {
            scheme: if self.https { Scheme::Https } else { Scheme::Http },
            timeout: Duration::from_secs(self.timeout),
            follow_redirects: !self.no_redirects,
            ..ProbeConfig::default()
        };

        Config {
            output_dir: self.output.clone(),
            probe,
            probe_workers: self.workers,
            source_workers: self.source_workers,
            source_timeout: Duration::from_secs(self.source_timeout.saturating_mul(60)),
            wordlist: self.wordlist.clone(),
            skip_sources: self.skip.clone(),
            signatures: self.signatures.clone(),
            no_takeover: self.no_takeover,
            quiet: self.quiet,
        }
    }
}
