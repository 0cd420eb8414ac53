//! The discovery tools enabled by default.

use std::sync::Arc;

use subtake_common::config::Config;
use tracing::debug;

use super::{CommandSource, SubdomainSource};
use crate::parser::OutputFormat;

/// Slugs of every builtin source, in execution order.
pub const SOURCE_SLUGS: &[&str] = &[
    "sublist3r",
    "subfinder",
    "amass_passive",
    "amass_brute",
    "amass_active",
    "ffuf",
];

const FFUF_MATCH_CODES: &str = "200,201,202,301,302,307,401,403,405,407";

fn builtin(cfg: &Config) -> Vec<CommandSource> {
    let wordlist = cfg.wordlist.to_string_lossy().into_owned();

    vec![
        CommandSource::new("Sublist3r", "sublist3r", "sublist3r", OutputFormat::Lines)
            .args(["-d", "{domain}", "-t", "40", "-n"]),
        CommandSource::new("Subfinder", "subfinder", "subfinder", OutputFormat::Lines)
            .args(["-d", "{domain}", "-silent"]),
        CommandSource::new("Amass (Passive)", "amass_passive", "amass", OutputFormat::Fqdn)
            .args(["enum", "-passive", "-d", "{domain}"]),
        CommandSource::new("Amass (Brute Force)", "amass_brute", "amass", OutputFormat::Fqdn)
            .args(["enum", "-brute", "-d", "{domain}"]),
        CommandSource::new("Amass (Active)", "amass_active", "amass", OutputFormat::Fqdn)
            .args(["enum", "-active", "-d", "{domain}"]),
        CommandSource::new("ffuf", "ffuf", "ffuf", OutputFormat::Urls).args([
            "-w".to_string(),
            wordlist,
            "-u".to_string(),
            "http://FUZZ.{domain}".to_string(),
            "-mc".to_string(),
            FFUF_MATCH_CODES.to_string(),
        ]),
    ]
}

/// Builds the builtin sources, leaving out every slug listed in `cfg.skip_sources`.
pub fn default_sources(cfg: &Config) -> Vec<Arc<dyn SubdomainSource>> {
    builtin(cfg)
        .into_iter()
        .filter(|source| {
            let skipped = cfg.skip_sources.iter().any(|slug| slug == source.slug());
            if skipped {
                debug!("source {} disabled", source.slug());
            }
            !skipped
        })
        .map(|source| Arc::new(source.timeout(cfg.source_timeout)) as Arc<dyn SubdomainSource>)
        .collect()
}
