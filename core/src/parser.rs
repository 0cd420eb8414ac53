//! Hostname extraction from the raw output of discovery tools.
//!
//! Parsers never fail: a line that does not fit the expected grammar is skipped.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

pub type Hostnames = BTreeSet<String>;

const URL_SCHEMES: &[&str] = &["http://", "https://"];

/// Grammar of a tool's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One hostname per line.
    Lines,
    /// Annotated records such as `www.example.com (FQDN)`.
    Fqdn,
    /// Full URLs of matched endpoints, e.g. `http://admin.example.com/ [Status: 200]`.
    Urls,
}

impl OutputFormat {
    pub fn parse<I, S>(&self, lines: I) -> Hostnames
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self {
            OutputFormat::Lines => parse_lines(lines),
            OutputFormat::Fqdn => parse_fqdn_records(lines),
            OutputFormat::Urls => parse_url_list(lines),
        }
    }
}

pub fn parse_lines<I, S>(lines: I) -> Hostnames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let candidate = line.as_ref().trim();
            // Banner and status lines carry inner whitespace, hostnames never do.
            if candidate.is_empty() || candidate.contains(char::is_whitespace) {
                None
            } else {
                Some(candidate.to_string())
            }
        })
        .collect()
}

fn fqdn_pattern() -> &'static Regex {
    static FQDN: OnceLock<Regex> = OnceLock::new();
    FQDN.get_or_init(|| Regex::new(r"(\S+\.\S+)\s*\(FQDN\)").expect("valid FQDN pattern"))
}

pub fn parse_fqdn_records<I, S>(lines: I) -> Hostnames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pattern = fqdn_pattern();
    lines
        .into_iter()
        .filter_map(|line| {
            pattern
                .captures(line.as_ref())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

pub fn parse_url_list<I, S>(lines: I) -> Hostnames
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| host_from_url_line(line.as_ref()))
        .collect()
}

fn host_from_url_line(line: &str) -> Option<String> {
    let url = line.split_whitespace().next()?;
    let rest = URL_SCHEMES
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))?;
    let host = rest.split('/').next().unwrap_or_default();

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
