use std::collections::HashMap;

use async_trait::async_trait;
use subtake_common::domain::Domain;
use subtake_core::matcher::{FetchError, PageFetcher};
use subtake_core::parser::OutputFormat;
use subtake_core::source::{SourceError, SourceOutput, SubdomainSource};
use tokio_util::sync::CancellationToken;

/// A source that prints a fixed list of lines.
pub struct StaticSource {
    pub name: String,
    pub format: OutputFormat,
    pub lines: Vec<String>,
}

impl StaticSource {
    pub fn new(name: &str, format: OutputFormat, lines: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            format,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[async_trait]
impl SubdomainSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.name
    }

    fn format(&self) -> OutputFormat {
        self.format
    }

    async fn fetch(
        &self,
        _domain: &Domain,
        _cancel: &CancellationToken,
    ) -> Result<SourceOutput, SourceError> {
        Ok(SourceOutput::completed(self.lines.clone()))
    }
}

/// Serves canned bodies per host; unknown hosts behave like a timeout.
#[derive(Default)]
pub struct CannedFetcher {
    pub bodies: HashMap<String, String>,
}

impl CannedFetcher {
    pub fn with(mut self, host: &str, body: &str) -> Self {
        self.bodies.insert(host.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch_body(&self, host: &str) -> Result<String, FetchError> {
        self.bodies.get(host).cloned().ok_or(FetchError::Timeout)
    }
}
