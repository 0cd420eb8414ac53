//! The central **abstraction** for discovery sources.
//!
//! Every external tool (passive aggregators, brute-forcers, fuzzers) is driven through
//! [`SubdomainSource`]. An adapter only produces raw output lines; parsing is selected by
//! [`SubdomainSource::format`] and merging is left to the pipeline, so adapters share no
//! mutable state and can run side by side.

use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use subtake_common::domain::Domain;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::parser::OutputFormat;

mod command;
mod roster;

pub use command::CommandSource;
pub use roster::{SOURCE_SLUGS, default_sources};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{program} is not installed or not in PATH")]
    Unavailable { program: String },
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {after:?}")]
    TimedOut {
        program: String,
        after: Duration,
        /// Lines printed before the deadline.
        partial: Vec<String>,
    },
    #[error("{program} was interrupted")]
    Cancelled { program: String, partial: Vec<String> },
}

impl SourceError {
    /// Output the tool printed before it was stopped, if it ran at all.
    pub fn partial_output(&self) -> Option<&[String]> {
        match self {
            SourceError::TimedOut { partial, .. } | SourceError::Cancelled { partial, .. } => {
                Some(partial)
            }
            SourceError::Unavailable { .. } | SourceError::Io { .. } => None,
        }
    }
}

/// Raw standard output of one tool run, split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOutput {
    pub lines: Vec<String>,
    /// Whether the tool reported success. Output of failed runs is logged but not merged.
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl SourceOutput {
    /// A successful run that printed `lines`.
    pub fn completed<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            success: true,
            exit_code: Some(0),
        }
    }

    pub fn exited(lines: Vec<String>, status: ExitStatus) -> Self {
        Self {
            lines,
            success: status.success(),
            exit_code: status.code(),
        }
    }
}

#[async_trait]
pub trait SubdomainSource: Send + Sync {
    /// Human readable name used in progress lines, e.g. `Amass (Passive)`.
    fn name(&self) -> &str;

    /// File-name friendly identifier, e.g. `amass_passive`.
    fn slug(&self) -> &str;

    fn format(&self) -> OutputFormat;

    /// Runs the tool against `domain`.
    ///
    /// Implementations must return promptly with [`SourceError::Cancelled`] once
    /// `cancel` fires, keeping whatever the tool printed until then.
    async fn fetch(
        &self,
        domain: &Domain,
        cancel: &CancellationToken,
    ) -> Result<SourceOutput, SourceError>;
}
