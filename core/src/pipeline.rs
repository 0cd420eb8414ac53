//! # Pipeline Coordinator
//!
//! Drives the workflow of each domain through
//! `Pending → Enumerating → Merged → Persisted → Scanning → Done`.
//!
//! Sources run concurrently and never touch shared state: their outputs are funneled
//! back to the coordinating task, which performs every merge itself. Persistence starts
//! only once every source returned, and probing only once the results are on disk.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use subtake_common::config::{DEFAULT_PROBE_WORKERS, DEFAULT_SOURCE_WORKERS};
use subtake_common::domain::Domain;
use subtake_common::takeover::TakeoverFinding;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::aggregator::Aggregator;
use crate::matcher::{ProgressFn, TakeoverMatcher};
use crate::repository::{PersistError, ResultRepository};
use crate::source::{SourceError, SourceOutput, SubdomainSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Enumerating,
    Merged,
    Persisted,
    Scanning,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Enumerating => "enumerating",
            Stage::Merged => "merged",
            Stage::Persisted => "persisted",
            Stage::Scanning => "scanning",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("results could not be saved: {0}")]
    Persist(#[from] PersistError),
    #[error("skipped, the run was interrupted")]
    Cancelled,
}

/// What one source contributed to a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    /// Distinct hostnames parsed from the output.
    pub found: usize,
    /// Hostnames no earlier source had reported.
    pub new: usize,
    /// Why the source contributed nothing, if it failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DomainReport {
    pub domain: Domain,
    pub sources: Vec<SourceReport>,
    pub subdomains: Vec<String>,
    pub summary_path: PathBuf,
    pub findings: Vec<TakeoverFinding>,
    /// Last stage reached. Anything short of [`Stage::Done`] means the run was
    /// interrupted and the results are partial.
    pub stage: Stage,
    pub elapsed: Duration,
}

impl DomainReport {
    pub fn is_partial(&self) -> bool {
        self.stage != Stage::Done
    }
}

/// Hooks into [`Pipeline::run`], called from the coordinating task.
pub trait RunObserver: Send + Sync {
    /// Called before a domain starts. All of its work runs inside the returned span.
    fn domain_started(&self, domain: &Domain) -> Span {
        info_span!("run", domain = %domain)
    }

    /// Takeover probing progress of the domain running in `span`.
    fn probe_progress(&self, _span: &Span, _checked: usize, _total: usize) {}

    /// Called once per domain, including domains skipped after an interruption.
    fn domain_finished(&self, _domain: &Domain, _outcome: &Result<DomainReport, PipelineError>) {}
}

/// Observer that only relies on the pipeline's own logging.
pub struct Unobserved;

impl RunObserver for Unobserved {}

pub struct Pipeline {
    sources: Vec<Arc<dyn SubdomainSource>>,
    repository: Arc<dyn ResultRepository>,
    matcher: Option<TakeoverMatcher>,
    source_workers: usize,
    probe_workers: usize,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Without a matcher, domains finish right after persistence.
    pub fn new(
        sources: Vec<Arc<dyn SubdomainSource>>,
        repository: Arc<dyn ResultRepository>,
        matcher: Option<TakeoverMatcher>,
    ) -> Self {
        Self {
            sources,
            repository,
            matcher,
            source_workers: DEFAULT_SOURCE_WORKERS,
            probe_workers: DEFAULT_PROBE_WORKERS,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_workers(mut self, source_workers: usize, probe_workers: usize) -> Self {
        self.source_workers = source_workers.max(1);
        self.probe_workers = probe_workers.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Processes `domains` one after another. A failing domain never stops the next
    /// one; once the run is interrupted the remaining domains are skipped.
    pub async fn run(&self, domains: &[Domain]) -> Vec<(Domain, Result<DomainReport, PipelineError>)> {
        self.run_observed(domains, &Unobserved).await
    }

    /// [`Pipeline::run`], reporting each domain to `observer`.
    pub async fn run_observed(
        &self,
        domains: &[Domain],
        observer: &dyn RunObserver,
    ) -> Vec<(Domain, Result<DomainReport, PipelineError>)> {
        let mut outcomes = Vec::with_capacity(domains.len());

        for domain in domains {
            let outcome = if self.cancel.is_cancelled() {
                warn!("skipping {domain}: run was interrupted");
                Err(PipelineError::Cancelled)
            } else {
                let span = observer.domain_started(domain);
                let progress = |checked: usize, total: usize| {
                    observer.probe_progress(&span, checked, total);
                };
                self.run_domain(domain, Some(&progress))
                    .instrument(span.clone())
                    .await
            };

            if let Err(e) = &outcome {
                error!("{domain}: {e}");
            }
            observer.domain_finished(domain, &outcome);
            outcomes.push((domain.clone(), outcome));
        }

        outcomes
    }

    /// Runs the full workflow for one domain.
    pub async fn run_domain(
        &self,
        domain: &Domain,
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<DomainReport, PipelineError> {
        let span = info_span!("domain", name = %domain);
        self.process(domain, progress).instrument(span).await
    }

    async fn process(
        &self,
        domain: &Domain,
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<DomainReport, PipelineError> {
        let start = Instant::now();
        let mut stage = Stage::Pending;

        advance(&mut stage, Stage::Enumerating);
        let outputs = self.enumerate(domain).await;

        let mut aggregator = Aggregator::new();
        let mut reports = Vec::with_capacity(outputs.len());
        let mut raw_logs = Vec::new();

        for (source, outcome) in outputs {
            let report = match outcome {
                Ok(output) => {
                    let report = merge_output(&mut aggregator, source.as_ref(), domain, &output);
                    raw_logs.push((source.slug().to_string(), output.lines));
                    report
                }
                Err(e) => {
                    warn!("{} skipped for {domain}: {e}", source.name());
                    if let Some(partial) = e.partial_output() {
                        raw_logs.push((source.slug().to_string(), partial.to_vec()));
                    }
                    failed_report(source.as_ref(), &e)
                }
            };
            reports.push(report);
        }
        advance(&mut stage, Stage::Merged);
        debug!(contributions = ?aggregator.contributions(), "merge complete");

        let subdomains = aggregator.finalize();
        let summary_path = self.persist(domain, &raw_logs, &subdomains).await?;
        info!(
            "Subdomains for {domain} saved to {}",
            summary_path.display()
        );
        advance(&mut stage, Stage::Persisted);

        let interrupted = self.cancel.is_cancelled();
        let findings = match &self.matcher {
            Some(_) if interrupted => {
                warn!("interrupted, not probing {} subdomains of {domain}", subdomains.len());
                Vec::new()
            }
            Some(matcher) => {
                advance(&mut stage, Stage::Scanning);
                matcher
                    .scan(&subdomains, self.probe_workers, &self.cancel, progress)
                    .await
            }
            None => Vec::new(),
        };
        if !self.cancel.is_cancelled() {
            advance(&mut stage, Stage::Done);
        }

        Ok(DomainReport {
            domain: domain.clone(),
            sources: reports,
            subdomains,
            summary_path,
            findings,
            stage,
            elapsed: start.elapsed(),
        })
    }

    /// Runs every source, at most `source_workers` at a time, and returns the outcomes
    /// in registration order.
    async fn enumerate(
        &self,
        domain: &Domain,
    ) -> Vec<(Arc<dyn SubdomainSource>, Result<SourceOutput, SourceError>)> {
        let runs = self.sources.iter().cloned().enumerate().map(|(idx, source)| {
            let cancel = self.cancel.clone();
            async move {
                let outcome = source.fetch(domain, &cancel).await;
                (idx, source, outcome)
            }
        });

        let mut outcomes: Vec<_> = stream::iter(runs)
            .buffer_unordered(self.source_workers)
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        outcomes
            .into_iter()
            .map(|(_, source, outcome)| (source, outcome))
            .collect()
    }

    /// Writes every raw log and the final list. All writes are attempted even if one
    /// fails; the first failure is returned.
    async fn persist(
        &self,
        domain: &Domain,
        raw_logs: &[(String, Vec<String>)],
        subdomains: &[String],
    ) -> Result<PathBuf, PipelineError> {
        let mut first_failure: Option<PersistError> = None;

        for (slug, lines) in raw_logs {
            if let Err(e) = self.repository.save_source_log(domain, slug, lines).await {
                error!("{e}");
                first_failure.get_or_insert(e);
            }
        }

        let saved = self.repository.save_subdomains(domain, subdomains).await;
        match (saved, first_failure) {
            (Ok(path), None) => Ok(path),
            (Ok(_), Some(e)) => Err(e.into()),
            (Err(e), _) => Err(e.into()),
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("{stage} -> {next}");
    *stage = next;
}

fn merge_output(
    aggregator: &mut Aggregator,
    source: &dyn SubdomainSource,
    domain: &Domain,
    output: &SourceOutput,
) -> SourceReport {
    if !output.success {
        let reason = match output.exit_code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by a signal".to_string(),
        };
        warn!("{} {reason}; ignoring its output for {domain}", source.name());
        return SourceReport {
            name: source.name().to_string(),
            found: 0,
            new: 0,
            error: Some(reason),
        };
    }

    let parsed = source.format().parse(&output.lines);
    let found = parsed.len();
    let new = aggregator.merge_from(source.name(), parsed);
    info!(
        "{} found {new} new subdomains for {domain}. Total so far: {}",
        source.name(),
        aggregator.len()
    );

    SourceReport {
        name: source.name().to_string(),
        found,
        new,
        error: None,
    }
}

fn failed_report(source: &dyn SubdomainSource, err: &SourceError) -> SourceReport {
    SourceReport {
        name: source.name().to_string(),
        found: 0,
        new: 0,
        error: Some(err.to_string()),
    }
}
