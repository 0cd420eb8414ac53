use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use colored::*;
use subtake_common::config::Config;
use subtake_common::domain::Domain;
use subtake_common::signatures::SignatureTable;
use subtake_core::matcher::{HttpFetcher, TakeoverMatcher};
use subtake_core::pipeline::{DomainReport, Pipeline, PipelineError, RunObserver};
use subtake_core::repository::FileRepository;
use subtake_core::source::default_sources;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, info, info_span, warn};

use crate::terminal::{colors, format, print, spinner};

pub async fn enumerate(domains: &[Domain], cfg: &Config) -> anyhow::Result<ExitCode> {
    let pipeline = build_pipeline(cfg)?;
    watch_ctrl_c(pipeline.cancellation_token());

    let observer = TerminalObserver { cfg };
    let outcomes = pipeline.run_observed(domains, &observer).await;

    print::end_of_program();

    Ok(exit_code(&outcomes))
}

/// Failure when any domain failed, was skipped or stopped early.
fn exit_code(outcomes: &[(Domain, Result<DomainReport, PipelineError>)]) -> ExitCode {
    let complete = outcomes
        .iter()
        .all(|(_, outcome)| matches!(outcome, Ok(report) if !report.is_partial()));
    if complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints each domain as the pipeline works through it.
struct TerminalObserver<'a> {
    cfg: &'a Config,
}

impl RunObserver for TerminalObserver<'_> {
    fn domain_started(&self, domain: &Domain) -> Span {
        print::header(&format!("Enumerating {domain}"), self.cfg.quiet);

        let span = info_span!("probe", indicatif.pb_show = true);
        spinner::attach(&span, &format!("Enumerating subdomains of {domain}..."));
        span
    }

    fn probe_progress(&self, span: &Span, checked: usize, total: usize) {
        spinner::report_probe_progress(span, checked, total);
    }

    fn domain_finished(&self, _domain: &Domain, outcome: &Result<DomainReport, PipelineError>) {
        if let Ok(report) = outcome {
            print_report(report, self.cfg);
            print::print("");
        }
    }
}

fn build_pipeline(cfg: &Config) -> anyhow::Result<Pipeline> {
    let sources = default_sources(cfg);
    if sources.is_empty() {
        warn!("Every discovery source is disabled");
    }

    let repository = Arc::new(FileRepository::new(cfg.output_dir.clone()));

    let matcher = if cfg.no_takeover {
        None
    } else {
        let signatures = match &cfg.signatures {
            Some(path) => {
                let table = SignatureTable::load(path).with_context(|| {
                    format!("failed to load takeover signatures from {}", path.display())
                })?;
                info!("Loaded {} takeover signatures from {}", table.len(), path.display());
                Arc::new(table)
            }
            None => SignatureTable::builtin(),
        };
        let fetcher = HttpFetcher::new(&cfg.probe).context("failed to build the HTTP client")?;
        let matcher = TakeoverMatcher::new(Arc::new(fetcher), signatures);
        debug!("Probing with {} takeover signatures", matcher.signatures().len());
        Some(matcher)
    };

    Ok(Pipeline::new(sources, repository, matcher).with_workers(cfg.source_workers, cfg.probe_workers))
}

fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, saving partial results");
            cancel.cancel();
        }
    });
}

fn print_report(report: &DomainReport, cfg: &Config) {
    if cfg.quiet < 2 {
        print_sources(report);
    }

    if report.subdomains.is_empty() {
        print::header("Zero subdomains found", cfg.quiet);
        if cfg.quiet == 0 {
            print::no_results();
        }
    }

    for finding in &report.findings {
        print::finding(&finding.subdomain, &finding.platform);
    }

    if report.is_partial() {
        warn!(
            "Results for {} are partial, the run stopped after the {} stage",
            report.domain, report.stage
        );
    }

    print_summary(report, cfg);
}

fn print_sources(report: &DomainReport) {
    let details = report.sources.iter().map(format::source_to_detail).collect();
    print::tree_head(report.sources.len(), "Sources");
    print::as_tree_one_level(details);
}

fn print_summary(report: &DomainReport, cfg: &Config) {
    let subdomains: ColoredString =
        format::count(report.subdomains.len(), "subdomain", "subdomains")
            .bold()
            .green();
    let findings: ColoredString = {
        let text = format::count(report.findings.len(), "takeover candidate", "takeover candidates");
        if report.findings.is_empty() {
            text.normal()
        } else {
            text.bold().red()
        }
    };
    let output: ColoredString = format!(
        "{}: {subdomains}, {findings} in {}",
        report.domain,
        format::elapsed(report.elapsed)
    )
    .color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => info!("{}", output),
    }
}
