#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use subtake_common::config::Config;
use subtake_common::domain::Domain;
use subtake_common::signatures::SignatureTable;
use subtake_common::takeover::TakeoverFinding;
use subtake_core::matcher::TakeoverMatcher;
use subtake_core::parser::OutputFormat;
use subtake_core::pipeline::Pipeline;
use subtake_core::repository::FileRepository;
use subtake_core::source::{CommandSource, SubdomainSource, default_sources};

use crate::support::{CannedFetcher, StaticSource};

fn read_lines(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Two overlapping sources produce one deduplicated list on disk.
#[tokio::test]
async fn overlapping_sources_are_deduplicated_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sources: Vec<Arc<dyn SubdomainSource>> = vec![
        Arc::new(StaticSource::new(
            "source_a",
            OutputFormat::Lines,
            &["www.test.com", "api.test.com", "dev.test.com"],
        )),
        Arc::new(StaticSource::new(
            "source_b",
            OutputFormat::Lines,
            &["api.test.com", "mail.test.com"],
        )),
    ];
    let pipeline = Pipeline::new(sources, Arc::new(FileRepository::new(dir.path())), None);
    let domain: Domain = "test.com".parse()?;

    let report = pipeline.run_domain(&domain, None).await?;

    assert_eq!(report.subdomains.len(), 4);
    let mut written = read_lines(&dir.path().join("test.com_subdomains.txt"))?;
    assert_eq!(written.len(), 4);
    written.sort();
    written.dedup();
    assert_eq!(
        written,
        vec!["api.test.com", "dev.test.com", "mail.test.com", "www.test.com"]
    );

    assert_eq!(
        read_lines(&dir.path().join("test.com_source_b.log"))?,
        vec!["api.test.com", "mail.test.com"]
    );
    Ok(())
}

/// A tool missing from the environment only removes its own contribution.
#[tokio::test]
async fn missing_tool_does_not_block_other_sources() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sources: Vec<Arc<dyn SubdomainSource>> = vec![
        Arc::new(CommandSource::new(
            "Nowhere",
            "nowhere",
            "subtake-missing-tool-for-tests",
            OutputFormat::Lines,
        )),
        Arc::new(StaticSource::new(
            "amass_passive",
            OutputFormat::Fqdn,
            &[
                "portal.test.com (FQDN) --> a_record --> 10.0.0.1 (IPAddress)",
                "10.0.0.0/8 (Netblock) --> contains --> 10.0.0.1 (IPAddress)",
            ],
        )),
        Arc::new(StaticSource::new(
            "ffuf",
            OutputFormat::Urls,
            &[
                "http://admin.test.com/ [Status: 200]",
                ":: Progress: [5000/5000] :: Job [1/1] ::",
            ],
        )),
    ];
    let pipeline = Pipeline::new(sources, Arc::new(FileRepository::new(dir.path())), None);
    let domain: Domain = "test.com".parse()?;

    let report = pipeline.run_domain(&domain, None).await?;

    assert_eq!(
        read_lines(&report.summary_path)?,
        vec!["admin.test.com", "portal.test.com"]
    );
    assert!(report.sources[0].error.is_some());
    assert!(!dir.path().join("test.com_nowhere.log").exists());
    assert!(dir.path().join("test.com_ffuf.log").exists());
    Ok(())
}

/// Discovered hosts flow into the matcher after they were written out.
#[tokio::test]
async fn findings_are_reported_per_platform() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sources: Vec<Arc<dyn SubdomainSource>> = vec![Arc::new(StaticSource::new(
        "subfinder",
        OutputFormat::Lines,
        &["shop.test.com", "docs.test.com", "www.test.com"],
    ))];
    let fetcher = CannedFetcher::default()
        .with("shop.test.com", "Sorry, this shop is currently unavailable.")
        .with("docs.test.com", "<p>The gods are wise, but do not know of the site which you seek.</p>")
        .with("www.test.com", "<html>home</html>");
    let matcher = TakeoverMatcher::new(Arc::new(fetcher), SignatureTable::builtin());
    let pipeline = Pipeline::new(
        sources,
        Arc::new(FileRepository::new(dir.path())),
        Some(matcher),
    )
    .with_workers(1, 2);

    let domain: Domain = "test.com".parse()?;
    let outcomes = pipeline.run(&[domain]).await;
    let (_, outcome) = outcomes.into_iter().next().context("no outcome")?;
    let report = outcome?;

    assert_eq!(
        report.findings,
        vec![
            TakeoverFinding { subdomain: "docs.test.com".into(), platform: "Pantheon".into() },
            TakeoverFinding { subdomain: "shop.test.com".into(), platform: "Shopify".into() },
        ]
    );
    assert_eq!(read_lines(&report.summary_path)?.len(), 3);
    Ok(())
}

/// With none of the tools installed the run still completes with an empty list.
#[tokio::test]
async fn default_roster_tolerates_absent_tools() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = Config {
        output_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let sources: Vec<Arc<dyn SubdomainSource>> = default_sources(&cfg)
        .into_iter()
        .map(|source| {
            // Point every builtin adapter at a binary that cannot exist.
            Arc::new(CommandSource::new(
                source.name(),
                source.slug(),
                format!("subtake-absent-{}", source.slug()),
                source.format(),
            )) as Arc<dyn SubdomainSource>
        })
        .collect();
    let pipeline = Pipeline::new(sources, Arc::new(FileRepository::new(&cfg.output_dir)), None);
    let domain: Domain = "test.com".parse()?;

    let report = pipeline.run_domain(&domain, None).await?;

    assert!(report.subdomains.is_empty());
    assert_eq!(report.sources.len(), 6);
    assert!(report.sources.iter().all(|s| s.error.is_some()));
    assert_eq!(std::fs::read_to_string(report.summary_path)?, "");
    Ok(())
}

/// A tool that hits its deadline still leaves what it printed on disk.
#[cfg(unix)]
#[tokio::test]
async fn timed_out_tool_output_is_kept_as_raw_log() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let sources: Vec<Arc<dyn SubdomainSource>> = vec![
        Arc::new(
            CommandSource::new("Slow", "slow", "sh", OutputFormat::Lines)
                .args(["-c", "echo deep.{domain}; sleep 5"])
                .timeout(Duration::from_millis(300)),
        ),
        Arc::new(StaticSource::new("subfinder", OutputFormat::Lines, &["www.test.com"])),
    ];
    let pipeline = Pipeline::new(sources, Arc::new(FileRepository::new(dir.path())), None);
    let domain: Domain = "test.com".parse()?;

    let report = pipeline.run_domain(&domain, None).await?;

    assert_eq!(read_lines(&dir.path().join("test.com_slow.log"))?, vec!["deep.test.com"]);
    assert_eq!(read_lines(&report.summary_path)?, vec!["www.test.com"]);
    assert!(report.sources[0].error.is_some());
    Ok(())
}
