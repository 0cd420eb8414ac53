//! # Takeover Signature Matcher
//!
//! Fetches the landing page of a subdomain and looks for the fingerprint of an
//! unclaimed resource on a hosting platform.
//!
//! The check is a substring heuristic over the response body. Failing requests are not
//! evidence of anything: timeouts, refused connections and DNS or TLS errors all end in
//! a clean [`Verdict`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use subtake_common::domain::is_valid_hostname;
use subtake_common::signatures::SignatureTable;
use subtake_common::takeover::{TakeoverFinding, Verdict};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

mod http;

pub use http::HttpFetcher;

/// Callback receiving `(checked, total)` after each probe.
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{0}' is not a valid hostname")]
    InvalidHost(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Retrieves the landing page body of a host.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_body(&self, host: &str) -> Result<String, FetchError>;
}

pub struct TakeoverMatcher {
    fetcher: Arc<dyn PageFetcher>,
    signatures: Arc<SignatureTable>,
}

impl TakeoverMatcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, signatures: Arc<SignatureTable>) -> Self {
        Self {
            fetcher,
            signatures,
        }
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    /// Probes one subdomain.
    ///
    /// Hostnames come from automated discovery and are untrusted; anything that is not a
    /// plain DNS name is never requested.
    pub async fn check(&self, subdomain: &str) -> Verdict {
        if !is_valid_hostname(subdomain) {
            debug!("not probing malformed hostname {:?}", subdomain);
            return Verdict::clean();
        }

        match self.fetcher.fetch_body(subdomain).await {
            Ok(body) => match self.signatures.find_match(&body) {
                Some(sig) => {
                    debug!(subdomain, platform = %sig.platform, "fingerprint matched");
                    Verdict::flagged(sig.platform.clone())
                }
                None => Verdict::clean(),
            },
            Err(e) => {
                debug!(subdomain, "probe failed: {e}");
                Verdict::clean()
            }
        }
    }

    /// Probes every subdomain with at most `workers` requests in flight.
    ///
    /// Stops early once `cancel` fires and returns the findings collected so far, sorted
    /// by subdomain.
    pub async fn scan(
        &self,
        subdomains: &[String],
        workers: usize,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn<'_>>,
    ) -> Vec<TakeoverFinding> {
        let total = subdomains.len();
        let mut checks = stream::iter(subdomains)
            .map(|subdomain| async move { (subdomain, self.check(subdomain).await) })
            .buffer_unordered(workers.max(1));

        let mut findings = Vec::new();
        let mut checked = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("takeover scan interrupted after {checked}/{total} subdomains");
                    break;
                }
                next = checks.next() => {
                    let Some((subdomain, verdict)) = next else {
                        break;
                    };
                    checked += 1;
                    if let Some(report) = progress {
                        report(checked, total);
                    }
                    if let (true, Some(platform)) = (verdict.is_vulnerable, verdict.platform) {
                        findings.push(TakeoverFinding {
                            subdomain: subdomain.clone(),
                            platform,
                        });
                    }
                }
            }
        }

        findings.sort();
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use subtake_common::signatures::TakeoverSignature;

    enum Reply {
        Body(&'static str),
        Timeout,
        Hang,
    }

    #[derive(Default)]
    struct StubFetcher {
        replies: HashMap<&'static str, Reply>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn with(mut self, host: &'static str, reply: Reply) -> Self {
            self.replies.insert(host, reply);
            self
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch_body(&self, host: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(host) {
                Some(Reply::Body(body)) => Ok(body.to_string()),
                Some(Reply::Timeout) => Err(FetchError::Timeout),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(FetchError::Timeout)
                }
                None => Err(FetchError::Connect("connection refused".into())),
            }
        }
    }

    fn matcher(fetcher: StubFetcher) -> (TakeoverMatcher, Arc<StubFetcher>) {
        let fetcher = Arc::new(fetcher);
        let matcher = TakeoverMatcher::new(fetcher.clone(), SignatureTable::builtin());
        (matcher, fetcher)
    }

    #[tokio::test]
    async fn bucket_fingerprint_flags_s3() {
        let (matcher, _) = matcher(StubFetcher::default().with(
            "assets.example.com",
            Reply::Body("<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>"),
        ));
        assert_eq!(matcher.check("assets.example.com").await, Verdict::flagged("S3"));
    }

    #[tokio::test]
    async fn ordinary_page_is_clean() {
        let (matcher, _) = matcher(
            StubFetcher::default().with("www.example.com", Reply::Body("<html>Welcome!</html>")),
        );
        let verdict = matcher.check("www.example.com").await;
        assert!(!verdict.is_vulnerable);
        assert_eq!(verdict.platform, None);
    }

    #[tokio::test]
    async fn network_failures_are_clean() {
        let (matcher, _) = matcher(StubFetcher::default().with("slow.example.com", Reply::Timeout));
        assert_eq!(matcher.check("slow.example.com").await, Verdict::clean());
        assert_eq!(matcher.check("refused.example.com").await, Verdict::clean());
    }

    #[tokio::test]
    async fn malformed_hostnames_are_never_fetched() {
        let (matcher, fetcher) = matcher(StubFetcher::default());
        for host in ["evil.com\r\nHost: other", "evil.com/admin", "a b.com", ""] {
            assert_eq!(matcher.check(host).await, Verdict::clean());
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn substitute_table_is_honoured() {
        let table = SignatureTable::new(vec![TakeoverSignature::new("Lab", "unclaimed")]).unwrap();
        let fetcher = StubFetcher::default()
            .with("lab.example.com", Reply::Body("this bucket is unclaimed"))
            .with("s3.example.com", Reply::Body("NoSuchBucket"));
        let matcher = TakeoverMatcher::new(Arc::new(fetcher), Arc::new(table));

        assert_eq!(matcher.check("lab.example.com").await, Verdict::flagged("Lab"));
        assert_eq!(matcher.check("s3.example.com").await, Verdict::clean());
    }

    #[tokio::test]
    async fn scan_collects_sorted_findings_and_progress() {
        let (matcher, fetcher) = matcher(
            StubFetcher::default()
                .with("z.example.com", Reply::Body("Fastly error: unknown domain: z.example.com"))
                .with("a.example.com", Reply::Body("Repository not found"))
                .with("ok.example.com", Reply::Body("hello"))
                .with("slow.example.com", Reply::Timeout),
        );
        let subdomains: Vec<String> = [
            "z.example.com",
            "ok.example.com",
            "a.example.com",
            "slow.example.com",
            "gone.example.com",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let seen = Mutex::new(Vec::new());
        let report = |checked: usize, total: usize| seen.lock().unwrap().push((checked, total));
        let findings = matcher
            .scan(&subdomains, 3, &CancellationToken::new(), Some(&report))
            .await;

        assert_eq!(
            findings,
            vec![
                TakeoverFinding { subdomain: "a.example.com".into(), platform: "Bitbucket".into() },
                TakeoverFinding { subdomain: "z.example.com".into(), platform: "Fastly".into() },
            ]
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
        assert_eq!(seen.lock().unwrap().last(), Some(&(5, 5)));
    }

    #[tokio::test]
    async fn cancelled_scan_returns_promptly() {
        let (matcher, _) = matcher(
            StubFetcher::default()
                .with("hang1.example.com", Reply::Hang)
                .with("hang2.example.com", Reply::Hang),
        );
        let subdomains = vec!["hang1.example.com".to_string(), "hang2.example.com".to_string()];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let findings = tokio::time::timeout(
            Duration::from_secs(5),
            matcher.scan(&subdomains, 2, &cancel, None),
        )
        .await
        .expect("scan ignored cancellation");
        assert!(findings.is_empty());
    }

    /// Answers every host after a short delay, recording peak concurrency.
    #[derive(Default)]
    struct SlowFetcher {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for SlowFetcher {
        async fn fetch_body(&self, _host: &str) -> Result<String, FetchError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("<html></html>".into())
        }
    }

    #[tokio::test]
    async fn scan_stays_within_worker_limit() {
        let fetcher = Arc::new(SlowFetcher::default());
        let matcher = TakeoverMatcher::new(fetcher.clone(), SignatureTable::builtin());
        let subdomains: Vec<String> = (0..12).map(|i| format!("h{i}.example.com")).collect();

        let findings = matcher
            .scan(&subdomains, 3, &CancellationToken::new(), None)
            .await;

        assert!(findings.is_empty());
        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak > 1, "probes ran one at a time");
        assert!(peak <= 3, "{peak} probes in flight");
        assert_eq!(matcher.signatures().len(), 23);
    }
}
