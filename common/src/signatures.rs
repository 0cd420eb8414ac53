//! # Takeover Signatures
//!
//! A signature pairs a hosting platform with a literal substring that shows up in the
//! platform's default "resource not found" page. Matching is a plain substring search:
//! a heuristic that flags candidates for review, not a proof of takeover.
//!
//! The builtin table is built once per process and shared read-only; substitute tables
//! can be loaded from JSON for tests or custom fingerprints.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature table is empty")]
    Empty,
    #[error("signature for '{0}' has an empty fingerprint")]
    EmptyFingerprint(String),
    #[error("failed to read signature file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed signature table: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeoverSignature {
    pub platform: String,
    pub fingerprint: String,
}

impl TakeoverSignature {
    pub fn new(platform: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("S3", "NoSuchBucket"),
    ("GitHub", "There isn\u{2019}t a GitHub Pages site here."),
    ("Heroku", "There is no app configured at that hostname."),
    ("Bitbucket", "Repository not found"),
    ("GitLab", "The page could not be found or you don't have permission to view it."),
    ("Shopify", "Sorry, this shop is currently unavailable."),
    ("Tumblr", "Whatever you were looking for doesn't currently exist at this address."),
    ("Squarespace", "This page is unavailable."),
    ("WordPress", "Do you want to register *.wordpress.com?"),
    ("CloudFront", "Bad request. We can't connect to the server for this app or website at this time."),
    ("Fastly", "Fastly error: unknown domain"),
    ("Pantheon", "The gods are wise, but do not know of the site which you seek."),
    ("Zendesk", "Help Center Closed"),
    ("Unbounce", "The requested URL was not found on this server."),
    ("Desk", "Sorry, We Couldn't Find That Page"),
    ("UserVoice", "This UserVoice subdomain is currently available!"),
    ("Surge", "project not found"),
    ("Intercom", "This page is not available"),
    ("Webflow", "The page you are looking for doesn't exist or has been moved"),
    ("Azure", "The resource you are looking for has been removed, had its name changed, or is temporarily unavailable."),
    ("DigitalOcean", "Domain is not configured"),
    ("Kinsta", "No site configured at this domain"),
    ("Ghost", "The thing you were looking for is no longer here, or never was"),
];

static BUILTIN_TABLE: OnceLock<Arc<SignatureTable>> = OnceLock::new();

/// An ordered, immutable list of signatures. Lookups scan it front to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    signatures: Vec<TakeoverSignature>,
}

impl SignatureTable {
    pub fn new(signatures: Vec<TakeoverSignature>) -> Result<Self, SignatureError> {
        if signatures.is_empty() {
            return Err(SignatureError::Empty);
        }
        // An empty needle is contained in every body.
        if let Some(sig) = signatures.iter().find(|sig| sig.fingerprint.is_empty()) {
            return Err(SignatureError::EmptyFingerprint(sig.platform.clone()));
        }
        Ok(Self { signatures })
    }

    /// The table shipped with the tool.
    pub fn builtin() -> Arc<SignatureTable> {
        BUILTIN_TABLE
            .get_or_init(|| {
                let signatures = BUILTIN
                    .iter()
                    .map(|(platform, fingerprint)| TakeoverSignature::new(*platform, *fingerprint))
                    .collect();
                Arc::new(SignatureTable { signatures })
            })
            .clone()
    }

    /// Parses a JSON array of `{ "platform": ..., "fingerprint": ... }` objects.
    pub fn from_json(json: &str) -> Result<Self, SignatureError> {
        let signatures: Vec<TakeoverSignature> = serde_json::from_str(json)?;
        Self::new(signatures)
    }

    pub fn load(path: &Path) -> Result<Self, SignatureError> {
        let json = std::fs::read_to_string(path).map_err(|source| SignatureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        tracing::debug!("loaded {} signatures from {}", table.len(), path.display());
        Ok(table)
    }

    /// Returns the first signature, in table order, whose fingerprint occurs in `body`.
    pub fn find_match(&self, body: &str) -> Option<&TakeoverSignature> {
        self.signatures
            .iter()
            .find(|sig| body.contains(sig.fingerprint.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TakeoverSignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
