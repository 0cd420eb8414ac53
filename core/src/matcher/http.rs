//! Plain HTTP(S) fetcher backed by `reqwest`.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use subtake_common::config::{ProbeConfig, Scheme};
use subtake_common::domain::validate_hostname;

use super::{FetchError, PageFetcher};

const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = concat!("subtake/", env!("CARGO_PKG_VERSION"));

/// Issues one unauthenticated `GET /` per host.
///
/// The client keeps no cookies and accepts any certificate, since dangling hosts rarely
/// present one that matches the subdomain.
pub struct HttpFetcher {
    client: Client,
    scheme: Scheme,
    port: Option<u16>,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(cfg: &ProbeConfig) -> Result<Self, FetchError> {
        let redirect = if cfg.follow_redirects {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };

        let client = Client::builder()
            .timeout(cfg.timeout)
            .connect_timeout(cfg.timeout)
            .redirect(redirect)
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            scheme: cfg.scheme,
            port: cfg.port,
            max_body_bytes: cfg.max_body_bytes,
        })
    }

    /// Builds the probe URL. The host only ever selects the connection target.
    pub fn url_for(&self, host: &str) -> Result<Url, FetchError> {
        let invalid = || FetchError::InvalidHost(host.escape_debug().to_string());

        validate_hostname(host).map_err(|_| invalid())?;

        let authority = match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let url = Url::parse(&format!("{}://{authority}/", self.scheme.as_str()))
            .map_err(|_| invalid())?;

        // Numeric hosts such as `0x7f.1` are normalized by the URL parser.
        match url.host_str() {
            Some(parsed) if parsed.eq_ignore_ascii_case(host) => Ok(url),
            _ => Err(invalid()),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connect(err.to_string())
    } else {
        FetchError::Request(err.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_body(&self, host: &str) -> Result<String, FetchError> {
        let url = self.url_for(host)?;
        let mut response = self.client.get(url).send().await.map_err(classify)?;

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            let room = self.max_body_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_body_bytes {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
