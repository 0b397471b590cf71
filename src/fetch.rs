//! Page transport: the `Fetcher` seam, its HTTP implementation and the retry policy.

use crate::error::TransportError;
use reqwest::blocking::Client;
use std::cell::RefCell;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("noc-scrape/", env!("CARGO_PKG_VERSION"));

/// Anything that can turn a URL into page text.
pub trait Fetcher {
    /// Fetches `url` and returns its body.
    fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Blocking HTTP fetcher. No cookies, caching or auth headers.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a client with the crate user agent, a redirect cap and a request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let request_error = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(request_error)
    }
}

/// How often, and after what pause, a failed fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: usize,
    cooldown: Duration,
}

impl RetryPolicy {
    /// `attempts` counts the first try; values below one are raised to one.
    pub fn new(attempts: usize, cooldown: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            cooldown,
        }
    }

    /// Total number of tries per URL.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Pause between tries.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for RetryPolicy {
    /// One retry after a 60 second cool-down.
    fn default() -> Self {
        Self::new(2, Duration::from_secs(60))
    }
}

/// Fetches `url`, sleeping `policy.cooldown()` between failed tries. Returns the last error once
/// every attempt has failed.
pub fn fetch_with_retry<F>(
    fetcher: &F,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, TransportError>
where
    F: Fetcher + ?Sized,
{
    let mut attempt = 0usize;
    loop {
        match fetcher.fetch(url) {
            Ok(body) => return Ok(body),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.attempts() {
                    return Err(err);
                }
                warn!(
                    %url,
                    error = %err,
                    cooldown_secs = policy.cooldown().as_secs_f32(),
                    "fetch failed; sleeping before retry"
                );
                if !policy.cooldown().is_zero() {
                    thread::sleep(policy.cooldown());
                }
                info!(%url, attempt = attempt + 1, "retrying fetch");
            }
        }
    }
}

/// Offline fetcher serving pages from memory, e.g. saved HTML replayed in tests.
///
/// Each URL can be scripted to fail a number of times before its page is served.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
    failures: RefCell<HashMap<String, usize>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    /// Empty fetcher; every URL is unavailable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Makes the next `times` requests for `url` fail.
    pub fn failing(self, url: impl Into<String>, times: usize) -> Self {
        self.failures.borrow_mut().insert(url.into(), times);
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.requests.borrow_mut().push(url.to_string());
        if let Some(remaining) = self.failures.borrow_mut().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Unavailable {
                    url: url.to_string(),
                    message: "scripted failure".to_string(),
                });
            }
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Unavailable {
                url: url.to_string(),
                message: "no page registered".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://site.test/page";

    #[test]
    fn retries_once_then_succeeds() {
        let fetcher = MemoryFetcher::new().with_page(URL, "ok").failing(URL, 1);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let body = fetch_with_retry(&fetcher, URL, &policy).expect("second attempt succeeds");
        assert_eq!(body, "ok");
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn gives_up_after_configured_attempts() {
        let fetcher = MemoryFetcher::new().with_page(URL, "ok").failing(URL, 5);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let err = fetch_with_retry(&fetcher, URL, &policy).expect_err("both attempts fail");
        assert_eq!(err.url(), URL);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn default_policy_is_one_retry_after_a_minute() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 2);
        assert_eq!(policy.cooldown(), Duration::from_secs(60));
    }
}
