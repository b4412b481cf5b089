//! Check-in client: a fixed number of independent POSTs to the coordinator
//!
//! Every attempt runs, whatever the previous one returned. Outcomes are
//! reported for logging only; none of them is an error to the caller.

use crate::common::Result;
use std::fmt;
use std::time::Duration;

/// Why an attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Could not reach the coordinator
    Connection(String),
    /// No answer within the timeout
    Timeout(String),
    /// Coordinator answered with a non-success status
    Status(u16),
    /// Any other transport failure
    Request(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Connection(e) => write!(f, "connection error: {}", e),
            AttemptFailure::Timeout(e) => write!(f, "request timed out: {}", e),
            AttemptFailure::Status(code) => write!(f, "HTTP error: status {}", code),
            AttemptFailure::Request(e) => write!(f, "request failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded { status: u16 },
    Failed(AttemptFailure),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded { .. })
    }
}

/// Outcome of every attempt, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptReport {
    pub outcomes: Vec<AttemptOutcome>,
}

impl AttemptReport {
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

fn classify(err: &reqwest::Error) -> AttemptFailure {
    if err.is_timeout() {
        AttemptFailure::Timeout(err.to_string())
    } else if err.is_connect() {
        AttemptFailure::Connection(err.to_string())
    } else if let Some(status) = err.status() {
        AttemptFailure::Status(status.as_u16())
    } else {
        AttemptFailure::Request(err.to_string())
    }
}

pub struct CheckInClient {
    http: reqwest::Client,
    attempts: u32,
    retry_delay: Duration,
}

impl CheckInClient {
    pub fn new(timeout: Duration, attempts: u32, retry_delay: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hellopi-report/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            attempts,
            retry_delay,
        })
    }

    /// One POST of `text=<hostname>`.
    pub async fn send_once(&self, url: &reqwest::Url, hostname: &str) -> AttemptOutcome {
        let response = match self
            .http
            .post(url.clone())
            .form(&[("text", hostname)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Failed(classify(&e)),
        };

        let status = response.status();
        tracing::debug!("Status code: {}", status.as_u16());
        match response.text().await {
            Ok(body) => tracing::debug!("Response: {}", body),
            Err(e) => tracing::debug!("Could not read response body: {}", e),
        }

        if status.is_success() {
            AttemptOutcome::Succeeded {
                status: status.as_u16(),
            }
        } else {
            AttemptOutcome::Failed(AttemptFailure::Status(status.as_u16()))
        }
    }

    /// Run every attempt, pausing between them (not after the last).
    pub async fn run(&self, url: &reqwest::Url, hostname: &str) -> AttemptReport {
        let mut report = AttemptReport::default();

        for attempt in 1..=self.attempts {
            tracing::debug!("Attempt {}/{}: sending request to {}", attempt, self.attempts, url);
            let outcome = self.send_once(url, hostname).await;
            match &outcome {
                AttemptOutcome::Succeeded { status } => {
                    tracing::info!(attempt, status, "Check-in delivered to {}", url)
                }
                AttemptOutcome::Failed(failure) => {
                    tracing::error!(attempt, "Check-in to {} failed: {}", url, failure)
                }
            }
            report.outcomes.push(outcome);

            if attempt < self.attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        report
    }
}
