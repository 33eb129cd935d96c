/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::errors::FlickrError;
use bytes::Bytes;
use log::debug;
use std::time::Duration;

/// Retry budget for a single logical request.
///
/// The first retry waits `starting_timeout`; every following wait doubles.
/// A wait that would exceed `max_timeout` is not taken and the last transport
/// error is surfaced instead, so the default `max_timeout` of zero disables
/// retrying entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub starting_timeout: Duration,
    pub max_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            starting_timeout: Duration::from_millis(500),
            max_timeout: Duration::ZERO,
        }
    }
}

// Transport failures worth another attempt. Anything reqwest reports outside
// these classes (a request that could not even be built, for instance) is
// fatal.
fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_status() || err.is_timeout() || err.is_connect() || err.is_request() || err.is_redirect()
}

async fn attempt(
    http: &reqwest::Client,
    url: &str,
    body: Option<&str>,
) -> Result<Bytes, reqwest::Error> {
    let req = match body {
        Some(data) => http
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(data.to_string()),
        None => http.get(url),
    };
    let resp = req.send().await?.error_for_status()?;
    resp.bytes().await
}

/// Sends an http request, retrying transient failures under `policy`.
///
/// POSTs `body` as a form-encoded payload when one is supplied, otherwise
/// issues a GET. Returns the raw response body.
pub async fn send_request(
    http: &reqwest::Client,
    url: &str,
    body: Option<&str>,
    policy: RetryPolicy,
) -> Result<Bytes, FlickrError> {
    let mut timeout = policy.starting_timeout;
    loop {
        match attempt(http, url, body).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if is_retryable(&err) => {
                if timeout > policy.max_timeout {
                    return Err(err.into());
                }
                debug!(
                    "Retrying HTTP exception: {err}\nrequest: {url}\ntimeout: {:.1} sec",
                    timeout.as_secs_f64()
                );
                tokio::time::sleep(timeout).await;
                timeout *= 2;
            }
            Err(err) => {
                debug!("Exception: {err}\nrequest: {url}");
                return Err(err.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok-body"))
            .expect(1)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let body = send_request(&http, &server.uri(), Some("a=1"), RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"ok-body"));
    }

    #[tokio::test]
    async fn zero_max_timeout_means_no_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let policy = RetryPolicy {
            starting_timeout: Duration::from_millis(10),
            max_timeout: Duration::ZERO,
        };
        let err = send_request(&http, &server.uri(), Some("a=1"), policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FlickrError::Transport(_)));
    }

    #[tokio::test]
    async fn backoff_doubles_until_budget_is_exceeded() {
        let server = MockServer::start().await;
        // Waits of 10, 20, 40, 80ms fit inside the 100ms budget; the next
        // doubling (160ms) does not, so the fifth failure is terminal.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let policy = RetryPolicy {
            starting_timeout: Duration::from_millis(10),
            max_timeout: Duration::from_millis(100),
        };
        let err = send_request(&http, &server.uri(), Some("a=1"), policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FlickrError::Transport(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .expect(1)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let policy = RetryPolicy {
            starting_timeout: Duration::from_millis(5),
            max_timeout: Duration::from_millis(50),
        };
        let body = send_request(&http, &server.uri(), None, policy).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"recovered"));
    }
}
