//! Long-running operation bookkeeping for Azure Resource Manager.
//!
//! ARM answers a mutating request in one of three ways: an
//! `Azure-AsyncOperation` status URL, a `Location` URL that keeps answering
//! 202 until done, or a resource whose `provisioningState` moves to a
//! terminal value. This module decides which one applies and how long to
//! wait between polls; the HTTP loop lives in [`super::arm`].

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Map an operation `status` or a `provisioningState`. Anything that is
    /// not terminal (Accepted, Creating, Updating, Deleting, ...) is in progress.
    pub fn parse(s: &str) -> OperationStatus {
        match s.to_ascii_lowercase().as_str() {
            "succeeded" => OperationStatus::Succeeded,
            "failed" => OperationStatus::Failed,
            "canceled" | "cancelled" => OperationStatus::Canceled,
            _ => OperationStatus::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != OperationStatus::InProgress
    }
}

/// What to poll after the initial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    AsyncOperation(String),
    Location(String),
    /// GET the resource itself and watch `properties.provisioningState`.
    Resource(String),
    Done,
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decide how to wait for the operation started by `method resource_url`.
///
/// # Arguments
/// * `status` - Status of the initial response
/// * `headers` - Headers of the initial response
/// * `provisioning_state` - `properties.provisioningState` of the initial body, if any
pub fn poll_target(
    method: &Method,
    status: StatusCode,
    headers: &HeaderMap,
    resource_url: &str,
    provisioning_state: Option<&str>,
) -> PollTarget {
    if let Some(url) = header_str(headers, "azure-asyncoperation") {
        return PollTarget::AsyncOperation(url);
    }
    if status == StatusCode::ACCEPTED {
        if let Some(url) = header_str(headers, "location") {
            return PollTarget::Location(url);
        }
    }

    let is_write = *method == Method::PUT || *method == Method::PATCH;
    if !is_write {
        return PollTarget::Done;
    }
    let still_running = provisioning_state
        .map(|s| !OperationStatus::parse(s).is_terminal())
        .unwrap_or(false);
    if still_running || status == StatusCode::ACCEPTED {
        PollTarget::Resource(resource_url.to_string())
    } else {
        PollTarget::Done
    }
}

/// `Retry-After` in seconds, or `default` when absent or unparsable.
pub fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    header_str(headers, "retry-after")
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    const URL: &str = "https://management.azure.com/subscriptions/s/resourceGroups/rg";

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_static(*v));
        }
        h
    }

    #[test]
    fn test_operation_status_parse() {
        assert_eq!(OperationStatus::parse("Succeeded"), OperationStatus::Succeeded);
        assert_eq!(OperationStatus::parse("FAILED"), OperationStatus::Failed);
        assert_eq!(OperationStatus::parse("Cancelled"), OperationStatus::Canceled);
        assert_eq!(OperationStatus::parse("Updating"), OperationStatus::InProgress);
        assert!(!OperationStatus::parse("InProgress").is_terminal());
    }

    #[test]
    fn test_async_operation_header_wins() {
        let h = headers(&[
            ("azure-asyncoperation", "https://op/1"),
            ("location", "https://loc/1"),
        ]);
        assert_eq!(
            poll_target(&Method::PUT, StatusCode::CREATED, &h, URL, Some("Creating")),
            PollTarget::AsyncOperation("https://op/1".to_string())
        );
    }

    #[test]
    fn test_location_only_on_accepted() {
        let h = headers(&[("location", "https://loc/1")]);
        assert_eq!(
            poll_target(&Method::DELETE, StatusCode::ACCEPTED, &h, URL, None),
            PollTarget::Location("https://loc/1".to_string())
        );
        assert_eq!(
            poll_target(&Method::DELETE, StatusCode::OK, &h, URL, None),
            PollTarget::Done
        );
    }

    #[test]
    fn test_put_with_running_provisioning_state_polls_resource() {
        let h = HeaderMap::new();
        assert_eq!(
            poll_target(&Method::PUT, StatusCode::CREATED, &h, URL, Some("Creating")),
            PollTarget::Resource(URL.to_string())
        );
        assert_eq!(
            poll_target(&Method::PUT, StatusCode::OK, &h, URL, Some("Succeeded")),
            PollTarget::Done
        );
        assert_eq!(
            poll_target(&Method::PATCH, StatusCode::ACCEPTED, &h, URL, None),
            PollTarget::Resource(URL.to_string())
        );
    }

    #[test]
    fn test_post_without_headers_is_done() {
        assert_eq!(
            poll_target(&Method::POST, StatusCode::ACCEPTED, &HeaderMap::new(), URL, None),
            PollTarget::Done
        );
    }

    #[test]
    fn test_retry_after() {
        let default = Duration::from_millis(250);
        assert_eq!(
            retry_after(&headers(&[("retry-after", "7")]), default),
            Duration::from_secs(7)
        );
        assert_eq!(retry_after(&headers(&[("retry-after", "soon")]), default), default);
        assert_eq!(retry_after(&HeaderMap::new(), default), default);
    }
}
