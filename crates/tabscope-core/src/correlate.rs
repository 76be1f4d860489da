//! Correlates independently-arriving network lifecycle notifications
//! into unified request records.
//!
//! Matching is by URL equality against the earliest still-pending
//! record with that URL. When identical URLs are in flight at the same
//! time (duplicate polling calls, say) the first pending match wins,
//! which can mis-attribute status or timing between the duplicates;
//! that ambiguity is accepted and documented rather than corrected.

use crate::protocol::RequestRecord;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Request-initiated notification, reduced to plain data.
#[derive(Debug, Clone)]
pub struct RequestStart {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub resource_type: Option<String>,
    pub headers: Value,
    pub post_data: Option<String>,
}

/// Response notification for some in-flight request.
#[derive(Debug, Clone)]
pub struct ResponseArrival {
    pub url: String,
    pub status: i64,
    pub status_text: String,
    pub headers: Value,
    pub timing: Option<Value>,
}

/// Failure notification. Carries no URL, only the request id; the log
/// resolves the id through the side map recorded at request time.
#[derive(Debug, Clone)]
pub struct RequestFailure {
    pub id: String,
    pub error_text: String,
}

/// Append-then-update store for network records.
///
/// Single-writer: exactly one capture task feeds events, in arrival
/// order, so no record is ever raced to its terminal state.
#[derive(Debug, Default)]
pub struct NetworkLog {
    records: Vec<RequestRecord>,
    url_by_id: HashMap<String, String>,
}

impl NetworkLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pending record. Append-only, never blocks.
    pub fn on_request(&mut self, start: RequestStart) {
        self.url_by_id.insert(start.id, start.url.clone());
        self.records.push(RequestRecord {
            timestamp: start.timestamp,
            method: start.method,
            url: start.url,
            resource_type: start.resource_type,
            headers: start.headers,
            post_data: start.post_data,
            status: None,
            status_text: None,
            response_headers: None,
            timing: None,
            failed: false,
            failure_text: None,
        });
    }

    /// Completes the earliest pending record with the response URL.
    /// Records already in a terminal state are never touched.
    pub fn on_response(&mut self, arrival: ResponseArrival) {
        if let Some(record) = self.first_pending_mut(&arrival.url) {
            record.status = Some(arrival.status);
            record.status_text = Some(arrival.status_text);
            record.response_headers = Some(arrival.headers);
            record.timing = arrival.timing;
        }
    }

    /// Fails the earliest pending record for the failing request's URL.
    /// A failed record carries no status fields.
    pub fn on_failure(&mut self, failure: RequestFailure) {
        let Some(url) = self.url_by_id.get(&failure.id).cloned() else {
            return;
        };
        if let Some(record) = self.first_pending_mut(&url) {
            record.failed = true;
            record.failure_text = Some(failure.error_text);
        }
    }

    fn first_pending_mut(&mut self, url: &str) -> Option<&mut RequestRecord> {
        self.records
            .iter_mut()
            .find(|r| r.url == url && r.is_pending())
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RequestRecord> {
        self.records
    }
}
