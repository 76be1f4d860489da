//! Live event capture for one tab.
//!
//! Each capture owns a single task that merges its CDP event streams
//! and applies them to the log in arrival order, so every record has
//! exactly one writer. Captures must be installed before the reload
//! they are meant to observe; traffic preceding the subscription is
//! silently missed.

use chromiumoxide::cdp::browser_protocol::network::{
    self, EventLoadingFailed, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    self, EventConsoleApiCalled, EventExceptionThrown,
};
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tabscope_core::correlate::{NetworkLog, RequestFailure, RequestStart, ResponseArrival};
use tabscope_core::error::ScopeError;
use tabscope_core::protocol::{ConsoleRecord, RequestRecord, SourceLocation};
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serialized string form of a wire enum (resource types, log levels).
fn wire_label<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(|s| s.to_string()))
}

/// Network request capture. Subscribes to the request, response and
/// failure streams of one tab and correlates them into records.
pub struct NetworkCapture {
    log: Arc<Mutex<NetworkLog>>,
    task: JoinHandle<()>,
}

impl NetworkCapture {
    pub async fn install(page: &Page) -> Result<Self, ScopeError> {
        page.execute(network::EnableParams::default())
            .await
            .map_err(|e| ScopeError::capture("network capture", e))?;

        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| ScopeError::capture("network capture", e))?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| ScopeError::capture("network capture", e))?;
        let mut failures = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|e| ScopeError::capture("network capture", e))?;

        let log = Arc::new(Mutex::new(NetworkLog::new()));
        let writer = log.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = requests.next() => {
                        lock(&writer).on_request(request_start(&event));
                    }
                    Some(event) = responses.next() => {
                        lock(&writer).on_response(response_arrival(&event));
                    }
                    Some(event) = failures.next() => {
                        lock(&writer).on_failure(request_failure(&event));
                    }
                    else => break,
                }
            }
        });

        Ok(Self { log, task })
    }

    /// Stops listening and hands back everything captured so far. Only
    /// call once the page is no longer being driven.
    pub fn finish(self) -> Vec<RequestRecord> {
        self.task.abort();
        std::mem::take(&mut *lock(&self.log)).into_records()
    }
}

fn request_start(event: &EventRequestWillBeSent) -> RequestStart {
    RequestStart {
        id: event.request_id.inner().to_string(),
        timestamp: Utc::now(),
        method: event.request.method.clone(),
        url: event.request.url.clone(),
        resource_type: event
            .r#type
            .as_ref()
            .and_then(|t| wire_label(t))
            .map(|t| t.to_ascii_lowercase()),
        headers: serde_json::to_value(&event.request.headers).unwrap_or_default(),
        post_data: event.request.post_data.clone(),
    }
}

fn response_arrival(event: &EventResponseReceived) -> ResponseArrival {
    ResponseArrival {
        url: event.response.url.clone(),
        status: event.response.status,
        status_text: event.response.status_text.clone(),
        headers: serde_json::to_value(&event.response.headers).unwrap_or_default(),
        // Timing is best-effort; the record just omits it when absent.
        timing: event
            .response
            .timing
            .as_ref()
            .and_then(|t| serde_json::to_value(t).ok()),
    }
}

fn request_failure(event: &EventLoadingFailed) -> RequestFailure {
    RequestFailure {
        id: event.request_id.inner().to_string(),
        error_text: event.error_text.clone(),
    }
}

/// Console capture. Explicit console calls and uncaught runtime errors
/// land in the same sequence, tagged by level, in arrival order.
pub struct ConsoleCapture {
    log: Arc<Mutex<Vec<ConsoleRecord>>>,
    task: JoinHandle<()>,
}

impl ConsoleCapture {
    pub async fn install(page: &Page) -> Result<Self, ScopeError> {
        page.execute(runtime::EnableParams::default())
            .await
            .map_err(|e| ScopeError::capture("console capture", e))?;

        let mut api_calls = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| ScopeError::capture("console capture", e))?;
        let mut exceptions = page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(|e| ScopeError::capture("console capture", e))?;

        let log = Arc::new(Mutex::new(Vec::new()));
        let writer = log.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = api_calls.next() => {
                        lock(&writer).push(console_record(&event));
                    }
                    Some(event) = exceptions.next() => {
                        lock(&writer).push(exception_record(&event));
                    }
                    else => break,
                }
            }
        });

        Ok(Self { log, task })
    }

    pub fn finish(self) -> Vec<ConsoleRecord> {
        self.task.abort();
        std::mem::take(&mut *lock(&self.log))
    }
}

fn console_record(event: &EventConsoleApiCalled) -> ConsoleRecord {
    let text = event
        .args
        .iter()
        .map(|arg| {
            if let Some(description) = &arg.description {
                description.clone()
            } else if let Some(value) = &arg.value {
                value.to_string()
            } else {
                "undefined".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let location = event.stack_trace.as_ref().and_then(|stack| {
        stack.call_frames.first().map(|frame| SourceLocation {
            url: frame.url.clone(),
            line: frame.line_number,
            column: frame.column_number,
        })
    });

    ConsoleRecord {
        timestamp: Utc::now(),
        level: wire_label(&event.r#type).unwrap_or_else(|| "log".to_string()),
        text,
        location,
        stack: None,
    }
}

/// Uncaught page errors share the console record schema, tagged as
/// errors.
fn exception_record(event: &EventExceptionThrown) -> ConsoleRecord {
    let details = &event.exception_details;
    let description = details
        .exception
        .as_ref()
        .and_then(|e| e.description.clone());

    // The description's first line is the message; the full text keeps
    // the stack frames.
    let text = match &description {
        Some(d) => d.lines().next().unwrap_or(&details.text).to_string(),
        None => details.text.clone(),
    };

    let location = details.url.as_ref().map(|url| SourceLocation {
        url: url.clone(),
        line: details.line_number,
        column: details.column_number,
    });

    ConsoleRecord {
        timestamp: Utc::now(),
        level: "error".to_string(),
        text,
        location,
        stack: description,
    }
}
