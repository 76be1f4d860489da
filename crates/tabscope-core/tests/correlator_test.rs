use chrono::Utc;
use serde_json::json;
use tabscope_core::correlate::{NetworkLog, RequestFailure, RequestStart, ResponseArrival};

fn start(id: &str, url: &str) -> RequestStart {
    RequestStart {
        id: id.to_string(),
        timestamp: Utc::now(),
        method: "GET".to_string(),
        url: url.to_string(),
        resource_type: Some("fetch".to_string()),
        headers: json!({ "accept": "*/*" }),
        post_data: None,
    }
}

fn response(url: &str, status: i64) -> ResponseArrival {
    ResponseArrival {
        url: url.to_string(),
        status,
        status_text: "OK".to_string(),
        headers: json!({ "content-type": "application/json" }),
        timing: None,
    }
}

#[test]
fn response_completes_the_pending_record() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/data"));
    log.on_response(ResponseArrival {
        timing: Some(json!({ "sendStart": 1.5 })),
        ..response("https://a.com/data", 200)
    });

    let record = &log.records()[0];
    assert_eq!(record.status, Some(200));
    assert_eq!(record.status_text.as_deref(), Some("OK"));
    assert!(record.timing.is_some());
    assert!(!record.failed);
    assert!(!record.is_pending());
}

#[test]
fn missing_timing_is_omitted_not_an_error() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/data"));
    log.on_response(response("https://a.com/data", 200));

    let record = &log.records()[0];
    assert_eq!(record.status, Some(200));
    assert!(record.timing.is_none());
}

#[test]
fn failure_marks_terminal_without_status() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://api.example.com/data"));
    log.on_failure(RequestFailure {
        id: "1".to_string(),
        error_text: "net::ERR_CONNECTION_RESET".to_string(),
    });

    let record = &log.records()[0];
    assert!(record.failed);
    assert_eq!(
        record.failure_text.as_deref(),
        Some("net::ERR_CONNECTION_RESET")
    );
    assert!(record.status.is_none());
    assert!(!record.is_pending());
}

#[test]
fn duplicate_urls_complete_in_request_order() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/poll"));
    log.on_request(start("2", "https://a.com/poll"));

    log.on_response(response("https://a.com/poll", 200));
    log.on_response(response("https://a.com/poll", 500));

    assert_eq!(log.records()[0].status, Some(200));
    assert_eq!(log.records()[1].status, Some(500));
}

#[test]
fn terminal_state_is_reached_at_most_once() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/data"));

    // Completed first: the late failure must not flip it.
    log.on_response(response("https://a.com/data", 204));
    log.on_failure(RequestFailure {
        id: "1".to_string(),
        error_text: "net::ERR_ABORTED".to_string(),
    });

    let record = &log.records()[0];
    assert_eq!(record.status, Some(204));
    assert!(!record.failed);
    assert!(record.failure_text.is_none());
}

#[test]
fn failed_record_ignores_a_late_response() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/data"));

    log.on_failure(RequestFailure {
        id: "1".to_string(),
        error_text: "net::ERR_CONNECTION_RESET".to_string(),
    });
    log.on_response(response("https://a.com/data", 200));

    let record = &log.records()[0];
    assert!(record.failed);
    assert!(record.status.is_none());
}

#[test]
fn failure_for_unknown_request_id_is_ignored() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/data"));
    log.on_failure(RequestFailure {
        id: "99".to_string(),
        error_text: "net::ERR_FAILED".to_string(),
    });

    assert!(log.records()[0].is_pending());
}

#[test]
fn response_without_a_matching_request_is_ignored() {
    let mut log = NetworkLog::new();
    log.on_response(response("https://a.com/uninvited", 200));
    assert!(log.is_empty());
}

#[test]
fn records_keep_arrival_order() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/first"));
    log.on_request(start("2", "https://a.com/second"));
    log.on_request(start("3", "https://a.com/third"));

    let urls: Vec<&str> = log.records().iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://a.com/first",
            "https://a.com/second",
            "https://a.com/third"
        ]
    );
}

#[test]
fn pending_and_terminal_records_serialize_cleanly() {
    let mut log = NetworkLog::new();
    log.on_request(start("1", "https://a.com/pending"));
    log.on_request(start("2", "https://a.com/failed"));
    log.on_failure(RequestFailure {
        id: "2".to_string(),
        error_text: "net::ERR_CONNECTION_RESET".to_string(),
    });

    let json = serde_json::to_value(log.records()).unwrap();

    let pending = &json[0];
    assert!(pending.get("status").is_none());
    assert!(pending.get("failed").is_none());

    let failed = &json[1];
    assert_eq!(failed["failed"], true);
    assert_eq!(failed["failureText"], "net::ERR_CONNECTION_RESET");
    assert!(failed.get("status").is_none());
}
