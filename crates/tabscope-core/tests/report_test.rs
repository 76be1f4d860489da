use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use tabscope_core::protocol::{
    BodyStyles, ComputedStyles, ConsoleRecord, DomNode, ElementPosition, ElementStyleSample,
    NodeStyle, PageOverview, Rect, RequestRecord, Viewport,
};
use tabscope_core::report::{dom_tree_text, style_report, ReportInput};

fn render(
    overview: Option<&PageOverview>,
    styles: &BTreeMap<String, Vec<ElementStyleSample>>,
    network: Option<&[RequestRecord]>,
    console: Option<&[ConsoleRecord]>,
) -> String {
    style_report(&ReportInput {
        generated_at: Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap(),
        overview,
        element_styles: styles,
        network,
        console,
        performance: None,
    })
}

fn overview() -> PageOverview {
    PageOverview {
        viewport: Viewport {
            width: 1280,
            height: 720,
            scroll_height: 2400,
        },
        body_styles: BodyStyles {
            background_color: "rgb(255, 255, 255)".to_string(),
            color: "rgb(33, 33, 33)".to_string(),
            font_family: "system-ui".to_string(),
            font_size: "16px".to_string(),
        },
        used_colors: vec!["rgb(33, 33, 33)".to_string()],
        used_fonts: vec!["system-ui".to_string()],
    }
}

fn request(url: &str) -> RequestRecord {
    RequestRecord {
        timestamp: Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap(),
        method: "GET".to_string(),
        url: url.to_string(),
        resource_type: Some("fetch".to_string()),
        headers: json!({}),
        post_data: None,
        status: None,
        status_text: None,
        response_headers: None,
        timing: None,
        failed: false,
        failure_text: None,
    }
}

fn console(level: &str, text: &str) -> ConsoleRecord {
    ConsoleRecord {
        timestamp: Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap(),
        level: level.to_string(),
        text: text.to_string(),
        location: None,
        stack: None,
    }
}

#[test]
fn absent_sections_are_omitted_entirely() {
    let report = render(None, &BTreeMap::new(), None, None);
    assert!(report.starts_with("# Page Analysis Report"));
    assert!(!report.contains("## Viewport"));
    assert!(!report.contains("## Performance"));
    assert!(!report.contains("## Element Styles"));
    assert!(!report.contains("## Network Summary"));
    assert!(!report.contains("## Console Issues"));
}

#[test]
fn overview_drives_viewport_and_palette_sections() {
    let overview = overview();
    let report = render(Some(&overview), &BTreeMap::new(), None, None);
    assert!(report.contains("## Viewport"));
    assert!(report.contains("- Width: 1280px"));
    assert!(report.contains("- Scroll height: 2400px"));
    assert!(report.contains("## Colors"));
    assert!(report.contains("## Fonts"));
    assert!(report.contains("## Body Base Styles"));
}

#[test]
fn empty_network_capture_emits_no_section() {
    let records: Vec<RequestRecord> = Vec::new();
    let report = render(None, &BTreeMap::new(), Some(&records), None);
    assert!(!report.contains("## Network Summary"));
}

#[test]
fn failed_requests_are_listed_with_their_reason() {
    let mut failed = request("https://api.example.com/data");
    failed.failed = true;
    failed.failure_text = Some("net::ERR_CONNECTION_RESET".to_string());
    let records = vec![request("https://a.com/app.js"), failed];

    let report = render(None, &BTreeMap::new(), Some(&records), None);
    assert!(report.contains("## Network Summary"));
    assert!(report.contains("2 request(s) captured"));
    assert!(report.contains("### Failed Requests"));
    assert!(report.contains("net::ERR_CONNECTION_RESET"));
}

#[test]
fn console_section_appears_only_with_errors_or_warnings() {
    let quiet = vec![console("log", "booted")];
    let report = render(None, &BTreeMap::new(), None, Some(&quiet));
    assert!(!report.contains("## Console Issues"));

    let noisy = vec![
        console("error", "Uncaught TypeError: x is not a function"),
        console("warning", "deprecated API"),
    ];
    let report = render(None, &BTreeMap::new(), None, Some(&noisy));
    assert!(report.contains("## Console Issues"));
    assert!(report.contains("- Errors: 1"));
    assert!(report.contains("- Warnings: 1"));
    assert!(report.contains("Uncaught TypeError"));
}

#[test]
fn element_styles_render_per_selector() {
    let mut styles = BTreeMap::new();
    styles.insert(
        "button".to_string(),
        vec![ElementStyleSample {
            index: 0,
            tag_name: "BUTTON".to_string(),
            class_name: Some("btn-primary".to_string()),
            id: None,
            text: Some("Submit".to_string()),
            position: ElementPosition {
                x: 10,
                y: 20,
                width: 120,
                height: 36,
            },
            styles: sample_styles(),
        }],
    );

    let report = render(None, &styles, None, None);
    assert!(report.contains("## Element Styles"));
    assert!(report.contains("### Selector: `button`"));
    assert!(report.contains("**Element 1** (BUTTON)"));
    assert!(report.contains("- Size: 120 x 36px"));
}

#[test]
fn dom_tree_text_indents_children() {
    let tree = DomNode {
        tag: "body".to_string(),
        id: None,
        class: None,
        text: None,
        rect: Rect {
            x: 0,
            y: 0,
            w: 1280,
            h: 2400,
        },
        style: node_style(),
        children: vec![DomNode {
            tag: "div".to_string(),
            id: Some("root".to_string()),
            class: Some("app".to_string()),
            text: Some("hello".to_string()),
            rect: Rect {
                x: 0,
                y: 0,
                w: 1280,
                h: 600,
            },
            style: node_style(),
            children: Vec::new(),
        }],
    };

    let text = dom_tree_text(&tree);
    assert!(text.contains("<body [1280x2400]"));
    assert!(text.contains("\n  <div id=\"root\" class=\"app\""));
    assert!(text.contains(">hello</div>"));
    assert!(text.contains("</body>"));
}

#[test]
fn leaf_without_text_is_self_closed() {
    let leaf = DomNode {
        tag: "img".to_string(),
        id: None,
        class: None,
        text: None,
        rect: Rect {
            x: 0,
            y: 0,
            w: 64,
            h: 64,
        },
        style: node_style(),
        children: Vec::new(),
    };
    assert!(dom_tree_text(&leaf).contains(" />"));
}

fn node_style() -> NodeStyle {
    NodeStyle {
        bg: "rgb(255, 255, 255)".to_string(),
        color: "rgb(0, 0, 0)".to_string(),
        display: "block".to_string(),
        font_size: "16px".to_string(),
    }
}

fn sample_styles() -> ComputedStyles {
    ComputedStyles {
        color: "rgb(255, 255, 255)".to_string(),
        background_color: "rgb(0, 123, 255)".to_string(),
        border_color: "rgb(0, 123, 255)".to_string(),
        font_family: "system-ui".to_string(),
        font_size: "14px".to_string(),
        font_weight: "600".to_string(),
        line_height: "20px".to_string(),
        text_align: "center".to_string(),
        display: "inline-flex".to_string(),
        position: "static".to_string(),
        flex_direction: "row".to_string(),
        justify_content: "center".to_string(),
        align_items: "center".to_string(),
        padding: "8px 16px".to_string(),
        margin: "0px".to_string(),
        gap: "normal".to_string(),
        border_radius: "6px".to_string(),
        border_width: "0px".to_string(),
        border_style: "none".to_string(),
        box_shadow: "none".to_string(),
        opacity: "1".to_string(),
        overflow: "visible".to_string(),
        cursor: "pointer".to_string(),
    }
}
