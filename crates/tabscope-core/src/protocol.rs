//! Record schemas shared between the in-page probe, the capture tasks
//! and the output artifacts. Wire shapes are camelCase to match the
//! browser's own naming; every extractor deserializes straight into
//! these types so nothing downstream touches dynamically-shaped data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn is_false(v: &bool) -> bool {
    !*v
}

// ------------------------------------------------------------------
// Network and console records
// ------------------------------------------------------------------

/// One logical network request. Appended when the request is sent and
/// mutated at most once more by its terminal event: a response adds the
/// status fields, a failure sets `failed`/`failure_text`. Never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub headers: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Value>,
    /// Fine-grained timing breakdown; omitted when the browser did not
    /// provide one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_text: Option<String>,
}

impl RequestRecord {
    /// Pending until the single terminal event arrives.
    pub fn is_pending(&self) -> bool {
        self.status.is_none() && !self.failed
    }
}

/// One console message or uncaught page error, in arrival order.
/// Uncaught errors carry `level: "error"` and a stack; the schema does
/// not otherwise distinguish them from developer-emitted errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub url: String,
    pub line: i64,
    pub column: i64,
}

// ------------------------------------------------------------------
// Style and DOM snapshot
// ------------------------------------------------------------------

/// Page-wide style overview: viewport geometry, the body's base style,
/// and bounded color/font inventories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverview {
    pub viewport: Viewport,
    pub body_styles: BodyStyles,
    pub used_colors: Vec<String>,
    pub used_fonts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scroll_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyStyles {
    pub background_color: String,
    pub color: String,
    pub font_family: String,
    pub font_size: String,
}

/// One node of the depth-bounded DOM projection. Zero-area nodes are
/// pruned by the probe before this type ever sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Present only when the node's sole child is a text node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub rect: Rect,
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub bg: String,
    pub color: String,
    pub display: String,
    pub font_size: String,
}

/// One sampled element for a selector, capped at 10 per selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyleSample {
    pub index: usize,
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub position: ElementPosition,
    pub styles: ComputedStyles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementPosition {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Reduced computed-style subset captured per sampled element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyles {
    pub color: String,
    pub background_color: String,
    pub border_color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub text_align: String,
    pub display: String,
    pub position: String,
    pub flex_direction: String,
    pub justify_content: String,
    pub align_items: String,
    pub padding: String,
    pub margin: String,
    pub gap: String,
    pub border_radius: String,
    pub border_width: String,
    pub border_style: String,
    pub box_shadow: String,
    pub opacity: String,
    pub overflow: String,
    pub cursor: String,
}

// ------------------------------------------------------------------
// Performance timeline
// ------------------------------------------------------------------

/// Raw performance timeline as read in-page, before derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<RawNavigation>,
    #[serde(default)]
    pub paint: Vec<RawPaintEntry>,
    #[serde(default)]
    pub layout_shifts: Vec<RawLayoutShift>,
    #[serde(default)]
    pub lcp: Vec<RawLcpEntry>,
    #[serde(default)]
    pub resources: Vec<RawResourceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<RawHeapMemory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNavigation {
    pub start_time: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_end: f64,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
    pub decoded_body_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaintEntry {
    pub name: String,
    pub start_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLayoutShift {
    pub value: f64,
    pub had_recent_input: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLcpEntry {
    pub start_time: f64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResourceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_type: Option<String>,
    #[serde(default)]
    pub transfer_size: u64,
    #[serde(default)]
    pub duration: f64,
}

/// Heap sizes in bytes; Chrome-only, absent elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHeapMemory {
    pub used_js_heap_size: u64,
    pub total_js_heap_size: u64,
    pub js_heap_size_limit: u64,
}

/// Derived performance profile, one per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceProfile {
    /// Absent entirely when the timeline had no navigation entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_timing: Option<NavigationTiming>,
    pub paint_metrics: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcp: Option<LcpDescriptor>,
    pub cls: f64,
    pub resource_summary: BTreeMap<String, ResourceAggregate>,
    pub total_resources: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<HeapMemory>,
}

/// Deltas between navigation timeline marks, in whole milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTiming {
    pub dns_lookup: i64,
    pub tcp_connect: i64,
    pub ttfb: i64,
    pub content_download: i64,
    pub dom_interactive: i64,
    pub dom_content_loaded: i64,
    pub load_complete: i64,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
    pub decoded_body_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LcpDescriptor {
    pub time: i64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAggregate {
    pub count: usize,
    pub total_size: u64,
    pub total_duration: i64,
    pub avg_duration: i64,
}

/// Heap snapshot converted to megabytes, rounded to 2 decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapMemory {
    pub used_js_heap_size: f64,
    pub total_js_heap_size: f64,
    pub js_heap_size_limit: f64,
    pub unit: String,
}

// ------------------------------------------------------------------
// Output bundle
// ------------------------------------------------------------------

/// The machine-readable bundle written as `page-data.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDataBundle {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<PageOverview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_tree: Option<DomNode>,
    pub element_styles: BTreeMap<String, Vec<ElementStyleSample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<PerformanceProfile>,
}
