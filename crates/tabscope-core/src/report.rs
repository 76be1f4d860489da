//! Renders the collected captures into the markdown analysis report
//! and the indented DOM dump. Pure over its inputs and deterministic;
//! sections with no data are omitted outright, never emitted empty.

use crate::protocol::{
    ConsoleRecord, DomNode, ElementStyleSample, PageOverview, PerformanceProfile, RequestRecord,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Everything the report can draw on. Captures that failed or were
/// disabled stay `None` and their sections disappear.
pub struct ReportInput<'a> {
    pub generated_at: DateTime<Utc>,
    pub overview: Option<&'a PageOverview>,
    pub element_styles: &'a BTreeMap<String, Vec<ElementStyleSample>>,
    pub network: Option<&'a [RequestRecord]>,
    pub console: Option<&'a [ConsoleRecord]>,
    pub performance: Option<&'a PerformanceProfile>,
}

pub fn style_report(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    out.push_str("# Page Analysis Report\n\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        input.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(overview) = input.overview {
        viewport_section(&mut out, overview);
    }
    if let Some(perf) = input.performance {
        performance_section(&mut out, perf);
    }
    if let Some(overview) = input.overview {
        palette_sections(&mut out, overview);
    }
    if !input.element_styles.is_empty() {
        element_styles_section(&mut out, input.element_styles);
    }
    if let Some(network) = input.network {
        if !network.is_empty() {
            network_section(&mut out, network);
        }
    }
    if let Some(console) = input.console {
        console_section(&mut out, console);
    }

    out
}

fn viewport_section(out: &mut String, overview: &PageOverview) {
    out.push_str("## Viewport\n\n");
    out.push_str(&format!("- Width: {}px\n", overview.viewport.width));
    out.push_str(&format!("- Height: {}px\n", overview.viewport.height));
    out.push_str(&format!(
        "- Scroll height: {}px\n\n",
        overview.viewport.scroll_height
    ));
}

fn performance_section(out: &mut String, perf: &PerformanceProfile) {
    out.push_str("## Performance\n\n");

    if let Some(nav) = &perf.navigation_timing {
        out.push_str("| Metric | Value |\n|--------|-------|\n");
        out.push_str(&format!("| TTFB | {}ms |\n", nav.ttfb));
        if let Some(fp) = perf.paint_metrics.get("first-paint") {
            out.push_str(&format!("| First Paint | {}ms |\n", fp));
        }
        if let Some(fcp) = perf.paint_metrics.get("first-contentful-paint") {
            out.push_str(&format!("| First Contentful Paint | {}ms |\n", fcp));
        }
        if let Some(lcp) = &perf.lcp {
            out.push_str(&format!("| Largest Contentful Paint | {}ms |\n", lcp.time));
        }
        out.push_str(&format!("| Cumulative Layout Shift | {} |\n", perf.cls));
        out.push_str(&format!("| DOM Interactive | {}ms |\n", nav.dom_interactive));
        out.push_str(&format!("| Load Complete | {}ms |\n", nav.load_complete));
        out.push('\n');
    }

    if let Some(memory) = &perf.memory {
        out.push_str("### Memory\n\n");
        out.push_str(&format!("- JS heap used: {} MB\n", memory.used_js_heap_size));
        out.push_str(&format!(
            "- JS heap total: {} MB\n\n",
            memory.total_js_heap_size
        ));
    }

    if !perf.resource_summary.is_empty() {
        out.push_str("### Resources\n\n");
        out.push_str("| Type | Count | Total size | Avg duration |\n");
        out.push_str("|------|-------|------------|--------------|\n");
        for (category, agg) in &perf.resource_summary {
            out.push_str(&format!(
                "| {} | {} | {} KB | {}ms |\n",
                category,
                agg.count,
                agg.total_size / 1024,
                agg.avg_duration
            ));
        }
        out.push('\n');
    }
}

fn palette_sections(out: &mut String, overview: &PageOverview) {
    if !overview.used_colors.is_empty() {
        out.push_str("## Colors\n\n");
        for (i, color) in overview.used_colors.iter().enumerate() {
            out.push_str(&format!("{}. `{}`\n", i + 1, color));
        }
        out.push('\n');
    }

    if !overview.used_fonts.is_empty() {
        out.push_str("## Fonts\n\n");
        for (i, font) in overview.used_fonts.iter().enumerate() {
            out.push_str(&format!("{}. `{}`\n", i + 1, font));
        }
        out.push('\n');
    }

    out.push_str("## Body Base Styles\n\n");
    out.push_str(&format!(
        "- Background: `{}`\n",
        overview.body_styles.background_color
    ));
    out.push_str(&format!("- Text color: `{}`\n", overview.body_styles.color));
    out.push_str(&format!(
        "- Font family: `{}`\n",
        overview.body_styles.font_family
    ));
    out.push_str(&format!(
        "- Font size: `{}`\n\n",
        overview.body_styles.font_size
    ));
}

fn element_styles_section(
    out: &mut String,
    element_styles: &BTreeMap<String, Vec<ElementStyleSample>>,
) {
    out.push_str("## Element Styles\n\n");
    for (selector, samples) in element_styles {
        out.push_str(&format!("### Selector: `{}`\n", selector));
        for sample in samples {
            out.push_str(&format!(
                "\n**Element {}** ({})\n",
                sample.index + 1,
                sample.tag_name
            ));
            if let Some(text) = &sample.text {
                out.push_str(&format!("- Text: \"{}\"\n", clip(text, 30)));
            }
            out.push_str(&format!(
                "- Position: ({}, {})\n",
                sample.position.x, sample.position.y
            ));
            out.push_str(&format!(
                "- Size: {} x {}px\n",
                sample.position.width, sample.position.height
            ));
            out.push_str(&format!(
                "- Background: `{}`\n",
                sample.styles.background_color
            ));
            out.push_str(&format!("- Text color: `{}`\n", sample.styles.color));
            out.push_str(&format!("- Font size: `{}`\n", sample.styles.font_size));
            out.push_str(&format!(
                "- Border radius: `{}`\n",
                sample.styles.border_radius
            ));
            if sample.styles.box_shadow != "none" {
                out.push_str(&format!("- Shadow: `{}`\n", sample.styles.box_shadow));
            }
        }
        out.push('\n');
    }
}

fn network_section(out: &mut String, records: &[RequestRecord]) {
    out.push_str("## Network Summary\n\n");
    out.push_str(&format!("{} request(s) captured\n\n", records.len()));

    let mut by_type: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        let category = record
            .resource_type
            .clone()
            .unwrap_or_else(|| "other".to_string());
        let entry = by_type.entry(category).or_insert((0, 0));
        entry.0 += 1;
        if record.failed {
            entry.1 += 1;
        }
    }

    out.push_str("| Type | Count | Failed |\n|------|-------|--------|\n");
    for (category, (count, failed)) in &by_type {
        out.push_str(&format!("| {} | {} | {} |\n", category, count, failed));
    }
    out.push('\n');

    let failed: Vec<&RequestRecord> = records.iter().filter(|r| r.failed).collect();
    if !failed.is_empty() {
        out.push_str("### Failed Requests\n\n");
        for record in failed {
            out.push_str(&format!(
                "- `{} {}`: {}\n",
                record.method,
                clip(&record.url, 80),
                record.failure_text.as_deref().unwrap_or("unknown error")
            ));
        }
        out.push('\n');
    }
}

fn console_section(out: &mut String, records: &[ConsoleRecord]) {
    let errors: Vec<&ConsoleRecord> = records.iter().filter(|r| r.level == "error").collect();
    let warnings = records.iter().filter(|r| r.level == "warning").count();

    if errors.is_empty() && warnings == 0 {
        return;
    }

    out.push_str("## Console Issues\n\n");
    out.push_str(&format!("- Errors: {}\n", errors.len()));
    out.push_str(&format!("- Warnings: {}\n\n", warnings));

    if !errors.is_empty() {
        out.push_str("### Errors\n\n");
        for error in errors.iter().take(10) {
            out.push_str(&format!("- `{}`\n", clip(&error.text, 200)));
        }
        out.push('\n');
    }
}

/// Textual DOM dump: one indented pseudo-tag per node with its size
/// and base colors.
pub fn dom_tree_text(node: &DomNode) -> String {
    let mut out = String::new();
    format_node(&mut out, node, 0);
    out
}

fn format_node(out: &mut String, node: &DomNode, indent: usize) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!("{}<{}", pad, node.tag));
    if let Some(id) = &node.id {
        out.push_str(&format!(" id=\"{}\"", id));
    }
    if let Some(class) = &node.class {
        out.push_str(&format!(" class=\"{}\"", clip(class, 50)));
    }
    out.push_str(&format!(" [{}x{}]", node.rect.w, node.rect.h));
    out.push_str(&format!(" bg:{} color:{}", node.style.bg, node.style.color));

    if let Some(text) = &node.text {
        out.push_str(&format!(">{}</{}>", text, node.tag));
    } else if !node.children.is_empty() {
        out.push_str(">\n");
        for child in &node.children {
            format_node(out, child, indent + 1);
        }
        out.push_str(&format!("{}</{}>", pad, node.tag));
    } else {
        out.push_str(" />");
    }
    out.push('\n');
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
