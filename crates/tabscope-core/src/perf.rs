//! Derives the performance profile from a single raw timeline read.
//! Pure over its input; the caller owns the timing of the read.

use crate::protocol::{
    HeapMemory, LcpDescriptor, NavigationTiming, PerformanceProfile, RawHeapMemory, RawNavigation,
    RawTimeline, ResourceAggregate,
};
use std::collections::BTreeMap;

pub fn derive_profile(raw: &RawTimeline) -> PerformanceProfile {
    // A missing navigation entry leaves the whole timing map absent
    // rather than partially populated with nonsense deltas.
    let navigation_timing = raw.navigation.as_ref().map(navigation_deltas);

    let mut paint_metrics = BTreeMap::new();
    for entry in &raw.paint {
        paint_metrics.insert(entry.name.clone(), entry.start_time.round() as i64);
    }

    // Standard CLS: sum of shifts without recent user input. Shifts the
    // user triggered are excluded outright, not down-weighted.
    let cls: f64 = raw
        .layout_shifts
        .iter()
        .filter(|shift| !shift.had_recent_input)
        .map(|shift| shift.value)
        .sum();

    // The browser appends LCP candidates as larger content renders;
    // the last entry is the final one.
    let lcp = raw.lcp.last().map(|entry| LcpDescriptor {
        time: entry.start_time.round() as i64,
        size: entry.size,
        element: entry.element.clone(),
    });

    let mut sums: BTreeMap<String, (usize, u64, f64)> = BTreeMap::new();
    for resource in &raw.resources {
        let category = resource
            .initiator_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "other".to_string());
        let entry = sums.entry(category).or_insert((0, 0, 0.0));
        entry.0 += 1;
        entry.1 += resource.transfer_size;
        entry.2 += resource.duration;
    }
    // Averages are taken only after a category is fully summed, so the
    // result does not depend on entry order.
    let resource_summary = sums
        .into_iter()
        .map(|(category, (count, total_size, total_duration))| {
            (
                category,
                ResourceAggregate {
                    count,
                    total_size,
                    total_duration: total_duration.round() as i64,
                    avg_duration: (total_duration / count as f64).round() as i64,
                },
            )
        })
        .collect();

    PerformanceProfile {
        navigation_timing,
        paint_metrics,
        lcp,
        cls: round3(cls),
        resource_summary,
        total_resources: raw.resources.len(),
        memory: raw.memory.as_ref().map(heap_in_mb),
    }
}

fn navigation_deltas(nav: &RawNavigation) -> NavigationTiming {
    NavigationTiming {
        dns_lookup: delta(nav.domain_lookup_start, nav.domain_lookup_end),
        tcp_connect: delta(nav.connect_start, nav.connect_end),
        ttfb: delta(nav.request_start, nav.response_start),
        content_download: delta(nav.response_start, nav.response_end),
        dom_interactive: delta(nav.start_time, nav.dom_interactive),
        dom_content_loaded: delta(nav.start_time, nav.dom_content_loaded_event_end),
        load_complete: delta(nav.start_time, nav.load_event_end),
        transfer_size: nav.transfer_size,
        encoded_body_size: nav.encoded_body_size,
        decoded_body_size: nav.decoded_body_size,
    }
}

fn delta(from: f64, to: f64) -> i64 {
    (to - from).round() as i64
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn heap_in_mb(raw: &RawHeapMemory) -> HeapMemory {
    HeapMemory {
        used_js_heap_size: mb(raw.used_js_heap_size),
        total_js_heap_size: mb(raw.total_js_heap_size),
        js_heap_size_limit: mb(raw.js_heap_size_limit),
        unit: "MB".to_string(),
    }
}

fn mb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}
