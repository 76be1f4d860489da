//! One capture run: resolve the target tab, install event capture,
//! reload, snapshot, sample, and write every artifact the run managed
//! to produce. Only connection and tab-resolution failures abort; any
//! other failure degrades its own artifact and the run continues.

use chrono::Utc;
use std::path::Path;
use tabscope_cdp::cdp::{self, CdpClient, PageTitles};
use tabscope_cdp::events::{ConsoleCapture, NetworkCapture};
use tabscope_cdp::{extract, features};
use tabscope_core::config::ScopeConfig;
use tabscope_core::error::ScopeError;
use tabscope_core::perf::derive_profile;
use tabscope_core::protocol::{ConsoleRecord, PageDataBundle, PerformanceProfile, RequestRecord};
use tabscope_core::report::{dom_tree_text, style_report, ReportInput};
use tabscope_core::resolve::resolve_tab;

const VIEWPORT_SHOT: &str = "screenshot.png";
const FULL_PAGE_SHOT: &str = "screenshot-full.png";
const STYLE_REPORT: &str = "style-report.md";
const DOM_TREE: &str = "dom-tree.txt";
const PAGE_DATA: &str = "page-data.json";
const ACCESSIBILITY_SNAPSHOT: &str = "accessibility-snapshot.json";
const NETWORK_LOG: &str = "network-requests.json";
const CONSOLE_LOG: &str = "console-logs.json";
const PERFORMANCE_METRICS: &str = "performance-metrics.json";

pub async fn run(config: &ScopeConfig) -> Result<(), ScopeError> {
    tokio::fs::create_dir_all(&config.output_dir).await?;
    println!("Output directory: {}", config.output_dir.display());

    println!("Connecting to {} ...", config.endpoint());
    let client = CdpClient::attach(&config.host, config.port).await?;

    let pages = client.pages().await?;
    if pages.is_empty() {
        client.detach();
        return Err(ScopeError::TabNotFound("no open tabs".to_string()));
    }

    let tabs = client.tab_summaries(&pages).await;
    let titles = PageTitles::new(&pages);

    println!("Connected. {} tab(s) open:", tabs.len());
    for tab in &tabs {
        let title = titles.title_or_empty(tab.index).await;
        if title.is_empty() {
            println!("  [{}] {}", tab.index, clip(&tab.url, 60));
        } else {
            println!(
                "  [{}] {}  ({})",
                tab.index,
                clip(&tab.url, 60),
                clip(&title, 30)
            );
        }
    }

    let matched = match resolve_tab(&tabs, &config.target, &titles).await {
        Ok(matched) => matched,
        Err(e) => {
            client.detach();
            return Err(e);
        }
    };
    if !matched.ambiguous.is_empty() {
        println!("Keyword matched {} tabs:", matched.ambiguous.len());
        for tab in &matched.ambiguous {
            println!("  [{}] {}", tab.index, clip(&tab.url, 80));
        }
        println!("Using the first match [{}]", matched.index);
    }

    let page = &pages[matched.index];
    let page_url = tabs[matched.index].url.clone();
    println!("Target tab [{}]: {}", matched.index, page_url);

    // Event capture goes live before the reload below, or the request
    // cycle it is meant to observe would be missed.
    let network = if config.capture_network {
        match NetworkCapture::install(page).await {
            Ok(capture) => {
                println!("Capturing network requests...");
                Some(capture)
            }
            Err(e) => {
                warn(&e);
                None
            }
        }
    } else {
        None
    };

    let console = if config.capture_console {
        match ConsoleCapture::install(page).await {
            Ok(capture) => {
                println!("Capturing console logs...");
                Some(capture)
            }
            Err(e) => {
                warn(&e);
                None
            }
        }
    } else {
        None
    };

    if config.capture_network {
        println!(
            "Reloading to observe a full request cycle (settling up to {}s)...",
            config.network_wait.as_secs()
        );
        cdp::reload_and_settle(page, config.network_wait).await;
    }

    println!("Capturing screenshots...");
    write_bytes(
        &config.output_dir,
        VIEWPORT_SHOT,
        features::viewport_screenshot(page).await,
    )
    .await;
    write_bytes(
        &config.output_dir,
        FULL_PAGE_SHOT,
        features::full_page_screenshot(page).await,
    )
    .await;

    println!("Scanning page styles...");
    let overview = match extract::overview(page).await {
        Ok(overview) => {
            println!(
                "  viewport {}x{}, {} color(s), {} font(s)",
                overview.viewport.width,
                overview.viewport.height,
                overview.used_colors.len(),
                overview.used_fonts.len()
            );
            Some(overview)
        }
        Err(e) => {
            warn(&e);
            None
        }
    };

    println!("Snapshotting DOM (depth {})...", config.max_depth);
    let dom_tree = match extract::dom_tree(page, config.max_depth).await {
        Ok(tree) => tree,
        Err(e) => {
            warn(&e);
            None
        }
    };

    println!("Sampling element styles...");
    let selectors = config.effective_selectors();
    let element_styles = extract::element_styles(page, &selectors).await;
    for (selector, samples) in &element_styles {
        println!("  {}: {} element(s)", selector, samples.len());
    }

    let performance = if config.capture_performance {
        println!("Sampling performance timeline...");
        match extract::raw_timeline(page).await {
            Ok(raw) => {
                let profile = derive_profile(&raw);
                print_perf_highlights(&profile);
                Some(profile)
            }
            Err(e) => {
                warn(&e);
                None
            }
        }
    } else {
        None
    };

    // Nothing below drives the page, so the event sequences are stable
    // from here on.
    let network_records: Option<Vec<RequestRecord>> = network.map(|capture| capture.finish());
    let console_records: Option<Vec<ConsoleRecord>> = console.map(|capture| capture.finish());

    println!("Writing artifacts...");
    let generated_at = Utc::now();

    let report = style_report(&ReportInput {
        generated_at,
        overview: overview.as_ref(),
        element_styles: &element_styles,
        network: network_records.as_deref(),
        console: console_records.as_deref(),
        performance: performance.as_ref(),
    });
    write_text(&config.output_dir, STYLE_REPORT, &report).await?;

    if let Some(tree) = &dom_tree {
        write_text(&config.output_dir, DOM_TREE, &dom_tree_text(tree)).await?;
    }

    let bundle = PageDataBundle {
        url: page_url,
        timestamp: generated_at,
        overview,
        dom_tree,
        element_styles,
        performance_metrics: performance.clone(),
    };
    write_json(&config.output_dir, PAGE_DATA, &bundle).await?;

    println!("Capturing accessibility tree...");
    match features::accessibility_snapshot(page).await {
        Ok(snapshot) => write_json(&config.output_dir, ACCESSIBILITY_SNAPSHOT, &snapshot).await?,
        Err(e) => warn(&e),
    }

    if let Some(records) = &network_records {
        if !records.is_empty() {
            write_json(&config.output_dir, NETWORK_LOG, records).await?;
        }
    }
    if let Some(records) = &console_records {
        if !records.is_empty() {
            write_json(&config.output_dir, CONSOLE_LOG, records).await?;
        }
    }
    if let Some(profile) = &performance {
        write_json(&config.output_dir, PERFORMANCE_METRICS, profile).await?;
    }

    print_summary(config, &network_records, &console_records, performance.is_some());

    client.detach();
    Ok(())
}

fn warn(e: &ScopeError) {
    println!("  warning: {}", e);
    tracing::warn!("{}", e);
}

async fn write_bytes(dir: &Path, name: &str, result: Result<Vec<u8>, ScopeError>) {
    match result {
        Ok(bytes) => match tokio::fs::write(dir.join(name), bytes).await {
            Ok(()) => println!("  {}", name),
            Err(e) => warn(&ScopeError::from(e)),
        },
        Err(e) => warn(&e),
    }
}

async fn write_text(dir: &Path, name: &str, content: &str) -> Result<(), ScopeError> {
    tokio::fs::write(dir.join(name), content).await?;
    println!("  {}", name);
    Ok(())
}

async fn write_json<T: serde::Serialize>(
    dir: &Path,
    name: &str,
    value: &T,
) -> Result<(), ScopeError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(dir.join(name), json).await?;
    println!("  {}", name);
    Ok(())
}

fn print_perf_highlights(profile: &PerformanceProfile) {
    if let Some(nav) = &profile.navigation_timing {
        println!("  TTFB: {}ms", nav.ttfb);
    }
    if let Some(fcp) = profile.paint_metrics.get("first-contentful-paint") {
        println!("  FCP: {}ms", fcp);
    }
    if let Some(lcp) = &profile.lcp {
        println!("  LCP: {}ms", lcp.time);
    }
    println!("  CLS: {}", profile.cls);
    if let Some(memory) = &profile.memory {
        println!("  JS heap: {} MB", memory.used_js_heap_size);
    }
    println!("  resources: {}", profile.total_resources);
}

fn print_summary(
    config: &ScopeConfig,
    network_records: &Option<Vec<RequestRecord>>,
    console_records: &Option<Vec<ConsoleRecord>>,
    have_performance: bool,
) {
    println!();
    println!("Done. Artifacts in {}:", config.output_dir.display());
    println!("  {:<28} viewport screenshot", VIEWPORT_SHOT);
    println!("  {:<28} full-page screenshot", FULL_PAGE_SHOT);
    println!("  {:<28} analysis report", STYLE_REPORT);
    println!("  {:<28} DOM structure", DOM_TREE);
    println!("  {:<28} full data bundle", PAGE_DATA);
    println!("  {:<28} accessibility tree", ACCESSIBILITY_SNAPSHOT);
    if let Some(records) = network_records {
        if !records.is_empty() {
            println!(
                "  {:<28} network requests ({})",
                NETWORK_LOG,
                records.len()
            );
        }
    }
    if let Some(records) = console_records {
        if !records.is_empty() {
            println!(
                "  {:<28} console records ({})",
                CONSOLE_LOG,
                records.len()
            );
        }
    }
    if have_performance {
        println!("  {:<28} performance profile", PERFORMANCE_METRICS);
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
