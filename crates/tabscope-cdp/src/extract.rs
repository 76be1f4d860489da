//! Typed in-page queries. Each query injects the probe if needed and
//! deserializes the result straight into its schema, so callers never
//! depend on dynamically-discovered fields.

use chromiumoxide::Page;
use std::collections::BTreeMap;
use std::time::Duration;
use tabscope_core::error::ScopeError;
use tabscope_core::protocol::{DomNode, ElementStyleSample, PageOverview, RawTimeline};
use tabscope_probe::PROBE_JS;

/// Evaluation timeout; keeps a dialog-blocked page from hanging a run.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries for evaluations racing a navigating execution context.
const MAX_CONTEXT_RETRIES: u32 = 5;
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Injects the probe unless the page already has it.
async fn ensure_probe(page: &Page) -> Result<(), ScopeError> {
    let is_loaded: bool = page
        .evaluate("typeof window.TabProbe !== 'undefined'")
        .await
        .map_err(|e| ScopeError::capture("probe injection", e))?
        .into_value()
        .map_err(|e| ScopeError::capture("probe injection", e))?;

    if !is_loaded {
        page.evaluate(PROBE_JS)
            .await
            .map_err(|e| ScopeError::capture("probe injection", e))?;
    }
    Ok(())
}

async fn query<T: serde::de::DeserializeOwned>(
    page: &Page,
    step: &'static str,
    expression: &str,
) -> Result<T, ScopeError> {
    let mut last_error = String::new();

    for _attempt in 0..MAX_CONTEXT_RETRIES {
        if let Err(e) = ensure_probe(page).await {
            let err = e.to_string();
            if is_context_error(&err) {
                last_error = err;
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                continue;
            }
            return Err(e);
        }

        match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await {
            Ok(Ok(result)) => {
                return result
                    .into_value()
                    .map_err(|e| ScopeError::capture(step, e));
            }
            Ok(Err(e)) => {
                let err = e.to_string();
                if is_context_error(&err) {
                    tracing::debug!("{} hit a navigating context, retrying", step);
                    last_error = err;
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(ScopeError::capture(step, err));
            }
            Err(_) => {
                return Err(ScopeError::capture(
                    step,
                    "evaluation timed out, possibly blocked by a dialog",
                ));
            }
        }
    }

    Err(ScopeError::capture(step, last_error))
}

/// Page-wide style overview: viewport, body base style, bounded
/// color/font inventories.
pub async fn overview(page: &Page) -> Result<PageOverview, ScopeError> {
    query(page, "style overview", "window.TabProbe.overview()").await
}

/// Depth-bounded DOM projection. `None` when the body itself has a
/// zero-area bounding rectangle.
pub async fn dom_tree(page: &Page, max_depth: usize) -> Result<Option<DomNode>, ScopeError> {
    let expression = format!("window.TabProbe.domTree({})", max_depth);
    query(page, "DOM snapshot", &expression).await
}

/// Computed-style samples per selector, up to 10 matches each. A
/// selector that throws or matches nothing is dropped from the result
/// map; it never aborts the batch.
pub async fn element_styles(
    page: &Page,
    selectors: &[String],
) -> BTreeMap<String, Vec<ElementStyleSample>> {
    let mut styles = BTreeMap::new();

    for selector in selectors {
        let quoted = match serde_json::to_string(selector) {
            Ok(quoted) => quoted,
            Err(_) => continue,
        };
        let expression = format!("window.TabProbe.elementStyles({})", quoted);

        match query::<Vec<ElementStyleSample>>(page, "element styles", &expression).await {
            Ok(samples) if !samples.is_empty() => {
                styles.insert(selector.clone(), samples);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("selector {:?} skipped: {}", selector, e);
            }
        }
    }

    styles
}

/// One read of the performance timeline. The caller has already
/// ensured the page is settled; there is no retry or backoff here.
pub async fn raw_timeline(page: &Page) -> Result<RawTimeline, ScopeError> {
    query(page, "performance sampling", "window.TabProbe.timeline()").await
}
