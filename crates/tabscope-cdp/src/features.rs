//! Page-level captures outside the probe: screenshots and the
//! accessibility tree. A failure here degrades its artifact only.

use chromiumoxide::cdp::browser_protocol::accessibility::{self, GetFullAxTreeParams};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tabscope_core::error::ScopeError;

pub async fn viewport_screenshot(page: &Page) -> Result<Vec<u8>, ScopeError> {
    page.screenshot(
        ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build(),
    )
    .await
    .map_err(|e| ScopeError::capture("viewport screenshot", e))
}

pub async fn full_page_screenshot(page: &Page) -> Result<Vec<u8>, ScopeError> {
    page.screenshot(
        ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build(),
    )
    .await
    .map_err(|e| ScopeError::capture("full-page screenshot", e))
}

/// Full accessibility tree as raw JSON nodes.
pub async fn accessibility_snapshot(page: &Page) -> Result<serde_json::Value, ScopeError> {
    page.execute(accessibility::EnableParams::default())
        .await
        .map_err(|e| ScopeError::capture("accessibility snapshot", e))?;

    let tree = page
        .execute(GetFullAxTreeParams::default())
        .await
        .map_err(|e| ScopeError::capture("accessibility snapshot", e))?;

    serde_json::to_value(&tree.nodes).map_err(ScopeError::from)
}
