use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tabscope_core::error::ScopeError;
use tabscope_core::resolve::{TabSummary, TitleSource};
use tokio::task::JoinHandle;

/// Extra grace on top of the caller's settle wait before an in-flight
/// reload is abandoned.
const RELOAD_GRACE: Duration = Duration::from_secs(10);

/// The post-reload settle sleep is capped so long waits do not stall
/// the run.
const MAX_SETTLE_SLEEP: Duration = Duration::from_secs(5);

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct JsonVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Connection to an already-running browser's debugging endpoint.
///
/// Detaching only drops the websocket; the browser keeps running. This
/// client never launches or closes a browser process.
pub struct CdpClient {
    pub browser: Browser,
    endpoint: String,
    handler_task: JoinHandle<()>,
}

impl CdpClient {
    /// Discovers the websocket debugger URL via `/json/version` and
    /// attaches to it.
    pub async fn attach(host: &str, port: u16) -> Result<Self, ScopeError> {
        let endpoint = format!("{}:{}", host, port);
        let ws_url = discover_ws_url(host, port)
            .await
            .map_err(|reason| ScopeError::Connection {
                endpoint: endpoint.clone(),
                reason,
            })?;

        tracing::debug!("connecting to {}", ws_url);
        let (browser, mut handler) =
            Browser::connect(ws_url)
                .await
                .map_err(|e| ScopeError::Connection {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("browser handler ended");
        });

        Ok(Self {
            browser,
            endpoint,
            handler_task,
        })
    }

    /// Open tabs in insertion order.
    pub async fn pages(&self) -> Result<Vec<Page>, ScopeError> {
        self.browser
            .pages()
            .await
            .map_err(|e| ScopeError::Connection {
                endpoint: self.endpoint.clone(),
                reason: format!("tab listing failed: {}", e),
            })
    }

    /// Eagerly collects every tab's URL. A tab whose URL cannot be read
    /// is listed with an empty URL rather than dropped, keeping indices
    /// stable against the live tab collection.
    pub async fn tab_summaries(&self, pages: &[Page]) -> Vec<TabSummary> {
        let mut tabs = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let url = page.url().await.unwrap_or_default().unwrap_or_default();
            tabs.push(TabSummary { index, url });
        }
        tabs
    }

    /// Detaches from the browser without closing it.
    pub fn detach(self) {
        self.handler_task.abort();
    }
}

/// Lazy title access over the live page handles.
pub struct PageTitles<'a> {
    pages: &'a [Page],
}

impl<'a> PageTitles<'a> {
    pub fn new(pages: &'a [Page]) -> Self {
        Self { pages }
    }

    /// Best-effort title for the startup listing.
    pub async fn title_or_empty(&self, index: usize) -> String {
        self.title(index).await.unwrap_or_default()
    }
}

#[async_trait]
impl TitleSource for PageTitles<'_> {
    async fn title(&self, index: usize) -> Result<String, ScopeError> {
        let page = self
            .pages
            .get(index)
            .ok_or_else(|| ScopeError::TabNotFound(format!("index {} out of range", index)))?;
        let title = page
            .get_title()
            .await
            .map_err(|e| ScopeError::capture("title fetch", e))?;
        Ok(title.unwrap_or_default())
    }
}

/// Reloads the tab and waits for the page to settle. A timeout here is
/// non-fatal: the run proceeds with whatever was captured so far.
pub async fn reload_and_settle(page: &Page, network_wait: Duration) {
    let deadline = network_wait + RELOAD_GRACE;
    match tokio::time::timeout(deadline, page.reload()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!("reload failed, continuing with current state: {}", e),
        Err(_) => tracing::warn!("reload did not finish within {:?}, continuing", deadline),
    }
    tokio::time::sleep(network_wait.min(MAX_SETTLE_SLEEP)).await;
}

async fn discover_ws_url(host: &str, port: u16) -> Result<String, String> {
    let url = format!("http://{}:{}/json/version", host, port);
    tracing::debug!("requesting version info from {}", url);

    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {}", e))?;

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.status().is_success() {
        return Err(format!("{} returned {}", url, resp.status()));
    }

    let version: JsonVersion = resp
        .json()
        .await
        .map_err(|e| format!("invalid /json/version response: {}", e))?;

    Ok(version.web_socket_debugger_url)
}
