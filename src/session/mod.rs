//! Per-page orchestration: load/restore, debounced auto capture and the
//! explicit commands, all driven from one cooperative event loop.

pub mod command;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::anchor::{build_marker, closest_block, page_key, resolve, select_best, Resolution};
use crate::dom::{PageView, ScrollBehavior};
use crate::render::Renderer;
use crate::state::{SessionConfig, Settings};
use crate::store::types::{MarkerKind, PageKey};
use crate::store::{Backends, MarkerStore};

pub use command::{Command, PageEvent};

/// Where a page view is in its restore lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Rendered,
}

/// Owns one page view and everything that happens to it.
pub struct Session<V: PageView> {
    page: V,
    url: String,
    backends: Backends,
    config: SessionConfig,
    settings: Settings,
    renderer: Renderer,
    phase: Phase,
    autosave_at: Option<Instant>,
    retry_at: Option<Instant>,
}

impl<V: PageView> Session<V> {
    pub fn new(page: V, url: impl Into<String>, backends: Backends, config: SessionConfig) -> Self {
        Self {
            page,
            url: url.into(),
            backends,
            config,
            settings: Settings::default(),
            renderer: Renderer::new(),
            phase: Phase::Idle,
            autosave_at: None,
            retry_at: None,
        }
    }

    pub fn page(&self) -> &V {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut V {
        &mut self.page
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Settings as of the last operation that read them.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whether an auto capture is waiting for scrolling to settle.
    pub fn autosave_pending(&self) -> bool {
        self.autosave_at.is_some()
    }

    /// Initial restore when the page first loads.
    pub async fn start(&mut self) {
        self.load_and_render(true).await;
    }

    /// Drives the session until the event sender is dropped.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent>) {
        loop {
            let autosave_at = self.autosave_at;
            let retry_at = self.retry_at;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                _ = wait_for(autosave_at) => {
                    self.autosave_at = None;
                    self.save_marker(MarkerKind::Auto).await;
                }
                _ = wait_for(retry_at) => {
                    self.retry_at = None;
                    self.load(false, false).await;
                }
            }
        }
        debug!(url = %self.url, "session event stream closed");
    }

    pub async fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::Command(command) => self.dispatch(command).await,
            PageEvent::Scrolled { y, center } => {
                let center = match center {
                    Some(sel) => match self.page.find_by_selector(&sel) {
                        Some(node) => Some(node),
                        None => {
                            debug!(selector = %sel, "viewport center not found, using body");
                            self.page.body()
                        }
                    },
                    None => None,
                };
                self.page.user_scrolled(y, center);
                self.on_scroll().await;
            }
            PageEvent::Selected { anchor } => {
                let anchor = anchor.and_then(|sel| self.page.find_by_selector(&sel));
                self.page.set_selection(anchor);
            }
        }
    }

    pub async fn dispatch(&mut self, command: Command) {
        debug!(?command, "dispatching command");
        match command {
            Command::SaveManual => self.save_marker(MarkerKind::Manual).await,
            Command::JumpToLast => self.jump_to_last().await,
            Command::ClearMarkers => self.clear_markers().await,
            Command::NavigationChanged { url } => self.navigate(url).await,
        }
    }

    /// Restores the best stored marker for the current page.
    ///
    /// On a miss the page jumps to the stored offset and one more attempt is
    /// scheduled after [`SessionConfig::load_retry_delay`].
    pub async fn load_and_render(&mut self, scroll_into_view: bool) {
        self.load(scroll_into_view, true).await;
    }

    async fn load(&mut self, scroll_into_view: bool, allow_retry: bool) {
        self.phase = Phase::Loading;
        let Some((store, key)) = self.open_store().await else {
            self.phase = Phase::Idle;
            return;
        };

        let record = match store.load(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.phase = Phase::Idle;
                return;
            }
            Err(e) => {
                warn!(page_key = %key, "Failed to read markers: {:#}", e);
                self.phase = Phase::Idle;
                return;
            }
        };
        let Some(marker) = select_best(&record.markers) else {
            self.phase = Phase::Idle;
            return;
        };

        match resolve(marker, &self.page) {
            Resolution::Structural(node) | Resolution::Snippet(node) => {
                if self.settings.auto_scroll_on_load && scroll_into_view {
                    self.page.scroll_into_view(node, ScrollBehavior::Instant);
                }
                self.renderer.render(&mut self.page, node, marker);
                self.phase = Phase::Rendered;
                info!(page_key = %key, marker_id = %marker.id, "marker restored");
            }
            Resolution::Miss => {
                self.page
                    .scroll_to(marker.scroll_offset, ScrollBehavior::Instant);
                if allow_retry {
                    self.retry_at = Some(Instant::now() + self.config.load_retry_delay);
                } else {
                    self.phase = Phase::Idle;
                }
                debug!(
                    page_key = %key,
                    offset = marker.scroll_offset,
                    retry = allow_retry,
                    "marker unresolved, restored scroll offset"
                );
            }
        }
    }

    /// Arms (or re-arms) the auto capture if auto-save is enabled.
    pub async fn on_scroll(&mut self) {
        self.settings = self.backends.settings().await;
        if !self.settings.auto_save {
            return;
        }
        self.autosave_at = Some(Instant::now() + self.config.autosave_debounce);
    }

    /// Captures a marker at the reader's position and stores it.
    ///
    /// Manual markers prefer the block holding the selection; both kinds
    /// otherwise use the element at the viewport center.
    pub async fn save_marker(&mut self, kind: MarkerKind) {
        let Some((store, key)) = self.open_store().await else {
            return;
        };

        let target = match kind {
            MarkerKind::Manual => self
                .page
                .selection_anchor()
                .or_else(|| self.page.element_at_viewport_center()),
            MarkerKind::Auto => self.page.element_at_viewport_center(),
        };
        let Some(block) = closest_block(&self.page, target) else {
            warn!(page_key = %key, "No element to anchor a marker to");
            return;
        };
        let Some(marker) = build_marker(&self.page, Some(block), kind) else {
            return;
        };

        let now = chrono::Utc::now().timestamp_millis();
        if let Err(e) = store
            .append(&key, marker.clone(), self.config.max_manual_markers, now)
            .await
        {
            warn!(page_key = %key, "Failed to save marker: {:#}", e);
            return;
        }

        self.renderer.render(&mut self.page, block, &marker);
        self.phase = Phase::Rendered;
        info!(
            page_key = %key,
            marker_id = %marker.id,
            kind = kind.label(),
            "marker saved"
        );
    }

    /// Scrolls smoothly to the best marker and highlights it.
    pub async fn jump_to_last(&mut self) {
        let Some((store, key)) = self.open_store().await else {
            return;
        };
        let record = match store.load(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                warn!(page_key = %key, "Failed to read markers: {:#}", e);
                return;
            }
        };
        let Some(marker) = select_best(&record.markers) else {
            return;
        };

        match resolve(marker, &self.page).node() {
            Some(node) => {
                self.page.scroll_into_view(node, ScrollBehavior::Smooth);
                self.renderer.render(&mut self.page, node, marker);
                self.phase = Phase::Rendered;
            }
            None => {
                self.page
                    .scroll_to(marker.scroll_offset, ScrollBehavior::Smooth);
            }
        }
        info!(page_key = %key, marker_id = %marker.id, "jumped to marker");
    }

    /// Forgets every marker for the page and removes all visual state.
    pub async fn clear_markers(&mut self) {
        let Some((store, key)) = self.open_store().await else {
            return;
        };
        if let Err(e) = store.remove(&key).await {
            warn!(page_key = %key, "Failed to clear markers: {:#}", e);
            return;
        }
        self.renderer.clear(&mut self.page);
        self.renderer.remove_jump_affordance(&mut self.page);
        self.autosave_at = None;
        self.retry_at = None;
        self.phase = Phase::Idle;
        info!(page_key = %key, "markers cleared");
    }

    /// In-page navigation: drop pending timers and restore for the new URL.
    pub async fn navigate(&mut self, url: String) {
        debug!(from = %self.url, to = %url, "navigation changed");
        self.url = url;
        self.autosave_at = None;
        self.retry_at = None;
        self.load_and_render(false).await;
    }

    /// Re-reads settings and returns the active marker store with the page key.
    async fn open_store(&mut self) -> Option<(MarkerStore, PageKey)> {
        self.settings = self.backends.settings().await;
        let Some(key) = page_key(&self.url) else {
            warn!(url = %self.url, "Cannot derive a page key");
            return None;
        };
        Some((self.backends.markers(&self.settings), key))
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::time::sleep;

    use super::*;
    use crate::dom::html::ScrollRequest;
    use crate::dom::{Document, HtmlPage};
    use crate::render::TARGET_CLASS;
    use crate::state::SETTINGS_KEY;
    use crate::store::backend::MemoryStore;
    use crate::store::types::Marker;
    use crate::store::KvStore;

    const URL: &str = "https://a.com/story?page=2";
    const KEY: &str = "lrf:https://a.com/story";
    const PAGE: &str = r#"
        <html><head><title>Story</title></head><body><main>
          <p id="p1">First paragraph of the story.</p>
          <p id="p2">Second paragraph <em>with emphasis</em>.</p>
          <p id="p3">Third paragraph closes it.</p>
        </main></body></html>
    "#;

    /// Memory store that counts page-record traffic.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        record_gets: AtomicUsize,
        record_sets: AtomicUsize,
    }

    #[async_trait]
    impl KvStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if key != SETTINGS_KEY {
                self.record_gets.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
            if key != SETTINGS_KEY {
                self.record_sets.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }

        async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.keys_with_prefix(prefix).await
        }
    }

    fn session(backends: Backends) -> Session<HtmlPage> {
        Session::new(
            HtmlPage::parse(PAGE),
            URL,
            backends,
            SessionConfig::default(),
        )
    }

    fn scrolled(y: f64, center: &str) -> PageEvent {
        PageEvent::Scrolled {
            y,
            center: Some(center.to_string()),
        }
    }

    async fn stored(backends: &Backends) -> Vec<Marker> {
        backends
            .markers(&backends.settings().await)
            .load(KEY)
            .await
            .unwrap()
            .map(|record| record.markers)
            .unwrap_or_default()
    }

    fn stale_marker() -> Marker {
        Marker {
            id: "lx-gone".to_string(),
            kind: MarkerKind::Manual,
            structural_path: "html>body>section>p:nth-of-type(4)".to_string(),
            snippet: "a paragraph that no longer exists".to_string(),
            fingerprint: String::new(),
            scroll_offset: 1234.0,
            created_at: 1,
            page_title: "Story".to_string(),
        }
    }

    fn highlighted(session: &Session<HtmlPage>) -> Vec<Option<String>> {
        let page = session.page();
        page.nodes_with_class(TARGET_CLASS)
            .into_iter()
            .map(|node| page.element_id(node))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_burst_writes_once() {
        let sync = Arc::new(CountingStore::default());
        let backends = Backends::new(sync.clone(), Arc::new(MemoryStore::new()));
        let mut session = session(backends.clone());
        let (tx, rx) = mpsc::channel(16);

        let counter = sync.clone();
        let driver = async move {
            for i in 0..5 {
                tx.send(scrolled(100.0 * i as f64, "#p2")).await.unwrap();
                sleep(Duration::from_millis(100)).await;
            }
            assert_eq!(counter.record_sets.load(Ordering::SeqCst), 0);
            sleep(Duration::from_millis(700)).await;
            assert_eq!(counter.record_sets.load(Ordering::SeqCst), 1);

            tx.send(scrolled(900.0, "#p3")).await.unwrap();
            sleep(Duration::from_millis(700)).await;
            assert_eq!(counter.record_sets.load(Ordering::SeqCst), 2);
        };
        tokio::join!(session.run(rx), driver);

        let markers = stored(&backends).await;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Auto);
        assert_eq!(markers[0].structural_path, "p#p3");
        assert_eq!(markers[0].scroll_offset, 900.0);
        assert_eq!(highlighted(&session), vec![Some("p3".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_save_disabled_never_arms() {
        let backends = Backends::in_memory();
        Settings {
            auto_save: false,
            ..Settings::default()
        }
        .save(backends.sync())
        .await
        .unwrap();
        let mut session = session(backends.clone());
        let (tx, rx) = mpsc::channel(4);

        let driver = async move {
            tx.send(scrolled(10.0, "#p1")).await.unwrap();
            sleep(Duration::from_secs(2)).await;
        };
        tokio::join!(session.run(rx), driver);

        assert!(!session.autosave_pending());
        assert!(stored(&backends).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_cancels_pending_autosave() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        let (tx, rx) = mpsc::channel(4);

        let driver = async move {
            tx.send(scrolled(10.0, "#p1")).await.unwrap();
            sleep(Duration::from_millis(300)).await;
            tx.send(
                Command::NavigationChanged {
                    url: "https://a.com/elsewhere".to_string(),
                }
                .into(),
            )
            .await
            .unwrap();
            sleep(Duration::from_secs(1)).await;
        };
        tokio::join!(session.run(rx), driver);

        assert_eq!(session.url(), "https://a.com/elsewhere");
        assert!(stored(&backends).await.is_empty());
        assert_eq!(
            backends
                .markers(&Settings::default())
                .page_keys()
                .await
                .unwrap(),
            Vec::<String>::new()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_miss_retries_once() {
        let local = Arc::new(CountingStore::default());
        let backends = Backends::new(Arc::new(MemoryStore::new()), local.clone());
        let settings = Settings {
            use_sync: false,
            ..Settings::default()
        };
        settings.save(backends.sync()).await.unwrap();

        backends
            .markers(&settings)
            .append(KEY, stale_marker(), 100, 1)
            .await
            .unwrap();
        let gets_before = local.record_gets.load(Ordering::SeqCst);

        let mut session = session(backends);
        session.start().await;
        assert_eq!(
            session.page().last_scroll(),
            Some(ScrollRequest::Offset {
                y: 1234.0,
                behavior: ScrollBehavior::Instant
            })
        );

        let (tx, rx) = mpsc::channel::<PageEvent>(1);
        let driver = async move {
            sleep(Duration::from_millis(500)).await;
            drop(tx);
        };
        tokio::join!(session.run(rx), driver);

        assert_eq!(local.record_gets.load(Ordering::SeqCst) - gets_before, 2);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(highlighted(&session).is_empty());
    }

    #[tokio::test]
    async fn test_restore_on_load_scrolls_and_renders() {
        let backends = Backends::in_memory();
        let mut first = session(backends.clone());
        first
            .handle(PageEvent::Selected {
                anchor: Some("#p2 > em".to_string()),
            })
            .await;
        first.dispatch(Command::SaveManual).await;

        let mut reloaded = session(backends);
        reloaded.start().await;

        let p2 = reloaded.page().find_by_selector("#p2").unwrap();
        assert_eq!(reloaded.phase(), Phase::Rendered);
        assert_eq!(
            reloaded.page().last_scroll(),
            Some(ScrollRequest::Element {
                node: p2,
                behavior: ScrollBehavior::Instant
            })
        );
        assert_eq!(highlighted(&reloaded), vec![Some("p2".to_string())]);
        assert_eq!(reloaded.page().affordances().len(), 1);
    }

    #[tokio::test]
    async fn test_restore_without_auto_scroll() {
        let backends = Backends::in_memory();
        Settings {
            auto_scroll_on_load: false,
            ..Settings::default()
        }
        .save(backends.sync())
        .await
        .unwrap();
        let mut first = session(backends.clone());
        first.handle(scrolled(50.0, "#p1")).await;
        first.save_marker(MarkerKind::Auto).await;

        let mut reloaded = session(backends);
        reloaded.start().await;
        assert_eq!(reloaded.phase(), Phase::Rendered);
        assert_eq!(reloaded.page().last_scroll(), None);
        assert_eq!(highlighted(&reloaded), vec![Some("p1".to_string())]);
    }

    #[tokio::test]
    async fn test_manual_save_prefers_selection() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        session.handle(scrolled(300.0, "#p1")).await;
        session
            .handle(PageEvent::Selected {
                anchor: Some("#p3".to_string()),
            })
            .await;
        session.dispatch(Command::SaveManual).await;

        let markers = stored(&backends).await;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Manual);
        assert_eq!(markers[0].structural_path, "p#p3");
        assert_eq!(markers[0].snippet, "Third paragraph closes it.");
        assert_eq!(markers[0].page_title, "Story");
        assert_eq!(highlighted(&session), vec![Some("p3".to_string())]);

        session.handle(PageEvent::Selected { anchor: None }).await;
        session.dispatch(Command::SaveManual).await;
        let markers = stored(&backends).await;
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].structural_path, "p#p1");
    }

    #[tokio::test]
    async fn test_auto_capture_keeps_one_slot() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        session.dispatch(Command::SaveManual).await;
        session.handle(scrolled(10.0, "#p1")).await;
        session.save_marker(MarkerKind::Auto).await;
        session.handle(scrolled(20.0, "#p2 > em")).await;
        session.save_marker(MarkerKind::Auto).await;

        let markers = stored(&backends).await;
        let autos: Vec<&Marker> = markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Auto)
            .collect();
        assert_eq!(autos.len(), 1);
        assert_eq!(autos[0].structural_path, "p#p2");
        assert_eq!(
            markers.iter().filter(|m| m.kind == MarkerKind::Manual).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_jump_scrolls_smoothly() {
        let backends = Backends::in_memory();
        let mut session = session(backends);
        session
            .handle(PageEvent::Selected {
                anchor: Some("#p3".to_string()),
            })
            .await;
        session.dispatch(Command::SaveManual).await;
        session.renderer.clear(&mut session.page);

        session.dispatch(Command::JumpToLast).await;
        let p3 = session.page().find_by_selector("#p3").unwrap();
        assert_eq!(
            session.page().last_scroll(),
            Some(ScrollRequest::Element {
                node: p3,
                behavior: ScrollBehavior::Smooth
            })
        );
        assert_eq!(highlighted(&session), vec![Some("p3".to_string())]);
        assert!(session.renderer().last_rendered().is_some());
    }

    #[tokio::test]
    async fn test_jump_miss_scrolls_smoothly_to_offset() {
        let backends = Backends::in_memory();
        backends
            .markers(&Settings::default())
            .append(KEY, stale_marker(), 100, 1)
            .await
            .unwrap();
        let mut session = session(backends);

        session.dispatch(Command::JumpToLast).await;
        assert_eq!(
            session.page().last_scroll(),
            Some(ScrollRequest::Offset {
                y: 1234.0,
                behavior: ScrollBehavior::Smooth
            })
        );
        assert!(highlighted(&session).is_empty());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_retry() {
        let sync = Arc::new(CountingStore::default());
        let backends = Backends::new(sync.clone(), Arc::new(MemoryStore::new()));
        backends
            .markers(&Settings::default())
            .append(KEY, stale_marker(), 100, 1)
            .await
            .unwrap();
        let mut session = session(backends.clone());
        session.start().await;
        assert!(session.retry_at.is_some());

        session.dispatch(Command::ClearMarkers).await;
        assert!(session.retry_at.is_none());
        let gets_after_clear = sync.record_gets.load(Ordering::SeqCst);

        let (tx, rx) = mpsc::channel::<PageEvent>(1);
        let driver = async move {
            sleep(Duration::from_millis(500)).await;
            drop(tx);
        };
        tokio::join!(session.run(rx), driver);

        assert_eq!(sync.record_gets.load(Ordering::SeqCst), gets_after_clear);
        assert!(stored(&backends).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_center_falls_back_to_body() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        session.handle(scrolled(10.0, "#p1")).await;
        session.handle(scrolled(20.0, "#removed")).await;

        let body = session.page().body();
        assert_eq!(session.page().element_at_viewport_center(), body);

        session.save_marker(MarkerKind::Auto).await;
        let markers = stored(&backends).await;
        assert_eq!(markers[0].structural_path, "html>body");
        assert_eq!(markers[0].scroll_offset, 20.0);
    }

    #[tokio::test]
    async fn test_jump_without_markers_is_noop() {
        let mut session = session(Backends::in_memory());
        session.dispatch(Command::JumpToLast).await;
        assert_eq!(session.page().last_scroll(), None);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_clear_removes_record_and_affordance() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        session.dispatch(Command::SaveManual).await;
        assert_eq!(session.page().affordances().len(), 1);

        session.dispatch(Command::ClearMarkers).await;
        assert!(stored(&backends).await.is_empty());
        assert!(highlighted(&session).is_empty());
        assert!(session.page().affordances().is_empty());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_navigation_switches_page_key() {
        let backends = Backends::in_memory();
        let mut session = session(backends.clone());
        session.dispatch(Command::SaveManual).await;

        session
            .navigate("https://a.com/story?page=3#top".to_string())
            .await;
        assert_eq!(session.phase(), Phase::Rendered);
        assert_eq!(session.page().last_scroll(), None);

        session.navigate("https://a.com/next".to_string()).await;
        assert_eq!(session.phase(), Phase::Idle);
        session.dispatch(Command::SaveManual).await;

        let keys = backends
            .markers(&Settings::default())
            .page_keys()
            .await
            .unwrap();
        assert_eq!(keys, vec!["lrf:https://a.com/next", KEY]);
    }

    #[tokio::test]
    async fn test_unparseable_url_is_noop() {
        let backends = Backends::in_memory();
        let mut session = Session::new(
            HtmlPage::parse(PAGE),
            "not a url",
            backends.clone(),
            SessionConfig::default(),
        );
        session.dispatch(Command::SaveManual).await;
        session.start().await;
        assert_eq!(session.phase(), Phase::Idle);
        assert!(backends
            .markers(&Settings::default())
            .page_keys()
            .await
            .unwrap()
            .is_empty());
    }
}
