use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, NoticeLevel, Scope};
use crate::models::{FileMeta, MediaItem, MediaOwner, MediaStatus, QueueEntry, SavedTrip};
use crate::state::EditorState;
use crate::thumbnails;
use crate::uploader::{remote_url_from_response, MediaTransport, UploadRequest};
use crate::validate::validate_file;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
pub const RETRY_BACKOFF: Duration = Duration::from_millis(1500);
/// Total attempts per claimed upload, first try included.
pub const MAX_ATTEMPTS: u32 = 3;

/// A file the user picked, plus the metadata captured at selection time.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub path: PathBuf,
    pub meta: FileMeta,
}

impl PickedFile {
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let size_bytes = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media")
            .to_string();
        let mime_type = mime_from_extension(&path);
        Ok(Self {
            path,
            meta: FileMeta {
                name,
                mime_type,
                size_bytes,
            },
        })
    }
}

fn mime_from_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[derive(Default)]
struct QueueInner {
    queue: VecDeque<QueueEntry>,
    active: usize,
}

type SaveHook = Arc<dyn Fn(SavedTrip) + Send + Sync>;

struct ManagerInner {
    state: Arc<Mutex<EditorState>>,
    queue: Mutex<QueueInner>,
    transport: Arc<dyn MediaTransport>,
    config: UploadConfig,
    events: EventBus,
    idle: Notify,
    save_hook: Mutex<Option<SaveHook>>,
}

/// FIFO upload backlog plus the workers that drain it under the concurrency
/// cap. The queue holds reference pairs only; the authoritative media item
/// stays in the trip tree and is re-resolved by id whenever a worker claims
/// an entry. Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct UploadManager {
    inner: Arc<ManagerInner>,
}

impl UploadManager {
    pub fn new(
        state: Arc<Mutex<EditorState>>,
        transport: Arc<dyn MediaTransport>,
        config: UploadConfig,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                state,
                queue: Mutex::new(QueueInner::default()),
                transport,
                config,
                events,
                idle: Notify::new(),
                save_hook: Mutex::new(None),
            }),
        }
    }

    /// Called with a fresh export after every successful upload, the way the
    /// form saves progress to its backing store the moment a file lands.
    pub fn set_save_hook(&self, hook: SaveHook) {
        *self.inner.save_hook.lock().unwrap() = Some(hook);
    }

    pub fn active_uploads(&self) -> usize {
        self.inner.queue.lock().unwrap().active
    }

    pub fn queued(&self) -> usize {
        self.inner.queue.lock().unwrap().queue.len()
    }

    pub fn is_idle(&self) -> bool {
        let inner = self.inner.queue.lock().unwrap();
        inner.active == 0 && inner.queue.is_empty()
    }

    // ===== Media selection =====

    /// Attach cover images. At most 10 covers total; the overflow is dropped
    /// with a warning naming how many made it in.
    pub fn add_cover_images(&self, picked: Vec<PickedFile>) -> Vec<String> {
        let remaining = self.inner.state.lock().unwrap().cover_slots_remaining();
        if picked.len() > remaining {
            self.inner.events.toast(
                NoticeLevel::Warning,
                format!(
                    "You can only upload up to 10 cover images. Only the first {remaining} were added."
                ),
            );
        }

        let mut added = Vec::new();
        for file in picked.into_iter().take(remaining) {
            if !self.inner.config.is_image(&file.meta.mime_type) {
                self.inner.events.toast(
                    NoticeLevel::Error,
                    format!("Skipping invalid file: {}", file.meta.name),
                );
                continue;
            }
            if let Err(err) = validate_file(&file.meta, &self.inner.config) {
                self.inner.events.toast(NoticeLevel::Error, err.to_string());
                continue;
            }
            let item = MediaItem::new(file.meta.clone(), file.path.clone());
            let media_id = item.id.clone();
            if self
                .inner
                .state
                .lock()
                .unwrap()
                .push_cover_image(item)
                .is_err()
            {
                break;
            }
            self.spawn_thumbnail(MediaOwner::Cover, media_id.clone(), file);
            self.enqueue(MediaOwner::Cover, media_id.clone());
            added.push(media_id);
        }
        added
    }

    /// Attach photos/videos to a stop. Files failing the validation gate
    /// never become media items and never touch the queue.
    pub fn add_stop_media(&self, stop_id: &str, picked: Vec<PickedFile>) -> Vec<String> {
        if self.inner.state.lock().unwrap().stop(stop_id).is_none() {
            log::warn!("Ignoring media for unknown stop {stop_id}");
            return Vec::new();
        }

        let mut added = Vec::new();
        for file in picked {
            if let Err(err) = validate_file(&file.meta, &self.inner.config) {
                self.inner.events.toast(NoticeLevel::Error, err.to_string());
                continue;
            }
            let item = MediaItem::new(file.meta.clone(), file.path.clone());
            let media_id = item.id.clone();
            if self
                .inner
                .state
                .lock()
                .unwrap()
                .push_stop_media(stop_id, item)
                .is_err()
            {
                continue;
            }
            self.spawn_thumbnail(
                MediaOwner::Stop(stop_id.to_string()),
                media_id.clone(),
                file,
            );
            self.enqueue(MediaOwner::Stop(stop_id.to_string()), media_id.clone());
            added.push(media_id);
        }
        added
    }

    fn spawn_thumbnail(&self, owner: MediaOwner, media_id: String, file: PickedFile) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mime = file.meta.mime_type.clone();
            let path = file.path.clone();
            let thumb = tokio::task::spawn_blocking(move || thumbnails::generate(&path, &mime))
                .await
                .ok()
                .flatten();
            if let Some(thumb) = thumb {
                manager
                    .inner
                    .state
                    .lock()
                    .unwrap()
                    .set_thumbnail(&owner, &media_id, thumb);
            }
        });
    }

    // ===== Queue =====

    pub fn enqueue(&self, owner: MediaOwner, media_id: String) {
        self.inner
            .queue
            .lock()
            .unwrap()
            .queue
            .push_back(QueueEntry { owner, media_id });
        self.pump();
    }

    /// Claim queue entries while there is concurrency slack. Entries whose
    /// item has been removed, or already finished uploading, are skipped in
    /// place; the loop itself is the "immediately pump again" of the skip
    /// path. `active` moves exactly once per claimed attempt-sequence:
    /// incremented here, decremented in `finish`.
    pub fn pump(&self) {
        let mut inner = self.inner.queue.lock().unwrap();
        while inner.active < self.inner.config.max_concurrent_uploads {
            let Some(entry) = inner.queue.pop_front() else {
                break;
            };
            let claimed = {
                let mut state = self.inner.state.lock().unwrap();
                match state.media_mut(&entry.owner, &entry.media_id) {
                    None => false,
                    Some(item) if item.status == MediaStatus::Uploaded => false,
                    Some(item) => {
                        item.status = MediaStatus::Uploading;
                        true
                    }
                }
            };
            if !claimed {
                continue;
            }
            inner.active += 1;
            self.rerender_owner(&entry.owner);
            let manager = self.clone();
            tokio::spawn(async move {
                manager.run_upload(entry).await;
            });
        }
    }

    /// Reset the queue and the active counter alongside the tree, as a trip
    /// reset does. In-flight requests are not aborted; their workers will
    /// find their items gone and no-op.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.queue.lock().unwrap();
            inner.queue.clear();
            inner.active = 0;
        }
        self.inner.state.lock().unwrap().reset();
        self.inner.idle.notify_waiters();
    }

    /// Wait until no upload is active and nothing is queued.
    pub async fn drain(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    // ===== Worker =====

    async fn run_upload(&self, entry: QueueEntry) {
        let (path, meta) = {
            let mut state = self.inner.state.lock().unwrap();
            match state.media_mut(&entry.owner, &entry.media_id) {
                Some(item) => (item.local_path.clone(), item.meta.clone()),
                // Removed between claim and first poll; treat as a skip.
                None => {
                    self.finish(&entry.owner);
                    return;
                }
            }
        };

        let mut body = None;
        for attempt in 1..=MAX_ATTEMPTS {
            log::info!(
                "Uploading {} media: {} (Attempt {attempt})",
                entry.owner.as_field(),
                meta.name
            );
            match self.attempt(&entry, path.as_deref(), &meta).await {
                Ok(response) => {
                    body = Some(response);
                    break;
                }
                Err(err) => {
                    log::warn!("Upload failed (Attempt {attempt}) for {}: {err}", meta.name);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        match body {
            Some(response) => {
                let remote_url = remote_url_from_response(&response);
                if remote_url.is_none() {
                    // The item still counts as uploaded; the submission
                    // payload filters on status, so this leaves a gap the
                    // backend has to tolerate.
                    log::warn!("No remote URL in webhook response for {}", meta.name);
                }
                {
                    let mut state = self.inner.state.lock().unwrap();
                    if let Some(item) = state.media_mut(&entry.owner, &entry.media_id) {
                        item.remote_url = remote_url;
                        item.status = MediaStatus::Uploaded;
                    }
                }
                let noun = match entry.owner {
                    MediaOwner::Cover => "Cover image",
                    MediaOwner::Stop(_) => "File",
                };
                self.inner
                    .events
                    .toast(NoticeLevel::Success, format!("{noun} uploaded successfully"));
                self.run_save_hook();
            }
            None => {
                {
                    let mut state = self.inner.state.lock().unwrap();
                    if let Some(item) = state.media_mut(&entry.owner, &entry.media_id) {
                        item.status = MediaStatus::Error;
                    }
                }
                self.inner
                    .events
                    .toast(NoticeLevel::Error, format!("Upload failed: {}", meta.name));
            }
        }
        self.finish(&entry.owner);
    }

    async fn attempt(
        &self,
        entry: &QueueEntry,
        path: Option<&Path>,
        meta: &FileMeta,
    ) -> Result<serde_json::Value> {
        let path =
            path.ok_or_else(|| Error::Upload(format!("No local file for {}", meta.name)))?;
        // Re-read per attempt; nothing holds the file open across the
        // backoff delay.
        let bytes = std::fs::read(path)?;
        let request = UploadRequest {
            stop_id: entry.owner.as_field().to_string(),
            media_id: entry.media_id.clone(),
            file_name: meta.name.clone(),
            mime_type: meta.mime_type.clone(),
            bytes,
        };
        match tokio::time::timeout(UPLOAD_TIMEOUT, self.inner.transport.upload(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(UPLOAD_TIMEOUT.as_secs())),
        }
    }

    fn finish(&self, owner: &MediaOwner) {
        {
            let mut inner = self.inner.queue.lock().unwrap();
            inner.active = inner.active.saturating_sub(1);
        }
        self.rerender_owner(owner);
        self.inner.events.rerender(Scope::Stats);
        self.pump();
        if self.is_idle() {
            self.inner.idle.notify_waiters();
        }
    }

    fn rerender_owner(&self, owner: &MediaOwner) {
        match owner {
            MediaOwner::Cover => self.inner.events.rerender(Scope::Cover),
            MediaOwner::Stop(_) => self.inner.events.rerender(Scope::Days),
        }
        self.inner.events.rerender(Scope::Preview);
    }

    fn run_save_hook(&self) {
        let hook = self.inner.save_hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            let saved = self.inner.state.lock().unwrap().export();
            hook(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UiEvent;
    use crate::models::StopKind;
    use async_trait::async_trait;
    use crossbeam_channel::Receiver;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted transport: records start order and per-item attempt counts,
    /// tracks peak concurrency, and answers after `delay` with either the
    /// canned response or a failure.
    struct MockTransport {
        starts: Mutex<Vec<String>>,
        attempts: Mutex<HashMap<String, u32>>,
        concurrent: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
        fail: bool,
        response: Value,
    }

    impl MockTransport {
        fn succeeding(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                starts: Mutex::new(Vec::new()),
                attempts: Mutex::new(HashMap::new()),
                concurrent: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
                fail: false,
                response: Value::Null,
            })
        }

        fn failing(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                starts: Mutex::new(Vec::new()),
                attempts: Mutex::new(HashMap::new()),
                concurrent: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
                fail: true,
                response: Value::Null,
            })
        }

        fn total_calls(&self) -> u32 {
            self.attempts.lock().unwrap().values().sum()
        }

        fn attempts_for(&self, media_id: &str) -> u32 {
            *self.attempts.lock().unwrap().get(media_id).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl MediaTransport for MockTransport {
        async fn upload(&self, request: UploadRequest) -> crate::error::Result<Value> {
            {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(request.media_id.clone()).or_insert(0);
                if *count == 0 {
                    self.starts.lock().unwrap().push(request.media_id.clone());
                }
                *count += 1;
            }
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(Error::Upload("HTTP Error 500".into()));
            }
            if self.response.is_null() {
                Ok(json!({ "fileUrl": format!("https://cdn.example.com/{}", request.media_id) }))
            } else {
                Ok(self.response.clone())
            }
        }
    }

    fn harness(
        transport: Arc<dyn MediaTransport>,
        max_concurrent: usize,
    ) -> (UploadManager, Arc<Mutex<EditorState>>, Receiver<UiEvent>) {
        let (events, rx) = EventBus::new();
        let state = Arc::new(Mutex::new(EditorState::new(events.clone())));
        let config = UploadConfig {
            max_concurrent_uploads: max_concurrent,
            ..UploadConfig::default()
        };
        let manager = UploadManager::new(state.clone(), transport, config, events);
        (manager, state, rx)
    }

    fn temp_image(name: &str) -> PickedFile {
        let path = std::env::temp_dir().join(format!("tb_queue_{name}"));
        std::fs::write(&path, b"jpeg bytes").unwrap();
        PickedFile::from_path(path).unwrap()
    }

    fn add_stop(state: &Arc<Mutex<EditorState>>) -> String {
        let mut state = state.lock().unwrap();
        let day = state.add_day();
        state.add_stop(&day, StopKind::Activity).unwrap()
    }

    fn toasts(rx: &Receiver<UiEvent>) -> Vec<(NoticeLevel, String)> {
        rx.try_iter()
            .filter_map(|event| match event {
                UiEvent::Toast { level, message } => Some((level, message)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_cap() {
        let transport = MockTransport::succeeding(Duration::from_millis(500));
        let (manager, state, _rx) = harness(transport.clone(), 2);
        let stop = add_stop(&state);

        let files = (0..5).map(|i| temp_image(&format!("cap_{i}.jpg"))).collect();
        let added = manager.add_stop_media(&stop, files);
        assert_eq!(added.len(), 5);

        manager.drain().await;
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(transport.total_calls(), 5);
        assert_eq!(manager.active_uploads(), 0);

        let state = state.lock().unwrap();
        let stop = state.stop(&stop).unwrap();
        assert!(stop
            .media
            .iter()
            .all(|m| m.status == MediaStatus::Uploaded && m.remote_url.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_upload_errors_after_exactly_three_attempts() {
        let transport = MockTransport::failing(Duration::from_millis(10));
        let (manager, state, rx) = harness(transport.clone(), 2);
        let stop = add_stop(&state);

        let added = manager.add_stop_media(&stop, vec![temp_image("retry.jpg")]);
        manager.drain().await;

        assert_eq!(transport.attempts_for(&added[0]), 3);
        assert_eq!(manager.active_uploads(), 0);
        {
            let state = state.lock().unwrap();
            let item = &state.stop(&stop).unwrap().media[0];
            assert_eq!(item.status, MediaStatus::Error);
            assert!(item.remote_url.is_none());
        }
        let toasts = toasts(&rx);
        assert!(toasts
            .iter()
            .any(|(level, msg)| *level == NoticeLevel::Error && msg.contains("Upload failed")));
    }

    #[tokio::test(start_paused = true)]
    async fn workers_start_in_enqueue_order() {
        let transport = MockTransport::succeeding(Duration::from_millis(50));
        let (manager, state, _rx) = harness(transport.clone(), 3);
        let stop = add_stop(&state);

        let files = vec![
            temp_image("fifo_a.jpg"),
            temp_image("fifo_b.jpg"),
            temp_image("fifo_c.jpg"),
        ];
        let added = manager.add_stop_media(&stop, files);
        manager.drain().await;

        assert_eq!(*transport.starts.lock().unwrap(), added);
    }

    #[tokio::test(start_paused = true)]
    async fn re_enqueue_of_uploaded_item_skips_to_next_entry() {
        let transport = MockTransport::succeeding(Duration::from_millis(10));
        let (manager, state, _rx) = harness(transport.clone(), 1);
        let stop = add_stop(&state);

        let added = manager.add_stop_media(&stop, vec![temp_image("dup.jpg")]);
        manager.drain().await;
        assert_eq!(transport.total_calls(), 1);

        // Second entry for the same pair, followed by a fresh item behind
        // it; the duplicate must be a no-op that lets the fresh one through.
        manager.enqueue(MediaOwner::Stop(stop.clone()), added[0].clone());
        let fresh = manager.add_stop_media(&stop, vec![temp_image("dup2.jpg")]);
        manager.drain().await;

        assert_eq!(transport.attempts_for(&added[0]), 1);
        assert_eq!(transport.attempts_for(&fresh[0]), 1);
        assert_eq!(manager.active_uploads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_item_is_skipped_without_a_network_call() {
        let transport = MockTransport::succeeding(Duration::from_millis(100));
        let (manager, state, _rx) = harness(transport.clone(), 1);
        let stop = add_stop(&state);

        let added = manager.add_stop_media(
            &stop,
            vec![temp_image("keep.jpg"), temp_image("gone.jpg")],
        );
        // First item is in flight; second still queued. Remove the second.
        state.lock().unwrap().remove_stop_media(&stop, &added[1]);
        manager.drain().await;

        assert_eq!(transport.attempts_for(&added[0]), 1);
        assert_eq!(transport.attempts_for(&added[1]), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_a_failed_attempt() {
        let transport = MockTransport::succeeding(Duration::from_secs(120));
        let (manager, state, _rx) = harness(transport.clone(), 1);
        let stop = add_stop(&state);

        let added = manager.add_stop_media(&stop, vec![temp_image("slow.jpg")]);
        manager.drain().await;

        // Every attempt outlives the 60s cap, so the item exhausts its
        // budget and lands in error.
        assert_eq!(transport.attempts_for(&added[0]), 3);
        let state = state.lock().unwrap();
        assert_eq!(
            state.stop(&stop).unwrap().media[0].status,
            MediaStatus::Error
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cover_selection_truncates_at_the_cap() {
        let transport = MockTransport::succeeding(Duration::from_millis(10));
        let (manager, state, rx) = harness(transport.clone(), 2);

        let first = (0..3)
            .map(|i| temp_image(&format!("cover_pre_{i}.jpg")))
            .collect();
        assert_eq!(manager.add_cover_images(first).len(), 3);

        let batch = (0..12)
            .map(|i| temp_image(&format!("cover_{i}.jpg")))
            .collect();
        let added = manager.add_cover_images(batch);
        assert_eq!(added.len(), 7);
        assert_eq!(state.lock().unwrap().trip.cover_images.len(), 10);

        let toasts = toasts(&rx);
        assert!(toasts.iter().any(|(level, msg)| *level == NoticeLevel::Warning
            && msg.contains("Only the first 7 were added")));

        manager.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_files_never_enter_the_model() {
        let transport = MockTransport::succeeding(Duration::from_millis(10));
        let (manager, state, rx) = harness(transport.clone(), 2);
        let stop = add_stop(&state);

        let path = std::env::temp_dir().join("tb_queue_doc.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let added = manager.add_stop_media(&stop, vec![PickedFile::from_path(path).unwrap()]);

        assert!(added.is_empty());
        assert_eq!(state.lock().unwrap().stats().total_media, 0);
        assert_eq!(manager.queued(), 0);
        assert_eq!(transport.total_calls(), 0);
        let toasts = toasts(&rx);
        assert!(toasts
            .iter()
            .any(|(level, msg)| *level == NoticeLevel::Error && msg.contains("doc.pdf")));
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_day_stop_and_two_images() {
        let transport = MockTransport::succeeding(Duration::from_millis(50));
        let (manager, state, _rx) = harness(transport.clone(), 2);
        let stop = add_stop(&state);

        let saves = Arc::new(AtomicUsize::new(0));
        let counter = saves.clone();
        manager.set_save_hook(Arc::new(move |_saved| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let added = manager.add_stop_media(
            &stop,
            vec![temp_image("e2e_a.jpg"), temp_image("e2e_b.jpg")],
        );
        assert_eq!(added.len(), 2);
        {
            let state = state.lock().unwrap();
            // Claimed by the pump already or still pending, never beyond the
            // cap of two.
            assert!(state
                .stop(&stop)
                .unwrap()
                .media
                .iter()
                .all(|m| m.status == MediaStatus::Uploading || m.status == MediaStatus::Pending));
        }

        manager.drain().await;

        let stats = state.lock().unwrap().stats();
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.total_stops, 1);
        assert_eq!(stats.total_media, 2);
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        {
            let state = state.lock().unwrap();
            for item in &state.stop(&stop).unwrap().media {
                assert_eq!(item.status, MediaStatus::Uploaded);
                assert_eq!(
                    item.remote_url.as_deref(),
                    Some(format!("https://cdn.example.com/{}", item.id).as_str())
                );
            }
        }
        assert_eq!(saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_remote_url_still_counts_as_uploaded() {
        let transport = Arc::new(MockTransport {
            starts: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
            concurrent: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: Duration::from_millis(10),
            fail: false,
            response: json!({ "status": "ok" }),
        });
        let (manager, state, _rx) = harness(transport.clone(), 2);
        let stop = add_stop(&state);

        manager.add_stop_media(&stop, vec![temp_image("nourl.jpg")]);
        manager.drain().await;

        let state = state.lock().unwrap();
        let item = &state.stop(&stop).unwrap().media[0];
        assert_eq!(item.status, MediaStatus::Uploaded);
        assert!(item.remote_url.is_none());
    }
}
