//! Content directory watching and background reloads

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use stax_core::{Config, Site};

/// How often the reload thread polls the watcher
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Content change event
#[derive(Debug, Clone)]
pub enum ContentEvent {
    Changed,
}

/// Watches the content directory tree for added, edited or removed pages
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<ContentEvent>,
    root: PathBuf,
    last_event: Option<Instant>,
}

impl ContentWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if matches!(
                    event.kind,
                    notify::EventKind::Modify(_)
                        | notify::EventKind::Create(_)
                        | notify::EventKind::Remove(_)
                ) {
                    let _ = tx.send(ContentEvent::Changed);
                }
            }
        })
        .context("Failed to create content watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch directory: {}", root.display()))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            root: root.to_path_buf(),
            last_event: None,
        })
    }

    /// Returns true once a change was seen and the debounce period has elapsed
    pub fn check_changed(&mut self, debounce_ms: u64) -> bool {
        while self.receiver.try_recv().is_ok() {
            self.last_event = Some(Instant::now());
        }

        if let Some(last) = self.last_event {
            if last.elapsed() >= Duration::from_millis(debounce_ms) {
                self.last_event = None;
                return true;
            }
        }

        false
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

/// Stops the reload thread when dropped
pub struct ReloadHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ReloadHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Reload the site's content whenever the content directory changes
pub fn spawn_reloader(site: Arc<Site>, config: Config) -> Result<ReloadHandle> {
    let mut watcher = ContentWatcher::new(&config.content.dir)?;
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let thread = thread::Builder::new()
        .name("content-reload".to_string())
        .spawn(move || {
            log::info!("Watching {} for changes", watcher.path().display());
            while !stop_flag.load(Ordering::Relaxed) {
                thread::sleep(POLL_INTERVAL);
                if watcher.check_changed(config.watch.debounce_ms) {
                    if let Err(e) = crate::reload_content(&site, &config) {
                        log::warn!("{:#}", e);
                    }
                }
            }
        })
        .context("Failed to spawn reload thread")?;

    Ok(ReloadHandle {
        stop,
        thread: Some(thread),
    })
}
