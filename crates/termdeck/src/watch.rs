//! Hot reload: watch the deck and config files and post a fresh deck when
//! either settles after a change.
//!
//! Editors rarely write a file once. They create swap files, rename backups
//! into place and touch metadata, so raw events are filtered down to the
//! files we care about and then debounced.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::deck::Deck;
use crate::error::DeckError;
use crate::messages::Message;
use crate::parser::load_deck;

/// Quiet period after the last relevant event before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// The two files a running presentation depends on.
#[derive(Debug, Clone)]
pub struct WatchTargets {
    pub source: PathBuf,
    absolute: PathBuf,
    pub config: PathBuf,
    absolute_config: PathBuf,
}

impl WatchTargets {
    pub fn new(source: &Path, config: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            absolute: absolute(source),
            config: config.to_path_buf(),
            absolute_config: absolute(config),
        }
    }

    /// Directories to watch. Watching the parent rather than the file keeps
    /// working when an editor replaces the file instead of writing it.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = [&self.absolute, &self.absolute_config]
            .into_iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        dirs.dedup();
        dirs
    }

    /// Whether a changed path belongs to the deck or its config. Editor
    /// backups (`talk.md~`) and temporaries (`talk.md.swp`) count too.
    pub fn matches(&self, path: &Path) -> bool {
        if path == self.source || path == self.absolute {
            return true;
        }
        if path == self.config || path == self.absolute_config {
            return true;
        }
        let name = path.to_string_lossy();
        if name.ends_with('~') {
            return true;
        }
        let prefix = format!("{}.", self.absolute.display());
        name.starts_with(&prefix)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Creations and content or name changes. Metadata-only changes are ignored.
pub fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Trailing-edge debounce: fires once `delay` after the last poke.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record an event at `now`, pushing the deadline back.
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// How long to wait for the next event. `None` means wait indefinitely.
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns true (and disarms) once the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Drain watcher events until the channel closes, calling `reload` once per
/// burst of relevant changes and `report` for watcher errors. A burst still
/// pending when the channel closes is dropped.
pub fn watch_loop(
    events: &Receiver<notify::Result<Event>>,
    targets: &WatchTargets,
    delay: Duration,
    mut reload: impl FnMut(),
    mut report: impl FnMut(DeckError),
) {
    let mut debouncer = Debouncer::new(delay);
    loop {
        let received = match debouncer.timeout(Instant::now()) {
            Some(timeout) => events.recv_timeout(timeout),
            None => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Ok(event)) => {
                if is_relevant(&event.kind) && event.paths.iter().any(|p| targets.matches(p)) {
                    log::trace!("Change detected: {:?} {:?}", event.kind, event.paths);
                    debouncer.poke(Instant::now());
                }
            }
            Ok(Err(e)) => {
                log::warn!("File watcher error: {e}");
                report(DeckError::Watch(e));
            }
            Err(RecvTimeoutError::Timeout) => {
                if debouncer.fire(Instant::now()) {
                    reload();
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                if debouncer.pending() {
                    log::debug!("Watcher closed, dropping pending reload");
                }
                return;
            }
        }
    }
}

/// Keeps the OS watcher alive for as long as the presentation runs.
pub struct HotReload {
    _watcher: Option<RecommendedWatcher>,
}

impl HotReload {
    /// Start watching `targets` and post a [`Message::DeckReplaced`] to `tx`
    /// after every settled change.
    ///
    /// Nothing here stops the presentation: parse failures, and a watcher
    /// or directory that cannot be watched, all arrive as an error deck.
    pub fn spawn(targets: WatchTargets, tx: Sender<Message>) -> Self {
        let post = move |deck: Deck| {
            let _ = tx.send(Message::DeckReplaced(Box::new(deck)));
        };

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let mut watcher = match notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = events_tx.send(res);
        }) {
            Ok(watcher) => watcher,
            Err(e) => {
                log::warn!("Failed to start file watcher: {e}");
                post(Deck::error(&DeckError::Watch(e)));
                return Self { _watcher: None };
            }
        };
        for dir in targets.directories() {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => log::info!("Watching {}", dir.display()),
                Err(e) => {
                    log::warn!("Failed to watch {}: {e}", dir.display());
                    post(Deck::error(&DeckError::Watch(e)));
                }
            }
        }

        std::thread::spawn(move || {
            watch_loop(
                &events_rx,
                &targets,
                DEBOUNCE,
                || {
                    let deck = match load_deck(&targets.source, &targets.config) {
                        Ok(deck) => {
                            log::info!("Reloaded {}", targets.source.display());
                            deck
                        }
                        Err(e) => {
                            log::warn!("Reload failed: {e}");
                            Deck::error(&e)
                        }
                    };
                    post(deck);
                },
                |e| post(Deck::error(&e)),
            );
            log::debug!("Watch thread exiting");
        });

        Self {
            _watcher: Some(watcher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::sync::{Arc, Mutex};

    fn targets() -> WatchTargets {
        WatchTargets::new(Path::new("/talks/demo.md"), Path::new("/home/me/.config/termdeck/config.yaml"))
    }

    fn modify(path: &str) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_matches_source_and_config() {
        let t = targets();
        assert!(t.matches(Path::new("/talks/demo.md")));
        assert!(t.matches(Path::new("/home/me/.config/termdeck/config.yaml")));
        assert!(t.matches(Path::new("/talks/demo.md.swp")));
        assert!(t.matches(Path::new("/talks/demo.md~")));
        assert!(!t.matches(Path::new("/talks/other.md")));
        assert!(!t.matches(Path::new("/talks/demo.mdx")));
    }

    #[test]
    fn test_directories_are_deduplicated() {
        let t = WatchTargets::new(Path::new("/talks/demo.md"), Path::new("/talks/termdeck.yaml"));
        assert_eq!(t.directories(), vec![PathBuf::from("/talks")]);
        assert_eq!(targets().directories().len(), 2);
    }

    #[test]
    fn test_relevant_event_kinds() {
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(!is_relevant(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_relevant(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_debouncer_waits_for_quiet() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        assert_eq!(d.timeout(start), None);
        assert!(!d.fire(start));

        d.poke(start);
        assert!(!d.fire(start + Duration::from_millis(50)));
        d.poke(start + Duration::from_millis(50));
        assert!(!d.fire(start + Duration::from_millis(120)));
        assert_eq!(
            d.timeout(start + Duration::from_millis(120)),
            Some(Duration::from_millis(30))
        );
        assert!(d.fire(start + Duration::from_millis(150)));
        assert!(!d.pending());
        assert!(!d.fire(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_burst_reloads_once() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reloads = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&reloads);
        let handle = std::thread::spawn(move || {
            let t = targets();
            watch_loop(&rx, &t, DEBOUNCE, || *counter.lock().unwrap() += 1, |_| {});
        });

        for _ in 0..5 {
            tx.send(modify("/talks/demo.md")).unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(*reloads.lock().unwrap(), 1);

        tx.send(modify("/talks/unrelated.txt")).unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(*reloads.lock().unwrap(), 1);

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_errors_are_reported() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(Err(notify::Error::generic("boom"))).unwrap();
        drop(tx);
        let mut errors = Vec::new();
        watch_loop(&rx, &targets(), DEBOUNCE, || {}, |e| errors.push(e.to_string()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("boom"));
    }

    #[test]
    fn test_pending_burst_dropped_on_close() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(modify("/talks/demo.md")).unwrap();
        drop(tx);
        let mut reloads = 0;
        watch_loop(&rx, &targets(), DEBOUNCE, || reloads += 1, |_| {});
        assert_eq!(reloads, 0);
    }

    #[test]
    fn test_unwatchable_directory_posts_error_deck() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let targets = WatchTargets::new(&missing.join("talk.md"), &missing.join("termdeck.yaml"));

        let (tx, rx) = crossbeam_channel::unbounded();
        let _reload = HotReload::spawn(targets, tx);
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Message::DeckReplaced(deck)) => {
                assert_eq!(deck.len(), 1);
                assert!(deck.current().body.starts_with("# Error while updating"));
                assert!(deck.current().body.contains("file watch failed"));
            }
            other => panic!("expected an error deck, got {other:?}"),
        }
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("talk.md");
        let config = dir.path().join("termdeck.yaml");
        std::fs::write(&source, "# One\n").unwrap();
        std::fs::write(&config, crate::config::DEFAULT_CONFIG).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let _reload = HotReload::spawn(WatchTargets::new(&source, &config), tx);
        std::thread::sleep(Duration::from_millis(200));
        std::fs::write(&source, "# One\n\n----\n\n# Two\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Message::DeckReplaced(deck)) if deck.len() == 2 => break,
                Ok(_) => continue,
                Err(e) => panic!("no reload within timeout: {e}"),
            }
        }
    }
}
