//! File system watcher for live rebuild.
//!
//! Monitors the content, template and asset directories plus the
//! config file. Events are debounced, then any relevant change
//! triggers a full site rebuild; a short cooldown swallows the
//! watcher's own echo of freshly written output.

use crate::{build::build_site, config::SiteConfig, log};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path relative to the project root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Rebuild for a batch of changed paths. Returns true on success.
fn handle_changes(paths: &[PathBuf], config: &'static SiteConfig) -> bool {
    // Changes inside the output directory are our own writes.
    let relevant: Vec<_> = paths
        .iter()
        .filter(|p| !p.starts_with(&config.build.output))
        .collect();
    if relevant.is_empty() {
        return false;
    }

    let root = config.get_root();
    let triggers: Vec<_> = relevant.iter().map(|p| rel_path(p, root)).collect();
    log!("watch"; "{} changed, rebuilding...", triggers.join(", "));

    match build_site(config) {
        Ok(()) => true,
        Err(e) => {
            log!("watch"; "rebuild failed: {e:#}");
            false
        }
    }
}

/// Paths the watcher covers: source directories and the config file.
fn watch_paths(config: &SiteConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let config_file = config.get_root().join(&config.get_cli().config);
    vec![
        (config.build.content.clone(), RecursiveMode::Recursive),
        (config.build.templates.clone(), RecursiveMode::Recursive),
        (config.build.assets.clone(), RecursiveMode::Recursive),
        (config_file, RecursiveMode::NonRecursive),
    ]
}

fn setup_watchers(watcher: &mut impl Watcher, config: &'static SiteConfig) -> Result<()> {
    let root = config.get_root();
    let mut watched = Vec::new();

    for (path, mode) in watch_paths(config) {
        if !path.exists() {
            continue;
        }
        watcher
            .watch(&path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        watched.push(rel_path(&path, root));
    }

    log!("watch"; "watching: {}", watched.join(", "));
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Start the blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes(config: &'static SiteConfig) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take(), config) {
                    debouncer.mark_rebuild();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Irrelevant events, timeouts without pending work
            _ => {}
        }
    }

    Ok(())
}
