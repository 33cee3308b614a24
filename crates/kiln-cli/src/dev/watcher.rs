//! Source watcher: debounced filesystem events turned into generator batches.
//!
//! Events under the source root are coalesced for `debounceMs`, translated
//! into [`WatchEvent`]s and delivered as one batch per window. Hidden entries
//! are dropped here. While the generator is active, writes kiln makes itself
//! (barrels, route table) are dropped too, so regeneration never feeds back
//! into another rebuild; with `autoroute` off those files belong to the user.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kiln_gen::{ProjectLayout, WatchEvent, WatchEventKind};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

/// Translate one notify event into generator events.
pub fn to_watch_events(event: &Event) -> Vec<WatchEvent> {
    let added = |path: &Path| {
        if path.is_dir() {
            WatchEventKind::AddDir
        } else {
            WatchEventKind::Add
        }
    };

    let kinds: Vec<(WatchEventKind, &PathBuf)> = match event.kind {
        EventKind::Create(CreateKind::Folder) => {
            event.paths.iter().map(|p| (WatchEventKind::AddDir, p)).collect()
        }
        EventKind::Create(_) => event.paths.iter().map(|p| (added(p), p)).collect(),
        EventKind::Remove(RemoveKind::Folder) => {
            event.paths.iter().map(|p| (WatchEventKind::UnlinkDir, p)).collect()
        }
        EventKind::Remove(_) => event.paths.iter().map(|p| (WatchEventKind::Unlink, p)).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![(WatchEventKind::Unlink, from), (added(to), to)],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().map(|p| (WatchEventKind::Unlink, p)).collect()
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                if p.exists() {
                    (added(p), p)
                } else {
                    (WatchEventKind::Unlink, p)
                }
            })
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .filter(|p| !p.is_dir())
            .map(|p| (WatchEventKind::Change, p))
            .collect(),
        _ => Vec::new(),
    };

    kinds
        .into_iter()
        .map(|(kind, path)| WatchEvent::new(kind, path.clone()))
        .collect()
}

/// Whether an event should reach the generator and trigger a rebuild.
///
/// `generating` says whether kiln owns the generated file paths.
pub fn is_relevant(layout: &ProjectLayout, generating: bool, event: &WatchEvent) -> bool {
    if layout.is_hidden(&event.path) {
        return false;
    }
    !(generating && layout.is_generated(&event.path))
}

/// Debounced recursive watcher over the source root.
pub struct SourceWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    root: PathBuf,
}

impl SourceWatcher {
    /// Watch `layout`'s source root; batches arrive on the returned receiver.
    ///
    /// Batches queue up while the receiver is busy, so changes made during a
    /// build are delivered once it finishes.
    pub fn new(
        layout: ProjectLayout,
        generating: bool,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<Vec<WatchEvent>>)> {
        let root = layout.src_root.clone();
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let batch: Vec<WatchEvent> = events
                        .iter()
                        .flat_map(|event| to_watch_events(&event.event))
                        .filter(|event| is_relevant(&layout, generating, event))
                        .collect();
                    if !batch.is_empty() {
                        let _ = tx.blocking_send(batch);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(%error, "source watcher error");
                    }
                }
            }
        })?;
        debouncer.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _debouncer: debouncer,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
