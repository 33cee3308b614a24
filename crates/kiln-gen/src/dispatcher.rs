//! Watch protocol: turns filesystem events into regeneration passes.
//!
//! The dispatcher owns its state explicitly. It starts in
//! [`DispatchState::Scanning`], where every event is dropped, and moves to
//! [`DispatchState::Ready`] once [`WatchDispatcher::initial_scan`] has written
//! the full set of generated files. Events arrive in debounced batches; each
//! batch is reduced to one [`RegenPlan`] and executed once, so an editor save
//! that fires several events costs a single pass.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::barrel::BarrelBuilder;
use crate::convention::{ConventionDir, HOME_MARKER};
use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::routes::RouteTableBuilder;
use crate::scanner;
use crate::writer::{ModuleWriter, WriteOutcome};

/// Filesystem change kinds the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
}

impl WatchEventKind {
    fn is_dir(self) -> bool {
        matches!(self, Self::AddDir | Self::UnlinkDir)
    }
}

/// A single filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Lifecycle of a dispatcher. Moves from `Scanning` to `Ready` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Scanning,
    Ready,
}

/// Work derived from a batch of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenPlan {
    /// Directories whose barrel is rebuilt
    pub barrels: BTreeSet<(ConventionDir, PathBuf)>,
    /// Whole trees whose barrels are all rebuilt
    pub trees: BTreeSet<ConventionDir>,
    /// New page directories that get a home stub when they lack one
    pub scaffold: BTreeSet<PathBuf>,
    /// Whether the route table is rebuilt
    pub route_table: bool,
}

impl RegenPlan {
    pub fn is_empty(&self) -> bool {
        self.barrels.is_empty()
            && self.trees.is_empty()
            && self.scaffold.is_empty()
            && !self.route_table
    }
}

/// Files touched by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Generated files whose content changed
    pub written: Vec<PathBuf>,
    /// Generated files already up to date
    pub unchanged: usize,
    /// Home stubs created for new page directories
    pub scaffolded: Vec<PathBuf>,
    /// Steps that failed; each was logged
    pub failures: usize,
}

impl GenerationReport {
    fn record(&mut self, path: PathBuf, outcome: Result<WriteOutcome>) {
        match outcome {
            Ok(WriteOutcome::Written) => self.written.push(path),
            Ok(WriteOutcome::Unchanged) => self.unchanged += 1,
            Err(err) => self.fail(&err),
        }
    }

    fn fail(&mut self, err: &crate::GenError) {
        tracing::error!(error = %err, "regeneration step failed");
        self.failures += 1;
    }
}

/// Routes watch events to barrel and route table regeneration.
#[derive(Debug)]
pub struct WatchDispatcher {
    layout: ProjectLayout,
    writer: ModuleWriter,
    state: DispatchState,
}

impl WatchDispatcher {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            writer: ModuleWriter::new(),
            state: DispatchState::Scanning,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Generate every barrel and the route table, then start accepting events.
    ///
    /// The route table is only written when `pages` exists. Calling this a
    /// second time regenerates without changing state.
    pub fn initial_scan(&mut self) -> GenerationReport {
        let plan = RegenPlan {
            trees: ConventionDir::ALL.into_iter().collect(),
            route_table: self.layout.dir(ConventionDir::Pages).is_dir(),
            ..RegenPlan::default()
        };
        let report = self.execute(&plan);

        if self.state == DispatchState::Scanning {
            self.state = DispatchState::Ready;
            tracing::info!(
                written = report.written.len(),
                unchanged = report.unchanged,
                "initial scan complete"
            );
        }
        report
    }

    /// Handle one event; same as a batch of one.
    pub fn handle(&mut self, event: WatchEvent) -> GenerationReport {
        self.handle_batch(std::iter::once(event))
    }

    /// Reduce a batch of events to a plan and run it.
    ///
    /// Events received before the initial scan has finished are dropped.
    pub fn handle_batch<I>(&mut self, events: I) -> GenerationReport
    where
        I: IntoIterator<Item = WatchEvent>,
    {
        if self.state == DispatchState::Scanning {
            let dropped = events.into_iter().count();
            tracing::debug!(dropped, "initial scan in progress, ignoring events");
            return GenerationReport::default();
        }

        let plan = self.plan(events);
        if plan.is_empty() {
            return GenerationReport::default();
        }
        self.execute(&plan)
    }

    /// Compute what a batch of events requires.
    pub fn plan<I>(&self, events: I) -> RegenPlan
    where
        I: IntoIterator<Item = WatchEvent>,
    {
        let mut plan = RegenPlan::default();
        for event in events {
            self.plan_event(&mut plan, &event);
        }
        plan
    }

    fn plan_event(&self, plan: &mut RegenPlan, event: &WatchEvent) {
        if self.layout.is_generated(&event.path) || self.layout.is_hidden(&event.path) {
            return;
        }
        let Some((tree, root)) = self.layout.locate(&event.path) else {
            return;
        };

        // The convention directory itself appeared or vanished
        if event.path == root {
            match event.kind {
                WatchEventKind::AddDir => {
                    plan.trees.insert(tree);
                    if tree == ConventionDir::Pages {
                        plan.route_table = true;
                        plan.scaffold.insert(root);
                    } else {
                        plan.trees.insert(ConventionDir::Pages);
                    }
                }
                WatchEventKind::UnlinkDir => {
                    if tree == ConventionDir::Pages {
                        plan.route_table = true;
                    } else {
                        plan.trees.insert(ConventionDir::Pages);
                    }
                }
                _ => {}
            }
            return;
        }

        if let Some(parent) = event.path.parent() {
            plan.barrels.insert((tree, parent.to_path_buf()));
        }

        if event.kind == WatchEventKind::AddDir {
            plan.barrels.insert((tree, event.path.clone()));
            if tree == ConventionDir::Pages {
                plan.scaffold.insert(event.path.clone());
            }
        }

        if tree.is_routed() {
            plan.route_table = true;
        } else if event.kind.is_dir() {
            tracing::trace!(dir = %event.path.display(), "directory change outside pages");
        }
    }

    /// Run a plan. Failures are logged and counted, never returned.
    pub fn execute(&self, plan: &RegenPlan) -> GenerationReport {
        let mut report = GenerationReport::default();

        for dir in &plan.scaffold {
            match self.scaffold(dir) {
                Ok(Some(stub)) => report.scaffolded.push(stub),
                Ok(None) => {}
                Err(err) => report.fail(&err),
            }
        }

        let builder = BarrelBuilder::new(&self.layout);
        let mut dirs: BTreeSet<(ConventionDir, PathBuf)> = plan.barrels.clone();
        for tree in &plan.trees {
            match builder.directories(*tree) {
                Ok(found) => dirs.extend(found.into_iter().map(|d| (*tree, d))),
                Err(err) => report.fail(&err),
            }
        }
        // New directories may arrive with content already inside
        for (tree, dir) in &plan.barrels {
            if plan.scaffold.contains(dir) || self.is_new_subtree(dir) {
                dirs.extend(subdirectories(dir).into_iter().map(|d| (*tree, d)));
            }
        }

        for (tree, dir) in dirs {
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "directory gone, skipping barrel");
                continue;
            }
            let barrel = builder
                .build(tree, &dir)
                .and_then(|barrel| barrel.write(&self.writer).map(|o| (barrel.path, o)));
            match barrel {
                Ok((path, outcome)) => report.record(path, Ok(outcome)),
                Err(err) => report.fail(&err),
            }
        }

        if plan.route_table {
            let outcome = RouteTableBuilder::new(&self.layout).write(&self.writer);
            report.record(self.layout.routes_file(), outcome);
        }

        report
    }

    /// Directories without a barrel yet were created since the last pass.
    fn is_new_subtree(&self, dir: &Path) -> bool {
        dir.is_dir() && !self.layout.barrel_path(dir).exists()
    }

    /// Create `+home.<ext>` in a page directory that has no home marker.
    fn scaffold(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let conventions = &self.layout.conventions;
        let entries = scanner::scan_or_empty(dir, false)?;
        if entries
            .iter()
            .any(|e| !e.is_directory && conventions.is_home_marker(&e.absolute_path))
        {
            return Ok(None);
        }
        if !dir.is_dir() {
            return Ok(None);
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("home")
            .to_string();
        let stub = dir.join(format!(
            "{HOME_MARKER}home.{}",
            conventions.primary_extension()
        ));
        let created = self.writer.create_if_absent(&stub, &home_stub(&name))?;
        if created {
            tracing::info!(path = %stub.display(), "scaffolded home page");
            Ok(Some(stub))
        } else {
            Ok(None)
        }
    }
}

fn home_stub(name: &str) -> String {
    format!("<h1>{name}</h1>\n")
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    scanner::scan_or_empty(dir, true)
        .map(|entries| {
            entries
                .into_iter()
                .filter(|e| e.is_directory)
                .map(|e| e.absolute_path)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> WatchDispatcher {
        let mut d = WatchDispatcher::new(ProjectLayout::new("/p/src"));
        d.state = DispatchState::Ready;
        d
    }

    fn event(kind: WatchEventKind, path: &str) -> WatchEvent {
        WatchEvent::new(kind, path)
    }

    #[test]
    fn test_component_file_rebuilds_parent_barrel_only() {
        let plan = dispatcher().plan([event(
            WatchEventKind::Add,
            "/p/src/components/forms/Input.xht",
        )]);
        assert_eq!(
            plan.barrels,
            BTreeSet::from([(
                ConventionDir::Components,
                PathBuf::from("/p/src/components/forms")
            )])
        );
        assert!(!plan.route_table);
        assert!(plan.scaffold.is_empty());
    }

    #[test]
    fn test_page_event_rebuilds_routes_and_barrel() {
        let plan =
            dispatcher().plan([event(WatchEventKind::Unlink, "/p/src/pages/foo/Bar.xht")]);
        assert!(plan.route_table);
        assert!(plan
            .barrels
            .contains(&(ConventionDir::Pages, PathBuf::from("/p/src/pages/foo"))));
    }

    #[test]
    fn test_page_add_dir_scaffolds() {
        let plan = dispatcher().plan([event(WatchEventKind::AddDir, "/p/src/pages/blog")]);
        assert!(plan.route_table);
        assert_eq!(plan.scaffold, BTreeSet::from([PathBuf::from("/p/src/pages/blog")]));
        assert!(plan
            .barrels
            .contains(&(ConventionDir::Pages, PathBuf::from("/p/src/pages"))));
        assert!(plan
            .barrels
            .contains(&(ConventionDir::Pages, PathBuf::from("/p/src/pages/blog"))));
    }

    #[test]
    fn test_generated_and_foreign_paths_are_ignored() {
        let plan = dispatcher().plan([
            event(WatchEventKind::Change, "/p/src/routes.js"),
            event(WatchEventKind::Change, "/p/src/pages/index.js"),
            event(WatchEventKind::Change, "/p/src/main.js"),
        ]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_shared_tree_root_refreshes_page_passthroughs() {
        let plan = dispatcher().plan([event(WatchEventKind::UnlinkDir, "/p/src/modules")]);
        assert_eq!(plan.trees, BTreeSet::from([ConventionDir::Pages]));
        assert!(plan.barrels.is_empty());
    }

    #[test]
    fn test_burst_collapses_to_one_plan() {
        let plan = dispatcher().plan([
            event(WatchEventKind::Add, "/p/src/pages/A.xht"),
            event(WatchEventKind::Change, "/p/src/pages/A.xht"),
            event(WatchEventKind::Add, "/p/src/pages/B.xht"),
        ]);
        assert_eq!(plan.barrels.len(), 1);
        assert!(plan.route_table);
    }

    #[test]
    fn test_events_dropped_while_scanning() {
        let mut d = WatchDispatcher::new(ProjectLayout::new("/p/src"));
        assert_eq!(d.state(), DispatchState::Scanning);
        let report = d.handle(event(WatchEventKind::Add, "/p/src/pages/A.xht"));
        assert_eq!(report, GenerationReport::default());
    }
}
