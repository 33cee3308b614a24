//! Watch mode: generate, build, serve, and repeat on every source change.
//!
//! 1. Source watcher on `src/`, so saves during startup are queued
//! 2. Initial generation pass and development build
//! 3. Live reload broadcaster on the output directory, HTTP server in the background
//! 4. Event loop: each debounced batch regenerates, then rebuilds
//!
//! Build failures are reported and the loop keeps going; the next save
//! triggers another attempt. Ctrl+C stops the session.

use std::sync::Arc;
use std::time::Duration;

use kiln_gen::{WatchDispatcher, WatchEvent};
use tokio::signal;

use crate::cli::Cli;
use crate::commands::utils::{self, Project};
use crate::dev::{DevServer, DevServerState, LiveReloadBroadcaster, SourceWatcher};
use crate::error::{CliError, Result, ResultExt};
use crate::orchestrator::{BuildMode, BuildOrchestrator};
use crate::ui;

/// Execute `kiln --watch`.
pub async fn execute(cli: &Cli) -> Result<()> {
    let project = Project::load(cli)?;
    ui::info(&format!("Project: {}", project.root.display()));

    let debounce = Duration::from_millis(project.config.debounce_ms);
    let (watcher, mut batches) =
        SourceWatcher::new(project.layout(), project.config.autoroute, debounce)?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let mut dispatcher = project.generate();
    let orchestrator =
        BuildOrchestrator::new(&project.config, &project.root, BuildMode::Development)?;
    rebuild(&orchestrator, &project, "Initial build").await;

    let state = Arc::new(DevServerState::new(project.out_dir(), true));
    let _broadcaster =
        LiveReloadBroadcaster::start(Arc::clone(&state), &project.config.watch, debounce)
            .context("Live reload")?;

    let server = DevServer::new(project.config.port, Arc::clone(&state));
    let mut server_handle = tokio::spawn(server.start());

    ui::info("Press Ctrl+C to stop");
    loop {
        tokio::select! {
            Some(batch) = batches.recv() => {
                handle_batch(batch, dispatcher.as_mut(), &orchestrator, &project).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down...");
                break;
            }

            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => Err(CliError::Server("server stopped unexpectedly".to_string())),
                    Ok(Err(err)) => Err(err).with_hint("Is another process using this port? Try --port"),
                    Err(join) => Err(CliError::Server(format!("server task failed: {join}"))),
                };
            }
        }
    }

    server_handle.abort();
    ui::success("Stopped");
    Ok(())
}

/// Regenerate for one batch of source events, then rebuild.
async fn handle_batch(
    batch: Vec<WatchEvent>,
    dispatcher: Option<&mut WatchDispatcher>,
    orchestrator: &BuildOrchestrator,
    project: &Project,
) {
    tracing::debug!(events = batch.len(), "source batch");
    if let Some(first) = batch.first() {
        let shown = first.path.strip_prefix(&project.root).unwrap_or(&first.path);
        match batch.len() {
            1 => ui::info(&format!("Changed: {}", shown.display())),
            n => ui::info(&format!("Changed: {} and {} more", shown.display(), n - 1)),
        }
    }

    if let Some(dispatcher) = dispatcher {
        let report = dispatcher.handle_batch(batch);
        if !report.written.is_empty() || !report.scaffolded.is_empty() {
            tracing::info!(
                written = report.written.len(),
                scaffolded = report.scaffolded.len(),
                "regenerated"
            );
        }
    }

    rebuild(orchestrator, project, "Rebuild").await;
}

/// Build once, reporting the outcome instead of returning it.
async fn rebuild(orchestrator: &BuildOrchestrator, project: &Project, label: &str) {
    match orchestrator.build().await {
        Ok(summary) => {
            utils::report_build(&summary, &project.root);
            ui::success(&format!(
                "{label} completed in {}",
                ui::format_duration(summary.duration)
            ));
        }
        Err(err) => ui::error(&format!("{label} failed: {err}")),
    }
}
