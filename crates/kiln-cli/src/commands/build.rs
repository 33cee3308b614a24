//! Production build: generate, bundle minified, write and exit.

use crate::cli::Cli;
use crate::commands::utils::{self, Project};
use crate::error::Result;
use crate::orchestrator::{BuildMode, BuildOrchestrator};
use crate::ui;

/// Execute a one-shot production build.
pub async fn execute(cli: &Cli) -> Result<()> {
    let project = Project::load(cli)?;
    run(&project).await
}

/// Build `project` once in production mode.
pub async fn run(project: &Project) -> Result<()> {
    project.generate();

    let orchestrator =
        BuildOrchestrator::new(&project.config, &project.root, BuildMode::Production)?;
    ui::info(&format!("Building {}", project.config.entry.display()));

    let summary = orchestrator.build().await?;
    utils::report_build(&summary, &project.root);
    ui::success(&format!(
        "Build completed in {}",
        ui::format_duration(summary.duration)
    ));
    Ok(())
}
