//! Serve the output directory as it is: no build, no reload.

use std::sync::Arc;

use tokio::signal;

use crate::cli::Cli;
use crate::commands::utils::Project;
use crate::dev::{DevServer, DevServerState};
use crate::error::Result;
use crate::ui;

/// Execute `kiln --serve`.
pub async fn execute(cli: &Cli) -> Result<()> {
    let project = Project::load(cli)?;
    let state = Arc::new(DevServerState::new(project.out_dir(), false));
    let server = DevServer::new(project.config.port, state);

    ui::info(&format!("Serving {}", project.out_dir().display()));
    tokio::select! {
        result = server.start() => result?,
        _ = signal::ctrl_c() => ui::info("Shutting down..."),
    }
    Ok(())
}
