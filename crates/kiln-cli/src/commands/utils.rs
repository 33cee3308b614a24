//! Setup shared by every run mode.

use std::path::{Path, PathBuf};

use kiln_config::KilnConfig;
use kiln_gen::{Conventions, ProjectLayout, WatchDispatcher};

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::orchestrator::BuildSummary;
use crate::ui;

/// A loaded project: its root and effective configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: KilnConfig,
}

impl Project {
    /// Load the project named by the command line.
    ///
    /// Priority for the port: `--port` > `KILN_PORT` > config file > default.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.project_root()?;
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let mut config = KilnConfig::load(&root, cli.config.as_deref())?;
        if let Some(port) = cli.port {
            config.port = port;
        }
        tracing::debug!(root = %root.display(), ?config, "configuration loaded");
        Ok(Self { root, config })
    }

    pub fn out_dir(&self) -> PathBuf {
        self.config.out_dir(&self.root)
    }

    /// Convention layout for the configured source root and extensions.
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.config.src_dir(&self.root)).with_conventions(
            Conventions::with_template_extensions(self.config.extensions.iter().cloned()),
        )
    }

    /// Run the initial generation pass, unless `autoroute` is off.
    pub fn generate(&self) -> Option<WatchDispatcher> {
        if !self.config.autoroute {
            tracing::debug!("autoroute disabled, skipping generation");
            return None;
        }

        let mut dispatcher = WatchDispatcher::new(self.layout());
        let report = dispatcher.initial_scan();
        if report.failures > 0 {
            ui::warning(&format!(
                "{} generation step(s) failed; see the log above",
                report.failures
            ));
        }
        Some(dispatcher)
    }
}

/// Print the files a build wrote, relative to `root`.
pub fn report_build(summary: &BuildSummary, root: &Path) {
    let files: Vec<(String, u64)> = summary
        .outputs
        .iter()
        .map(|(path, size)| {
            let shown = path.strip_prefix(root).unwrap_or(path);
            (shown.display().to_string(), *size)
        })
        .collect();
    ui::print_outputs(&files, summary.duration);
}
