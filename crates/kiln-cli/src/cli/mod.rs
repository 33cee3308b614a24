//! Command-line interface definition for kiln.
//!
//! Kiln has no subcommands; flags pick one of three run modes:
//!
//! - `kiln` (or `kiln -build`) - Production build, then exit
//! - `kiln --watch` (or `kiln -watch`) - Dev build, rebuild on change, serve with live reload
//! - `kiln --serve` - Serve the output directory as is

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;

/// Kiln - convention-driven bundling for template projects
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Convention-driven bundling with a live-reload dev server",
    long_about = "Kiln generates barrels and a route table from the pages, components and\n\
                  modules directories under src/, bundles src/main.js with rolldown and,\n\
                  in watch mode, serves the output with live reload."
)]
pub struct Cli {
    /// Watch sources, rebuild on change and serve with live reload
    ///
    /// Builds are unminified and `process.env.production` is false. The
    /// legacy spelling `-watch` is accepted.
    #[arg(short, long, conflicts_with = "serve")]
    pub watch: bool,

    /// Serve the output directory without building
    #[arg(long)]
    pub serve: bool,

    /// Path to the configuration file
    ///
    /// Relative paths are resolved against the project directory. Defaults
    /// to kiln.config.json when present.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dev server port, overriding the configuration
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Shows each regeneration step, every watch batch and the bundler
    /// settings used for each build.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    ///
    /// Only critical errors will be displayed. Useful for CI/CD environments
    /// or when piping output to other tools.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Outputs plain text without ANSI color codes. Useful for logging to
    /// files or systems that don't support colored terminal output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// What a kiln invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Dev,
    Serve,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.watch {
            Mode::Dev
        } else if self.serve {
            Mode::Serve
        } else {
            Mode::Build
        }
    }

    /// Project root: `--cwd` resolved against the process directory.
    pub fn project_root(&self) -> std::io::Result<PathBuf> {
        let current = std::env::current_dir()?;
        Ok(match &self.cwd {
            Some(dir) => resolve(&current, dir),
            None => current,
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Rewrite the single-dash long flags older scripts pass.
///
/// `-watch` becomes `--watch`; `-build` names the default mode and is dropped.
/// The program name is never rewritten.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let program = args.next();
    program
        .into_iter()
        .chain(args.filter_map(|arg| match arg.to_str() {
            Some("-watch") => Some(OsString::from("--watch")),
            Some("-build") => None,
            _ => Some(arg),
        }))
        .collect()
}
