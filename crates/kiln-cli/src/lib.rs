//! Kiln CLI - convention-driven builds with a live-reload dev server.
//!
//! The binary ties the workspace together: it loads `kiln.config.json`,
//! keeps the generated barrels and route table in sync with `src/`, bundles
//! `src/main.js` with rolldown and, in watch mode, serves the output directory
//! and tells connected browsers to reload whenever it changes.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing, including the legacy `-watch`/`-build` spellings
//! - [`orchestrator`] - The persistent bundler context and output writing
//! - [`dev`] - Dev server, reload broadcaster and source watcher
//! - [`commands`] - One entry point per run mode
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Status lines for the terminal
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     // Command implementations...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod ui;

pub use error::{BuildError, CliError, Result, ResultExt};
pub use orchestrator::{BuildContext, BuildMode, BuildOrchestrator, BuildSummary};
