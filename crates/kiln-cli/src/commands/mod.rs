//! Run modes of the kiln binary.
//!
//! - [`build`] - Production build, then exit
//! - [`dev`] - Watch, rebuild and serve with live reload
//! - [`serve`] - Serve the output directory only
//!
//! Each module exposes an `execute` function taking the parsed command line.

pub mod build;
pub mod dev;
pub mod serve;
pub mod utils;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
pub use serve::execute as serve_execute;
pub use utils::Project;
