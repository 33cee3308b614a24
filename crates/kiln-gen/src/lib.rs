//! Convention-driven module generation for kiln projects.
//!
//! A kiln project keeps its UI under three convention directories inside the
//! source root:
//!
//! - `pages/`: routable templates. Capitalized files become routes, `+name`
//!   files are the home page of their directory and `index` files take a
//!   `:page` parameter.
//! - `components/`: templates and scripts aggregated into barrels.
//! - `modules/`: plain script modules, aggregated the same way.
//!
//! This crate mirrors those trees into generated JavaScript: one `index.js`
//! barrel per directory and a `routes.js` table at the source root. Every
//! generated file is fully recomputed from a fresh scan and only written when
//! its content changes.
//!
//! # Example
//!
//! ```no_run
//! use kiln_gen::{ProjectLayout, WatchDispatcher, WatchEvent, WatchEventKind};
//!
//! let mut dispatcher = WatchDispatcher::new(ProjectLayout::new("src"));
//! dispatcher.initial_scan();
//!
//! let report = dispatcher.handle(WatchEvent::new(
//!     WatchEventKind::Add,
//!     "src/pages/blog/Post.xht",
//! ));
//! println!("{} files rewritten", report.written.len());
//! ```

mod barrel;
mod convention;
mod dispatcher;
mod error;
mod layout;
mod routes;
mod scanner;
mod writer;

pub use barrel::{BarrelBuilder, BarrelFile};
pub use convention::{
    ComponentExport, ConventionDir, ConventionKind, Conventions, GENERATED_CSS_SUFFIX,
    HOME_MARKER, INDEX_STEM, PAGE_PARAM, RouteTarget, sanitize_identifier,
};
pub use dispatcher::{
    DispatchState, GenerationReport, RegenPlan, WatchDispatcher, WatchEvent, WatchEventKind,
};
pub use error::{GenError, Result};
pub use layout::{ProjectLayout, ROUTES_FILE};
pub use routes::{RouteEntry, RouteTable, RouteTableBuilder};
pub use scanner::{FileEntry, scan, scan_or_empty};
pub use writer::{ModuleWriter, WriteOutcome};

/// First line of every generated module.
pub const GENERATED_HEADER: &str = "// Generated by kiln. Do not edit.\n";

/// Quote `value` as a double-quoted JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
