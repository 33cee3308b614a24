//! Route table generation from the `pages` tree.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::convention::{ConventionDir, sanitize_identifier};
use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::scanner;
use crate::writer::{ModuleWriter, WriteOutcome};
use crate::{GENERATED_HEADER, js_string};

/// One row of the generated route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// URL pattern matched by the router, e.g. `/blog/:page`
    pub url_pattern: String,
    /// Identifier the page module is imported as
    pub page_symbol: String,
    /// Import specifier relative to the route table, e.g. `./pages/blog/index.xht`
    pub import_path: String,
    /// Page file on disk
    pub source: PathBuf,
}

/// Ordered route entries plus the imports they need.
///
/// Entries are stored in output order: deepest pages first. The order only
/// affects how the generated file reads; URL patterns are unique so the router
/// never depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    pub entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// One import statement per entry, in table order.
    pub fn imports(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("import {} from {};", e.page_symbol, js_string(&e.import_path)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the module source.
    pub fn render(&self) -> String {
        let mut out = String::from(GENERATED_HEADER);
        for import in self.imports() {
            out.push_str(&import);
            out.push('\n');
        }
        out.push('\n');

        if self.entries.is_empty() {
            out.push_str("export default [];\n");
            return out;
        }

        out.push_str("export default [\n");
        for entry in &self.entries {
            out.push_str(&format!(
                "  {{ path: {}, page: {} }},\n",
                js_string(&entry.url_pattern),
                entry.page_symbol
            ));
        }
        out.push_str("];\n");
        out
    }
}

/// Walks `pages` and produces the [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteTableBuilder<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> RouteTableBuilder<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    /// Scan the pages tree and build the table.
    ///
    /// A missing `pages` directory yields an empty table. When two files map
    /// to the same URL the one discovered later wins and a warning names both.
    pub fn build(&self) -> Result<RouteTable> {
        let pages_root = self.layout.dir(ConventionDir::Pages);
        let conventions = &self.layout.conventions;

        let mut routes: Vec<Option<RouteEntry>> = Vec::new();
        let mut by_url: HashMap<String, usize> = HashMap::new();

        for entry in scanner::scan_or_empty(&pages_root, true)? {
            if entry.is_directory {
                continue;
            }
            let kind = conventions.classify(ConventionDir::Pages, &entry.relative_path);
            let Some(target) = kind.route() else {
                tracing::debug!(file = %entry.absolute_path.display(), "not a routable page");
                continue;
            };

            let route = RouteEntry {
                url_pattern: target.url.clone(),
                page_symbol: target.symbol.clone(),
                import_path: format!(
                    "./{}/{}",
                    ConventionDir::Pages.dir_name(),
                    entry.relative_slash_path()
                ),
                source: entry.absolute_path.clone(),
            };

            if let Some(previous) = by_url.insert(route.url_pattern.clone(), routes.len()) {
                if let Some(dropped) = routes[previous].take() {
                    tracing::warn!(
                        url = %route.url_pattern,
                        kept = %route.source.display(),
                        dropped = %dropped.source.display(),
                        "duplicate route pattern, the later file wins"
                    );
                }
            }
            routes.push(Some(route));
        }

        let mut entries: Vec<RouteEntry> = routes.into_iter().flatten().collect();
        assign_unique_symbols(&mut entries);
        entries.reverse();

        Ok(RouteTable { entries })
    }

    /// Build and persist the table at the layout's route file.
    pub fn write(&self, writer: &ModuleWriter) -> Result<WriteOutcome> {
        let table = self.build()?;
        writer.write(&self.layout.routes_file(), &table.render())
    }
}

/// Give every entry a distinct import identifier, in discovery order.
///
/// A taken symbol is first qualified with its directory segments, then
/// numbered.
fn assign_unique_symbols(entries: &mut [RouteEntry]) {
    let mut taken: HashSet<String> = HashSet::new();

    for entry in entries.iter_mut() {
        if taken.insert(entry.page_symbol.clone()) {
            continue;
        }

        let dirs = entry
            .import_path
            .trim_start_matches("./")
            .split('/')
            .skip(1)
            .collect::<Vec<_>>();
        let dirs = &dirs[..dirs.len().saturating_sub(1)];

        let base = if dirs.is_empty() {
            entry.page_symbol.clone()
        } else {
            let prefix = dirs
                .iter()
                .map(|d| sanitize_identifier(d))
                .collect::<Vec<_>>()
                .join("_");
            format!("{prefix}_{}", entry.page_symbol.trim_start_matches('_'))
        };

        let base = sanitize_identifier(&base);
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        entry.page_symbol = candidate;
    }
}
