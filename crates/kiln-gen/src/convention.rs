//! Filename conventions for `pages`, `components` and `modules` trees.
//!
//! [`Conventions::classify`] is the single place where a path's role is
//! decided. Every rule below has a unit test; the route table and barrel
//! builders never inspect filenames themselves.
//!
//! | file (under `pages`)  | kind          | symbol  | url            |
//! |-----------------------|---------------|---------|----------------|
//! | `About.xht`           | `Page`        | `About` | `/about`       |
//! | `blog/Post.xht`       | `Page`        | `Post`  | `/blog/post`   |
//! | `+home.xht`           | `DynamicPage` | `home`  | `/`            |
//! | `blog/+home.xht`      | `DynamicPage` | `home`  | `/blog`        |
//! | `blog/index.xht`      | `LayoutIndex` | `Index` | `/blog/:page`  |
//! | `blog/card.xht`       | `Component`   | `card`  | -              |

use std::fmt;
use std::path::Path;

use crate::scanner::to_slash;

/// Prefix marking the default/home page of a directory.
pub const HOME_MARKER: char = '+';

/// Stem reserved for a directory's routable layout entry.
pub const INDEX_STEM: &str = "index";

/// Router token substituted for the `index` segment.
pub const PAGE_PARAM: &str = ":page";

/// Suffix of virtual stylesheet modules emitted by the compiler bridge.
pub const GENERATED_CSS_SUFFIX: &str = ".generated.css";

/// One of the three directories whose contents are interpreted structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConventionDir {
    Pages,
    Components,
    Modules,
}

impl ConventionDir {
    /// All convention directories in generation order.
    pub const ALL: [ConventionDir; 3] = [Self::Pages, Self::Components, Self::Modules];

    /// Directory name on disk.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::Components => "components",
            Self::Modules => "modules",
        }
    }

    /// Whether files in this tree contribute to the route table.
    pub fn is_routed(self) -> bool {
        matches!(self, Self::Pages)
    }
}

impl fmt::Display for ConventionDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Symbol and URL pattern contributed by a routable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// Identifier the page is imported as
    pub symbol: String,
    /// URL pattern relative to the site root, always starting with `/`
    pub url: String,
}

/// How a non-routable module is re-exported from its directory barrel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentExport {
    /// Template component: `export { default as <symbol> } from "./File";`
    Default { symbol: String },
    /// Script module: `export * from "./file.js";`
    Star,
}

/// Role of a file under a convention directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConventionKind {
    /// Capitalized template file under `pages`
    Page(RouteTarget),
    /// `+name` template file under `pages`: the home page of its directory
    DynamicPage(RouteTarget),
    /// `index` template file under `pages`: the directory's parameterized entry
    LayoutIndex(RouteTarget),
    /// Aggregated into the directory barrel, never routed
    Component(ComponentExport),
    /// Not part of generation
    Other,
}

impl ConventionKind {
    /// Route contribution, if any.
    pub fn route(&self) -> Option<&RouteTarget> {
        match self {
            Self::Page(t) | Self::DynamicPage(t) | Self::LayoutIndex(t) => Some(t),
            Self::Component(_) | Self::Other => None,
        }
    }

    /// Barrel line contribution, if any.
    pub fn export(&self) -> Option<ComponentExport> {
        match self {
            Self::Page(t) | Self::DynamicPage(t) | Self::LayoutIndex(t) => {
                Some(ComponentExport::Default {
                    symbol: t.symbol.clone(),
                })
            }
            Self::Component(export) => Some(export.clone()),
            Self::Other => None,
        }
    }
}

/// Naming rules shared by every generator in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Template extensions without the dot (one family for the whole system)
    pub template_extensions: Vec<String>,
    /// Plain script module extensions without the dot
    pub script_extensions: Vec<String>,
    /// File name of generated barrels
    pub barrel_file: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            template_extensions: vec!["xht".to_string(), "ma".to_string()],
            script_extensions: vec!["js".to_string(), "mjs".to_string(), "ts".to_string()],
            barrel_file: "index.js".to_string(),
        }
    }
}

impl Conventions {
    /// Conventions with a custom template extension family.
    pub fn with_template_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template_extensions: extensions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Extension used when scaffolding new template files.
    pub fn primary_extension(&self) -> &str {
        self.template_extensions
            .first()
            .map(String::as_str)
            .unwrap_or("xht")
    }

    /// Whether `path` has a template extension.
    pub fn is_template(&self, path: &Path) -> bool {
        extension_in(path, &self.template_extensions)
    }

    /// Whether `path` has a script module extension.
    pub fn is_script(&self, path: &Path) -> bool {
        extension_in(path, &self.script_extensions)
    }

    /// Whether `path` names a file the generator itself writes.
    pub fn is_generated(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name == self.barrel_file || name.ends_with(GENERATED_CSS_SUFFIX),
            None => false,
        }
    }

    /// Whether `path` is a home marker file (`+name.<ext>`).
    pub fn is_home_marker(&self, path: &Path) -> bool {
        self.is_template(path) && stem(path).is_some_and(|s| s.starts_with(HOME_MARKER))
    }

    /// Classify a file path relative to the root of `dir`.
    pub fn classify(&self, dir: ConventionDir, relative_path: &Path) -> ConventionKind {
        let Some(name) = relative_path.file_name().and_then(|n| n.to_str()) else {
            return ConventionKind::Other;
        };
        if name.starts_with('.') || self.is_generated(relative_path) {
            return ConventionKind::Other;
        }

        if self.is_script(relative_path) {
            return ConventionKind::Component(ComponentExport::Star);
        }
        if !self.is_template(relative_path) {
            return ConventionKind::Other;
        }

        let Some(stem) = stem(relative_path) else {
            return ConventionKind::Other;
        };
        let parent = relative_path.parent().map(to_slash).unwrap_or_default();

        if dir.is_routed() {
            if stem == INDEX_STEM {
                return ConventionKind::LayoutIndex(RouteTarget {
                    symbol: "Index".to_string(),
                    url: join_url(&parent, PAGE_PARAM),
                });
            }
            if let Some(rest) = stem.strip_prefix(HOME_MARKER) {
                return ConventionKind::DynamicPage(RouteTarget {
                    symbol: sanitize_identifier(rest),
                    url: join_url(&parent, ""),
                });
            }
            if starts_uppercase(stem) {
                return ConventionKind::Page(RouteTarget {
                    symbol: sanitize_identifier(stem),
                    url: join_url(&parent, &stem.to_lowercase()),
                });
            }
        }

        ConventionKind::Component(ComponentExport::Default {
            symbol: sanitize_identifier(stem.trim_start_matches(HOME_MARKER)),
        })
    }
}

/// Turn a file stem or directory name into a valid JavaScript identifier.
///
/// `-`, `+`, `:` and any other character not allowed in identifiers become
/// `_`; a leading digit or a reserved word gets a `_` prefix.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || is_reserved(&out) {
        out.insert(0, '_');
    }
    out
}

fn is_reserved(ident: &str) -> bool {
    const RESERVED: &[&str] = &[
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this",
        "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", "let",
        "static", "await",
    ];
    RESERVED.contains(&ident)
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn extension_in(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| known == ext))
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Build `/<parent>/<leaf>` lower-cased, collapsing empty parts.
fn join_url(parent: &str, leaf: &str) -> String {
    let mut url = String::from("/");
    url.push_str(&parent.to_lowercase());
    if !leaf.is_empty() {
        if !parent.is_empty() {
            url.push('/');
        }
        url.push_str(leaf);
    }
    url
}
