//! Barrel modules: one generated `index.js` per convention directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{GENERATED_HEADER, js_string};
use crate::convention::{ComponentExport, ConventionDir, sanitize_identifier};
use crate::error::Result;
use crate::layout::ProjectLayout;
use crate::scanner;
use crate::writer::{ModuleWriter, WriteOutcome};

/// A rendered barrel, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrelFile {
    /// Where the barrel is written
    pub path: PathBuf,
    /// Export lines in output order
    pub lines: Vec<String>,
}

impl BarrelFile {
    /// Full file content.
    pub fn render(&self) -> String {
        let mut out = String::from(GENERATED_HEADER);
        if self.lines.is_empty() {
            out.push_str("export {};\n");
        }
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write through `writer`.
    pub fn write(&self, writer: &ModuleWriter) -> Result<WriteOutcome> {
        writer.write(&self.path, &self.render())
    }
}

/// Builds barrels for directories of one project.
#[derive(Debug, Clone)]
pub struct BarrelBuilder<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> BarrelBuilder<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    /// Render the barrel for `dir`, which must lie in the `tree` convention directory.
    ///
    /// A directory that vanished yields an empty barrel path-wise; callers
    /// check existence before writing.
    pub fn build(&self, tree: ConventionDir, dir: &Path) -> Result<BarrelFile> {
        let tree_root = self.layout.dir(tree);
        let conventions = &self.layout.conventions;
        let entries = scanner::scan(dir, false)?;

        let mut lines = Vec::new();
        let mut taken = HashSet::new();

        for entry in entries.iter().filter(|e| !e.is_directory) {
            let relative = entry
                .absolute_path
                .strip_prefix(&tree_root)
                .unwrap_or(&entry.relative_path);
            let Some(export) = conventions.classify(tree, relative).export() else {
                tracing::debug!(file = %entry.absolute_path.display(), "not exported from barrel");
                continue;
            };
            let Some(file_name) = entry.file_name() else {
                continue;
            };

            match export {
                ComponentExport::Default { symbol } => {
                    if !taken.insert(symbol.clone()) {
                        tracing::warn!(
                            file = %entry.absolute_path.display(),
                            symbol = %symbol,
                            "duplicate export name in barrel, keeping the first"
                        );
                        continue;
                    }
                    lines.push(format!(
                        "export {{ default as {symbol} }} from {};",
                        js_string(&format!("./{file_name}"))
                    ));
                }
                ComponentExport::Star => {
                    lines.push(format!(
                        "export * from {};",
                        js_string(&format!("./{file_name}"))
                    ));
                }
            }
        }

        for sub in entries.iter().filter(|e| e.is_directory) {
            let Some(name) = sub.file_name() else {
                continue;
            };
            let namespace = sanitize_identifier(name);
            if !taken.insert(namespace.clone()) {
                tracing::warn!(
                    dir = %sub.absolute_path.display(),
                    namespace = %namespace,
                    "sub-directory namespace collides with a file export, skipping"
                );
                continue;
            }
            lines.push(format!(
                "export * as {namespace} from {};",
                js_string(&format!("./{name}/{}", conventions.barrel_file))
            ));
        }

        if tree == ConventionDir::Pages {
            lines.extend(self.passthrough_lines(dir));
        }

        Ok(BarrelFile {
            path: self.layout.barrel_path(dir),
            lines,
        })
    }

    /// Re-exports of the shared `components` and `modules` barrels for a page directory.
    fn passthrough_lines(&self, dir: &Path) -> Vec<String> {
        let depth = dir
            .strip_prefix(&self.layout.src_root)
            .map(|rel| rel.components().count())
            .unwrap_or(1);
        let up = "../".repeat(depth);

        [ConventionDir::Components, ConventionDir::Modules]
            .into_iter()
            .filter(|shared| self.layout.dir(*shared).is_dir())
            .map(|shared| {
                format!(
                    "export * from \"{up}{}/{}\";",
                    shared.dir_name(),
                    self.layout.conventions.barrel_file
                )
            })
            .collect()
    }

    /// Every directory of a tree that gets a barrel: the root and all visible
    /// sub-directories, parents before children.
    pub fn directories(&self, tree: ConventionDir) -> Result<Vec<PathBuf>> {
        let root = self.layout.dir(tree);
        if !root.is_dir() {
            return Ok(Vec::new());
        }
        let mut dirs = vec![root.clone()];
        dirs.extend(
            scanner::scan(&root, true)?
                .into_iter()
                .filter(|e| e.is_directory)
                .map(|e| e.absolute_path),
        );
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_component_barrel_lines() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src, "components/Button.xht");
        touch(&src, "components/user-card.xht");
        touch(&src, "components/helpers.js");
        touch(&src, "components/logo.svg");
        touch(&src, "components/forms/Input.xht");

        let layout = ProjectLayout::new(&src);
        let barrel = BarrelBuilder::new(&layout)
            .build(ConventionDir::Components, &src.join("components"))
            .unwrap();

        assert_eq!(
            barrel.lines,
            vec![
                "export { default as Button } from \"./Button.xht\";",
                "export * from \"./helpers.js\";",
                "export { default as user_card } from \"./user-card.xht\";",
                "export * as forms from \"./forms/index.js\";",
            ]
        );
        assert_eq!(barrel.path, src.join("components/index.js"));
    }

    #[test]
    fn test_page_barrel_passes_through_shared_dirs() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src, "pages/foo/Bar.xht");
        touch(&src, "pages/foo/+home.xht");
        touch(&src, "components/Button.xht");

        let layout = ProjectLayout::new(&src);
        let barrel = BarrelBuilder::new(&layout)
            .build(ConventionDir::Pages, &src.join("pages/foo"))
            .unwrap();

        assert_eq!(
            barrel.lines,
            vec![
                "export { default as home } from \"./+home.xht\";",
                "export { default as Bar } from \"./Bar.xht\";",
                "export * from \"../../components/index.js\";",
            ]
        );
    }

    #[test]
    fn test_empty_barrel_is_still_a_module() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("modules")).unwrap();

        let layout = ProjectLayout::new(&src);
        let barrel = BarrelBuilder::new(&layout)
            .build(ConventionDir::Modules, &src.join("modules"))
            .unwrap();

        assert_eq!(barrel.render(), format!("{GENERATED_HEADER}export {{}};\n"));
    }

    #[test]
    fn test_directories_parents_first() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        touch(&src, "pages/a/b/C.xht");
        touch(&src, "pages/.git/x");

        let layout = ProjectLayout::new(&src);
        let dirs = BarrelBuilder::new(&layout)
            .directories(ConventionDir::Pages)
            .unwrap();
        assert_eq!(
            dirs,
            vec![src.join("pages"), src.join("pages/a"), src.join("pages/a/b")]
        );
        assert!(BarrelBuilder::new(&layout)
            .directories(ConventionDir::Modules)
            .unwrap()
            .is_empty());
    }
}
