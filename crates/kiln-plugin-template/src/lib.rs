//! Rolldown plugin that compiles kiln templates with an external compiler.
//!
//! ```text
//! Page.xht → resolve_id → load → TemplateCompiler → JS (+ import "Page.xht.generated.css")
//!                                                 ↘ CssStore → load → CSS module
//! ```
//!
//! The compiler itself lives outside this crate behind [`TemplateCompiler`];
//! [`CommandCompiler`] runs any program that speaks the JSON protocol on
//! stdin/stdout. Extracted stylesheets are kept in a [`CssStore`] owned by the
//! plugin instance and served back to the bundler as virtual CSS modules.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kiln_plugin_template::{CommandCompiler, TemplatePlugin};
//!
//! let compiler = CommandCompiler::new("node").args(["kiln.compiler.mjs"]);
//! let plugin = TemplatePlugin::new(Arc::new(compiler), ".")
//!     .with_extensions(["xht", "ma"])
//!     .with_runtime_alias("malinajs", "malinajs/runtime.js");
//! // Add `Arc::new(plugin)` to the bundler's plugin list
//! ```

mod compiler;
mod css;
mod error;

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

pub use compiler::{CommandCompiler, CompileOptions, CompileOutput, CssOutput, TemplateCompiler};
pub use css::{CSS_SUFFIX, CssStore};
pub use error::{CompileError, Result};

/// Redirects a bare runtime import into `node_modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuntimeAlias {
    specifier: String,
    target: String,
}

/// Template compiler bridge for rolldown.
#[derive(Debug, Clone)]
pub struct TemplatePlugin {
    compiler: Arc<dyn TemplateCompiler>,
    css: Arc<CssStore>,
    extensions: Vec<String>,
    runtime: Option<RuntimeAlias>,
    root: PathBuf,
}

impl TemplatePlugin {
    /// Plugin for the project at `root`, handling `.xht` and `.ma` files.
    pub fn new(compiler: Arc<dyn TemplateCompiler>, root: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            css: Arc::new(CssStore::new()),
            extensions: vec!["xht".to_string(), "ma".to_string()],
            runtime: None,
            root: root.into(),
        }
    }

    /// Template extensions without the dot.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve `import ... from "<specifier>"` to `node_modules/<target>`.
    pub fn with_runtime_alias(
        mut self,
        specifier: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.runtime = Some(RuntimeAlias {
            specifier: specifier.into(),
            target: target.into(),
        });
        self
    }

    /// Stylesheets collected so far.
    pub fn css_store(&self) -> Arc<CssStore> {
        Arc::clone(&self.css)
    }

    pub fn is_template(&self, id: &str) -> bool {
        Path::new(id)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    /// Absolute path of a template import, if it exists on disk.
    fn resolve_template(&self, specifier: &str, importer: Option<&str>) -> Option<PathBuf> {
        let spec = Path::new(specifier);
        let candidate = if spec.is_absolute() {
            spec.to_path_buf()
        } else if specifier.starts_with('.') {
            let base = importer
                .and_then(|i| Path::new(i).parent())
                .unwrap_or(&self.root);
            base.join(spec)
        } else {
            return None;
        };
        let candidate = normalize(&candidate);
        candidate.is_file().then_some(candidate)
    }

    /// Location of the runtime alias target, searching `node_modules` upwards from the root.
    fn resolve_runtime(&self, specifier: &str) -> Option<PathBuf> {
        let alias = self.runtime.as_ref().filter(|a| a.specifier == specifier)?;
        let found = self
            .root
            .ancestors()
            .map(|dir| dir.join("node_modules").join(&alias.target))
            .find(|path| path.is_file());
        if found.is_none() {
            tracing::warn!(
                specifier = %alias.specifier,
                target = %alias.target,
                "runtime alias target not found in node_modules"
            );
        }
        found
    }

    /// Compile a template file into module code, recording its CSS.
    pub async fn compile_file(&self, id: &str) -> anyhow::Result<String> {
        let source = tokio::fs::read_to_string(id)
            .await
            .with_context(|| format!("Failed to read template: {id}"))?;

        let compiler = Arc::clone(&self.compiler);
        let options = CompileOptions::for_path(id);
        let output = tokio::task::spawn_blocking(move || compiler.compile(&source, &options))
            .await
            .context("Template compiler task panicked")?
            .with_context(|| format!("Failed to compile template: {id}"))?;

        Ok(self.finish(id, output))
    }

    /// Attach the CSS import to compiled code and update the store.
    fn finish(&self, id: &str, output: CompileOutput) -> String {
        let mut code = output.result.clone();
        match output.css() {
            Some(css) => {
                let css_id = self.css.insert(id, css);
                if !code.ends_with('\n') {
                    code.push('\n');
                }
                code.push_str(&format!("import \"{css_id}\";\n"));
            }
            None => self.css.remove(id),
        }
        code
    }
}

impl Plugin for TemplatePlugin {
    fn name(&self) -> Cow<'static, str> {
        "kiln-template".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let resolved = if CssStore::is_css_id(&specifier) {
            Some(specifier.clone())
        } else if let Some(runtime) = self.resolve_runtime(&specifier) {
            Some(runtime.to_string_lossy().into_owned())
        } else if self.is_template(&specifier) {
            self.resolve_template(&specifier, args.importer)
                .map(|p| p.to_string_lossy().into_owned())
        } else {
            None
        };

        async move {
            Ok(resolved.map(|id| HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let plugin = self.clone();

        async move {
            if CssStore::is_css_id(&id) {
                return Ok(plugin.css.get(&id).map(|css| HookLoadOutput {
                    code: css.into(),
                    module_type: Some(ModuleType::Css),
                    ..Default::default()
                }));
            }

            if !plugin.is_template(&id) {
                return Ok(None);
            }

            let code = plugin.compile_file(&id).await?;
            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FakeCompiler;

    impl TemplateCompiler for FakeCompiler {
        fn compile(&self, source: &str, options: &CompileOptions) -> Result<CompileOutput> {
            Ok(CompileOutput {
                result: format!("export default {:?};", options.name),
                css: CssOutput {
                    result: source.contains("<style>").then(|| "p{}".to_string()),
                },
            })
        }
    }

    fn plugin(root: &Path) -> TemplatePlugin {
        TemplatePlugin::new(Arc::new(FakeCompiler), root)
    }

    #[test]
    fn test_plugin_name() {
        let temp = TempDir::new().unwrap();
        assert_eq!(plugin(temp.path()).name(), "kiln-template");
    }

    #[test]
    fn test_is_template_uses_configured_extensions() {
        let temp = TempDir::new().unwrap();
        let p = plugin(temp.path()).with_extensions(["html"]);
        assert!(p.is_template("/a/B.html"));
        assert!(!p.is_template("/a/B.xht"));
    }

    #[test]
    fn test_resolve_template_relative_to_importer() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/pages")).unwrap();
        fs::write(temp.path().join("src/pages/About.xht"), "").unwrap();

        let importer = temp.path().join("src/routes.js");
        let resolved = plugin(temp.path())
            .resolve_template("./pages/About.xht", importer.to_str())
            .unwrap();
        assert_eq!(resolved, temp.path().join("src/pages/About.xht"));

        assert!(plugin(temp.path())
            .resolve_template("./pages/Missing.xht", importer.to_str())
            .is_none());
        assert!(plugin(temp.path())
            .resolve_template("some-package/About.xht", None)
            .is_none());
    }

    #[test]
    fn test_runtime_alias_searches_node_modules_upwards() {
        let temp = TempDir::new().unwrap();
        let runtime = temp.path().join("node_modules/malinajs/runtime.js");
        fs::create_dir_all(runtime.parent().unwrap()).unwrap();
        fs::write(&runtime, "").unwrap();
        let root = temp.path().join("app");
        fs::create_dir_all(&root).unwrap();

        let p = plugin(&root).with_runtime_alias("malinajs", "malinajs/runtime.js");
        assert_eq!(p.resolve_runtime("malinajs"), Some(runtime));
        assert_eq!(p.resolve_runtime("malinajs/other"), None);
    }

    #[tokio::test]
    async fn test_compile_file_appends_css_import() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Card.xht");
        fs::write(&file, "<p>hi</p><style>p{}</style>").unwrap();
        let id = file.to_string_lossy().into_owned();

        let p = plugin(temp.path());
        let code = p.compile_file(&id).await.unwrap();

        let css_id = CssStore::id_for(&id);
        assert_eq!(
            code,
            format!("export default \"Card\";\nimport \"{css_id}\";\n")
        );
        assert_eq!(p.css_store().get(&css_id).as_deref(), Some("p{}"));
    }

    #[tokio::test]
    async fn test_recompile_without_style_drops_css() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Card.xht");
        let id = file.to_string_lossy().into_owned();
        let p = plugin(temp.path());

        fs::write(&file, "<style>p{}</style>").unwrap();
        p.compile_file(&id).await.unwrap();
        assert_eq!(p.css_store().len(), 1);

        fs::write(&file, "<p/>").unwrap();
        let code = p.compile_file(&id).await.unwrap();
        assert!(!code.contains(CSS_SUFFIX));
        assert!(p.css_store().is_empty());
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let temp = TempDir::new().unwrap();
        let id = temp.path().join("Nope.xht").to_string_lossy().into_owned();
        let err = plugin(temp.path()).compile_file(&id).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../D.xht")),
            PathBuf::from("/a/b/D.xht")
        );
    }
}
