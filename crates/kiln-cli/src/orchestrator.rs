//! The build pipeline: one bundler context per run, rebuilt on demand.
//!
//! A [`BuildOrchestrator`] owns a [`BuildContext`], the settings computed from
//! `kiln.config.json` plus the template plugin instance. The plugin carries
//! its CSS store across rebuilds, so watch mode keeps one context for the
//! whole session while production mode builds once and drops it.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kiln_config::KilnConfig;
use kiln_plugin_template::{CommandCompiler, TemplateCompiler, TemplatePlugin};
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform,
    RawMinifyOptions, SourceMapType,
};
use rolldown_common::Output;
use rolldown_plugin::__inner::SharedPluginable;
use serde_json::{Map, Value};

use crate::error::{BuildError, Result};

/// Production builds once and minifies; development rebuilds and does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Production,
    Development,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }
}

/// Keys of the `bundler` config object that kiln understands.
pub const OVERRIDE_KEYS: [&str; 7] = [
    "entry",
    "outfile",
    "minify",
    "sourcemap",
    "format",
    "external",
    "define",
];

/// Bundler settings after config overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Absolute entry module
    pub entry: PathBuf,
    /// Absolute path of the entry chunk
    pub outfile: PathBuf,
    pub minify: bool,
    pub sourcemap: bool,
    /// `esm`, `iife` or `cjs`
    pub format: String,
    pub external: Vec<String>,
    /// Global replacements, values are JavaScript expressions
    pub define: BTreeMap<String, String>,
}

impl BuildSettings {
    /// Compute the settings for `mode`, then merge `config.bundler` over them.
    pub fn from_config(config: &KilnConfig, root: &Path, mode: BuildMode) -> Result<Self> {
        let mut settings = Self {
            entry: root.join(&config.entry),
            outfile: config.out_dir(root).join("main.js"),
            minify: mode.is_production(),
            sourcemap: false,
            format: "iife".to_string(),
            external: Vec::new(),
            define: BTreeMap::from([(
                "process".to_string(),
                process_define(mode, &config.env),
            )]),
        };
        settings.apply_overrides(root, &config.bundler)?;
        Ok(settings)
    }

    /// Merge a JSON override object; unknown keys are logged and skipped.
    pub fn apply_overrides(&mut self, root: &Path, overrides: &Map<String, Value>) -> Result<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "entry" => self.entry = root.join(expect_str(key, value)?),
                "outfile" => self.outfile = root.join(expect_str(key, value)?),
                "minify" => self.minify = expect_bool(key, value)?,
                "sourcemap" => self.sourcemap = expect_bool(key, value)?,
                "format" => {
                    let format = expect_str(key, value)?;
                    if parse_format(format).is_none() {
                        return Err(invalid(key, value, "Use \"esm\", \"iife\" or \"cjs\""));
                    }
                    self.format = format.to_string();
                }
                "external" => {
                    self.external = value
                        .as_array()
                        .and_then(|items| {
                            items
                                .iter()
                                .map(|item| item.as_str().map(str::to_string))
                                .collect::<Option<Vec<_>>>()
                        })
                        .ok_or_else(|| invalid(key, value, "Use an array of module names"))?;
                }
                "define" => {
                    let entries = value
                        .as_object()
                        .ok_or_else(|| invalid(key, value, "Use an object of name → expression"))?;
                    for (name, expr) in entries {
                        let expr = match expr {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        self.define.insert(name.clone(), expr);
                    }
                }
                _ => {
                    tracing::warn!(
                        key = %key,
                        known = %OVERRIDE_KEYS.join(", "),
                        "ignoring unknown bundler option"
                    );
                }
            }
        }
        Ok(())
    }

    fn output_format(&self) -> OutputFormat {
        parse_format(&self.format).unwrap_or(OutputFormat::Iife)
    }

    /// Directory receiving the entry chunk and its siblings.
    pub fn out_dir(&self) -> PathBuf {
        self.outfile
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn entry_name(&self) -> String {
        self.outfile
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("main")
            .to_string()
    }

    /// Rolldown options for one generate pass rooted at `root`.
    pub fn bundler_options(&self, root: &Path) -> BundlerOptions {
        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some(self.entry_name()),
                import: self.entry.to_string_lossy().into_owned(),
            }]),
            cwd: Some(root.to_path_buf()),
            format: Some(self.output_format()),
            platform: Some(Platform::Browser),
            minify: Some(RawMinifyOptions::from(self.minify)),
            sourcemap: self.sourcemap.then_some(SourceMapType::File),
            external: (!self.external.is_empty()).then(|| IsExternal::from(self.external.clone())),
            define: Some(self.define.clone().into_iter().collect()),
            ..Default::default()
        }
    }
}

/// `process` replacement: `{"env":{"production":<bool>, ...env}}`.
pub fn process_define(mode: BuildMode, env: &BTreeMap<String, Value>) -> String {
    let mut vars = Map::new();
    vars.insert("production".to_string(), Value::Bool(mode.is_production()));
    vars.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut process = Map::new();
    process.insert("env".to_string(), Value::Object(vars));
    Value::Object(process).to_string()
}

fn parse_format(format: &str) -> Option<OutputFormat> {
    match format {
        "esm" => Some(OutputFormat::Esm),
        "iife" => Some(OutputFormat::Iife),
        "cjs" => Some(OutputFormat::Cjs),
        _ => None,
    }
}

fn invalid(key: &str, value: &Value, hint: &str) -> crate::CliError {
    BuildError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    }
    .into()
}

fn expect_str<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, value, "Use a string"))
}

fn expect_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(key, value, "Use true or false"))
}

/// Settings and plugin instance shared by every build of one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    root: PathBuf,
    settings: BuildSettings,
    plugin: TemplatePlugin,
}

impl BuildContext {
    pub fn new(root: PathBuf, settings: BuildSettings, plugin: TemplatePlugin) -> Self {
        Self {
            root,
            settings,
            plugin,
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn plugin(&self) -> &TemplatePlugin {
        &self.plugin
    }
}

/// Files written by one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Output paths with their sizes in bytes
    pub outputs: Vec<(PathBuf, u64)>,
    pub duration: Duration,
}

/// Runs builds for one kiln invocation.
#[derive(Debug)]
pub struct BuildOrchestrator {
    context: BuildContext,
    mode: BuildMode,
}

impl BuildOrchestrator {
    /// Orchestrator using the compiler command from `config.compiler`.
    pub fn new(config: &KilnConfig, root: &Path, mode: BuildMode) -> Result<Self> {
        let compiler = CommandCompiler::new(&config.compiler.command)
            .args(config.compiler.args.iter().cloned())
            .current_dir(root);
        Self::with_compiler(config, root, mode, Arc::new(compiler))
    }

    /// Orchestrator with an explicit template compiler.
    pub fn with_compiler(
        config: &KilnConfig,
        root: &Path,
        mode: BuildMode,
        compiler: Arc<dyn TemplateCompiler>,
    ) -> Result<Self> {
        let settings = BuildSettings::from_config(config, root, mode)?;
        let mut plugin =
            TemplatePlugin::new(compiler, root).with_extensions(config.extensions.iter().cloned());
        if let Some(runtime) = &config.compiler.runtime {
            plugin = plugin.with_runtime_alias(&runtime.specifier, &runtime.target);
        }

        tracing::debug!(?settings, ?mode, "build context ready");
        Ok(Self {
            context: BuildContext::new(root.to_path_buf(), settings, plugin),
            mode,
        })
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Bundle the entry and write every chunk and asset.
    pub async fn build(&self) -> Result<BuildSummary> {
        let start = Instant::now();
        let settings = &self.context.settings;

        if !settings.entry.is_file() {
            return Err(BuildError::EntryNotFound(settings.entry.clone()).into());
        }

        let options = settings.bundler_options(&self.context.root);
        let plugins: Vec<SharedPluginable> = vec![Arc::new(self.context.plugin.clone())];
        let mut bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(plugins)
            .build()
            .map_err(|e| BuildError::bundler(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| BuildError::bundler(&e))?;

        let out_dir = settings.out_dir();
        let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        for output in &bundle.assets {
            match output {
                Output::Chunk(chunk) => {
                    let target = if chunk.is_entry {
                        settings.outfile.clone()
                    } else {
                        confined(&out_dir, chunk.filename.as_str())?
                    };
                    files.push((target, chunk.code.as_bytes().to_vec()));
                }
                Output::Asset(asset) => {
                    let target = confined(&out_dir, asset.filename.as_str())?;
                    files.push((target, asset.source.as_bytes().to_vec()));
                }
            }
        }

        let mut outputs = Vec::with_capacity(files.len());
        for (path, content) in files {
            write_output(&path, &content).await?;
            outputs.push((path, content.len() as u64));
        }

        Ok(BuildSummary {
            outputs,
            duration: start.elapsed(),
        })
    }
}

/// `out_dir/filename`, rejecting names that climb out of it.
fn confined(out_dir: &Path, filename: &str) -> Result<PathBuf> {
    let relative = Path::new(filename);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BuildError::OutsideOutdir(filename.to_string()).into());
    }
    Ok(out_dir.join(relative))
}

async fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let write = async {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    };
    write.await.map_err(|source| {
        crate::CliError::from(BuildError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    })
}
