//! Configuration for kiln projects.
//!
//! Settings are read once at startup from `kiln.config.json` in the project
//! root, layered over built-in defaults and overridden by `KILN_*`
//! environment variables. Every field has a default, so the file is optional.
//!
//! ```json
//! {
//!   "port": 3000,
//!   "outdir": "public",
//!   "watch": "**/*.css",
//!   "autoroute": true,
//!   "env": { "apiUrl": "https://example.test" },
//!   "bundler": { "sourcemap": true },
//!   "compiler": {
//!     "command": "node",
//!     "args": ["kiln.compiler.mjs"],
//!     "runtime": { "specifier": "malinajs", "target": "malinajs/runtime.js" }
//!   }
//! }
//! ```

mod defaults;
mod error;
mod loading;
mod validation;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use defaults::*;
pub use error::{ConfigError, Result};
pub use loading::CONFIG_FILE;

/// Project configuration, as found in `kiln.config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KilnConfig {
    /// Dev server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Output directory served by the dev server and written by builds
    #[serde(default = "default_outdir", alias = "public")]
    pub outdir: PathBuf,

    /// Glob (relative to `outdir`) of output files that trigger a browser reload
    #[serde(default = "default_watch")]
    pub watch: String,

    /// Bundler overrides merged over the computed build settings
    #[serde(default, alias = "esbuild", skip_serializing_if = "serde_json::Map::is_empty")]
    pub bundler: serde_json::Map<String, serde_json::Value>,

    /// Generate barrels and the route table
    #[serde(default = "default_autoroute")]
    pub autoroute: bool,

    /// Build-time constants exposed as `process.env.<key>`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, serde_json::Value>,

    /// Bundle entry, relative to the project root
    #[serde(default = "default_entry")]
    pub entry: PathBuf,

    /// Source root holding `pages`, `components` and `modules`
    #[serde(default = "default_src")]
    pub src: PathBuf,

    /// Template extensions without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Window for coalescing filesystem events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Template compiler invocation
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// External template compiler process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program to run
    #[serde(default = "default_compiler_command")]
    pub command: String,

    /// Arguments passed before any input
    #[serde(default = "default_compiler_args")]
    pub args: Vec<String>,

    /// Bare import of the component runtime, redirected into `node_modules`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeAlias>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: default_compiler_command(),
            args: default_compiler_args(),
            runtime: None,
        }
    }
}

/// Maps `import ... from "<specifier>"` to `node_modules/<target>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeAlias {
    pub specifier: String,
    pub target: String,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            outdir: default_outdir(),
            watch: default_watch(),
            bundler: serde_json::Map::new(),
            autoroute: default_autoroute(),
            env: BTreeMap::new(),
            entry: default_entry(),
            src: default_src(),
            extensions: default_extensions(),
            debounce_ms: default_debounce_ms(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl KilnConfig {
    /// `src` resolved against `root`.
    pub fn src_dir(&self, root: &std::path::Path) -> PathBuf {
        root.join(&self.src)
    }

    /// `outdir` resolved against `root`.
    pub fn out_dir(&self, root: &std::path::Path) -> PathBuf {
        root.join(&self.outdir)
    }

    /// Example file content, used by docs and tests.
    pub fn example_config() -> String {
        let example = Self {
            env: BTreeMap::from([(
                "apiUrl".to_string(),
                serde_json::Value::String("https://example.test".to_string()),
            )]),
            compiler: CompilerConfig {
                runtime: Some(RuntimeAlias {
                    specifier: "malinajs".to_string(),
                    target: "malinajs/runtime.js".to_string(),
                }),
                ..CompilerConfig::default()
            },
            ..Self::default()
        };
        serde_json::to_string_pretty(&example).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_empty_document() {
        let parsed: KilnConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, KilnConfig::default());
        assert_eq!(parsed.port, 3000);
        assert_eq!(parsed.outdir, PathBuf::from("public"));
        assert!(parsed.autoroute);
    }

    #[test]
    fn test_legacy_aliases() {
        let parsed: KilnConfig =
            serde_json::from_str(r#"{"public":"dist","esbuild":{"sourcemap":true}}"#).unwrap();
        assert_eq!(parsed.outdir, PathBuf::from("dist"));
        assert_eq!(parsed.bundler["sourcemap"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_unknown_top_level_key_rejected_but_bundler_is_open() {
        assert!(serde_json::from_str::<KilnConfig>(r#"{"prot":3000}"#).is_err());
        assert!(serde_json::from_str::<KilnConfig>(r#"{"bundler":{"anything":1}}"#).is_ok());
    }

    #[test]
    fn test_camel_case_keys() {
        let value = serde_json::to_value(KilnConfig::default()).unwrap();
        assert!(value.get("debounceMs").is_some());
        assert!(value.get("debounce_ms").is_none());
        assert!(value.get("bundler").is_none());
    }

    #[test]
    fn test_example_config_parses() {
        let parsed: KilnConfig = serde_json::from_str(&KilnConfig::example_config()).unwrap();
        assert_eq!(
            parsed.compiler.runtime.unwrap().target,
            "malinajs/runtime.js"
        );
    }
}
