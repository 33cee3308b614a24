use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json},
};

use crate::KilnConfig;
use crate::error::{ConfigError, Result};

/// Config file looked up in the project root.
pub const CONFIG_FILE: &str = "kiln.config.json";

const ENV_PREFIX: &str = "KILN_";

/// Scalar fields that may be overridden from the environment (`KILN_PORT`, ...).
const ENV_KEYS: &[&str] = &["port", "outdir", "watch", "autoroute", "entry", "src"];

impl KilnConfig {
    /// Load and validate the configuration for the project at `root`.
    ///
    /// Priority: environment variables > config file > defaults. An explicit
    /// `config_path` (relative paths resolve against `root`) must exist; the
    /// default `kiln.config.json` is optional.
    ///
    /// Defaults come from serde attributes rather than a serialized layer so
    /// that `public` and `esbuild` never collide with a default key.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = Self::locate(root, config_path)? {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve which config file applies, if any.
    pub fn locate(root: &Path, config_path: Option<&Path>) -> Result<Option<PathBuf>> {
        match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    root.join(path)
                };
                if path.is_file() {
                    Ok(Some(path))
                } else {
                    Err(ConfigError::NotFound(path))
                }
            }
            None => {
                let path = root.join(CONFIG_FILE);
                Ok(path.is_file().then_some(path))
            }
        }
    }
}
