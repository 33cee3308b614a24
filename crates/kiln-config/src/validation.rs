use crate::KilnConfig;
use crate::error::{ConfigError, Result};

impl KilnConfig {
    /// Check values serde accepts but kiln cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::invalid(
                "port",
                "0",
                "Use a port between 1 and 65535",
            ));
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::invalid(
                "extensions",
                "[]",
                "List at least one template extension, e.g. [\"xht\"]",
            ));
        }
        for ext in &self.extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(ConfigError::invalid(
                    "extensions",
                    ext.as_str(),
                    "Extensions are written without a dot, e.g. \"xht\"",
                ));
            }
        }

        if let Err(err) = glob::Pattern::new(&self.watch) {
            return Err(ConfigError::invalid(
                "watch",
                self.watch.as_str(),
                format!("Not a valid glob: {err}"),
            ));
        }

        if self.compiler.command.trim().is_empty() {
            return Err(ConfigError::invalid(
                "compiler.command",
                "\"\"",
                "Name the program that compiles templates, e.g. \"node\"",
            ));
        }

        if let Some(runtime) = &self.compiler.runtime {
            if runtime.specifier.is_empty() || runtime.target.is_empty() {
                return Err(ConfigError::invalid(
                    "compiler.runtime",
                    format!("{} -> {}", runtime.specifier, runtime.target),
                    "Both specifier and target are required",
                ));
            }
        }

        Ok(())
    }
}
