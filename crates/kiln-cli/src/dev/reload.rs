//! Live reload: watch the output directory and tell every browser to reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glob::{MatchOptions, Pattern};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dev::{RELOAD_MESSAGE, SharedState};
use crate::error::{CliError, Result, ResultExt};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Decides which output files trigger a reload.
#[derive(Debug, Clone)]
pub struct ReloadFilter {
    out_dir: PathBuf,
    pattern: Pattern,
}

impl ReloadFilter {
    /// Filter for files under `out_dir` matching the `watch` glob.
    pub fn new(out_dir: impl Into<PathBuf>, watch: &str) -> Result<Self> {
        let pattern = Pattern::new(watch)
            .map_err(|e| CliError::InvalidArgument(format!("watch glob '{watch}': {e}")))?;
        Ok(Self {
            out_dir: out_dir.into(),
            pattern,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.strip_prefix(&self.out_dir)
            .is_ok_and(|relative| self.pattern.matches_path_with(relative, MATCH_OPTIONS))
    }
}

/// Fans a single `reload` out to every open client whenever matching output changes.
pub struct LiveReloadBroadcaster {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    task: JoinHandle<()>,
}

impl LiveReloadBroadcaster {
    /// Start watching `state.out_dir()`, creating it if needed.
    ///
    /// Changes within `debounce` of each other produce one broadcast.
    pub fn start(state: SharedState, watch: &str, debounce: Duration) -> Result<Self> {
        std::fs::create_dir_all(state.out_dir()).with_path(state.out_dir())?;
        let out_dir = state
            .out_dir()
            .canonicalize()
            .unwrap_or_else(|_| state.out_dir().to_path_buf());
        let filter = ReloadFilter::new(&out_dir, watch)?;

        // One pending reload is enough; further changes coalesce into it.
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed = events.iter().any(|event| {
                        !matches!(event.event.kind, EventKind::Access(_))
                            && event.event.paths.iter().any(|p| filter.matches(p))
                    });
                    if changed {
                        let _ = tx.try_send(());
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(%error, "output watcher error");
                    }
                }
            }
        })?;
        debouncer.watch(&out_dir, RecursiveMode::Recursive)?;
        tracing::debug!(dir = %out_dir.display(), "watching output for reload");

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let clients = state.broadcast(RELOAD_MESSAGE);
                tracing::info!(clients, "output changed, reloading");
            }
        });

        Ok(Self {
            _debouncer: debouncer,
            task,
        })
    }
}

impl Drop for LiveReloadBroadcaster {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::DevServerState;
    use std::sync::Arc;

    #[test]
    fn test_default_glob_matches_everything_in_outdir() {
        let filter = ReloadFilter::new("/srv/public", "**/*").unwrap();
        assert!(filter.matches(Path::new("/srv/public/main.js")));
        assert!(filter.matches(Path::new("/srv/public/img/logo.png")));
        assert!(!filter.matches(Path::new("/srv/src/main.js")));
    }

    #[test]
    fn test_extension_glob() {
        let filter = ReloadFilter::new("/srv/public", "**/*.css").unwrap();
        assert!(filter.matches(Path::new("/srv/public/main.css")));
        assert!(filter.matches(Path::new("/srv/public/themes/dark.css")));
        assert!(!filter.matches(Path::new("/srv/public/main.js")));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(ReloadFilter::new("/srv/public", "[").is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_output_change_broadcasts_reload() {
        let temp = tempfile::TempDir::new().unwrap();
        let out_dir = temp.path().join("public");
        let state = Arc::new(DevServerState::new(out_dir.clone(), true));
        let (_, mut rx) = state.register_client();

        let _broadcaster =
            LiveReloadBroadcaster::start(Arc::clone(&state), "**/*", Duration::from_millis(20))
                .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(out_dir.join("main.js"), "console.log(1)").unwrap();

        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("reload"));
    }
}
