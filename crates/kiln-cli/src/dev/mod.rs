//! Development mode: file serving, live reload and source watching.
//!
//! - [`DevServer`] serves the output directory and the reload websocket
//! - [`LiveReloadBroadcaster`] watches the output and pushes `reload`
//! - [`SourceWatcher`] batches source changes for regeneration and rebuilds

pub mod reload;
pub mod server;
pub mod state;
pub mod watcher;

pub use reload::{LiveReloadBroadcaster, ReloadFilter};
pub use server::{DevServer, RELOAD_CLIENT, RELOAD_PATH, RequestTarget, content_type, inject_reload_client};
pub use state::{ClientRegistry, DevServerState, RELOAD_MESSAGE, SharedState};
pub use watcher::SourceWatcher;
