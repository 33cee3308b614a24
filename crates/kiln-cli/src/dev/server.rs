//! HTTP server for the output directory, with a websocket for live reload.
//!
//! Every request maps to a file under the output directory. Anything that is
//! not a readable file, `/` included, falls back to `index.html` so client-side
//! routes work on refresh. With live reload on, the fallback document gets the
//! reload client injected before `</head>`.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::dev::SharedState;
use crate::error::{CliError, Result};

/// Websocket endpoint the reload client connects to.
pub const RELOAD_PATH: &str = "/__kiln_reload__";

const INDEX_FILE: &str = "index.html";

/// Browser side of live reload: reload on any message, and after the server
/// goes away retry every 2 seconds, reloading once it is back.
pub const RELOAD_CLIENT: &str = r#"<script>
  (function () {
    var url = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/__kiln_reload__";
    var sock = new WebSocket(url);
    sock.onmessage = function () { location.reload(); };
    sock.onclose = function reconnect() {
      var retry = new WebSocket(url);
      retry.onopen = function () { location.reload(); };
      retry.onclose = function () { setTimeout(reconnect, 2000); };
    };
  })();
</script>"#;

/// Insert the reload client before the first `</head>`.
///
/// Documents without a `</head>` are returned unchanged.
pub fn inject_reload_client(html: &str) -> String {
    html.replacen("</head>", &format!("{RELOAD_CLIENT}</head>"), 1)
}

/// Content type for a file, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js" | "mjs") => "text/javascript",
        Some("json" | "map") => "application/json",
        Some("ico") => "image/x-icon",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Where a request path points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// A candidate file inside the output directory
    File(PathBuf),
    /// The fallback document
    Index,
    /// The path tried to leave the output directory
    Forbidden,
}

/// Map a URL path onto the output directory.
pub fn resolve_request(out_dir: &Path, url_path: &str) -> RequestTarget {
    let relative = url_path.trim_start_matches('/');
    if relative.is_empty() || relative.ends_with('/') {
        return RequestTarget::Index;
    }

    let relative = Path::new(relative);
    let confined = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !confined {
        return RequestTarget::Forbidden;
    }
    if relative.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE)
        && relative.parent() == Some(Path::new(""))
    {
        return RequestTarget::Index;
    }
    RequestTarget::File(out_dir.join(relative))
}

/// Dev server bound to one port.
pub struct DevServer {
    addr: SocketAddr,
    state: SharedState,
}

impl DevServer {
    /// Server on `0.0.0.0:<port>`.
    pub fn new(port: u16, state: SharedState) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            state,
        }
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.addr.port())
    }

    /// Bind and serve until the task is dropped.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {e}", self.addr)))?;
        crate::ui::success(&format!("Server running at {}", self.url()));
        serve(listener, self.state).await
    }
}

/// Serve `state` on an already bound listener.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| CliError::Server(format!("Server error: {e}")))
}

/// Routes: the reload socket when live reload is on, files for everything else.
pub fn router(state: SharedState) -> Router {
    let mut router = Router::new();
    if state.live_reload() {
        router = router.route(RELOAD_PATH, get(handle_reload_socket));
    }
    router
        .fallback(handle_request)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    match resolve_request(state.out_dir(), uri.path()) {
        RequestTarget::File(path) => match tokio::fs::read(&path).await {
            Ok(content) => {
                tracing::debug!(path = %uri.path(), "served");
                (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, content_type(&path)),
                        (header::CACHE_CONTROL, "no-cache"),
                    ],
                    content,
                )
                    .into_response()
            }
            Err(_) => serve_index(&state).await,
        },
        RequestTarget::Index => serve_index(&state).await,
        RequestTarget::Forbidden => {
            tracing::warn!(path = %uri.path(), "rejected path outside the output directory");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

async fn serve_index(state: &SharedState) -> Response {
    let index = state.out_dir().join(INDEX_FILE);
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => {
            let html = if state.live_reload() {
                inject_reload_client(&html)
            } else {
                html
            };
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                html,
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(path = %index.display(), error = %err, "cannot read fallback document");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Internal Server Error",
            )
                .into_response()
        }
    }
}

async fn handle_reload_socket(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| reload_session(state, socket))
}

/// Forward broadcasts to one browser tab until either side closes.
async fn reload_session(state: SharedState, socket: WebSocket) {
    let (id, mut rx) = state.register_client();
    tracing::debug!(client = id, "reload client connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                if sender.send(Message::Text(message.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.unregister_client(id);
    tracing::debug!(client = id, "reload client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_first_head_close() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = inject_reload_client(html);
        assert!(out.contains(&format!("{RELOAD_CLIENT}</head>")));
        assert_eq!(out.matches("</head>").count(), 1);
        assert!(out.contains(RELOAD_PATH));
    }

    #[test]
    fn test_inject_without_head_is_noop() {
        assert_eq!(inject_reload_client("<p>hi</p>"), "<p>hi</p>");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("main.js")), "text/javascript");
        assert_eq!(content_type(Path::new("a/b.CSS")), "text/css");
        assert_eq!(content_type(Path::new("main.js.map")), "application/json");
        assert_eq!(content_type(Path::new("font.woff2")), "font/woff2");
        assert_eq!(content_type(Path::new("app.wasm")), "application/wasm");
        assert_eq!(content_type(Path::new("LICENSE")), "application/octet-stream");
    }

    #[test]
    fn test_resolve_request() {
        let out = Path::new("/srv/public");
        assert_eq!(resolve_request(out, "/"), RequestTarget::Index);
        assert_eq!(resolve_request(out, "/index.html"), RequestTarget::Index);
        assert_eq!(resolve_request(out, "/blog/"), RequestTarget::Index);
        assert_eq!(
            resolve_request(out, "/main.js"),
            RequestTarget::File(PathBuf::from("/srv/public/main.js"))
        );
        assert_eq!(
            resolve_request(out, "/docs/index.html"),
            RequestTarget::File(PathBuf::from("/srv/public/docs/index.html"))
        );
        assert_eq!(resolve_request(out, "/../secret"), RequestTarget::Forbidden);
        assert_eq!(resolve_request(out, "/a/../../secret"), RequestTarget::Forbidden);
    }
}
