//! The template compiler seam and its external-process implementation.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Per-file inputs passed alongside the template source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOptions {
    /// Absolute path of the template
    pub path: PathBuf,
    /// Component name, the file stem
    pub name: String,
}

impl CompileOptions {
    /// Options for the template at `path`.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("component")
            .to_string();
        Self { path, name }
    }
}

/// Stylesheet produced by a compile, if the template has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CssOutput {
    #[serde(default)]
    pub result: Option<String>,
}

/// JavaScript module code and optional CSS for one template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileOutput {
    pub result: String,
    #[serde(default)]
    pub css: CssOutput,
}

impl CompileOutput {
    /// Non-empty CSS text, if any.
    pub fn css(&self) -> Option<&str> {
        self.css.result.as_deref().filter(|css| !css.trim().is_empty())
    }
}

/// Compiles template source into a JavaScript module.
///
/// Implementations are invoked from bundler worker threads and may block.
pub trait TemplateCompiler: Send + Sync + fmt::Debug {
    fn compile(&self, source: &str, options: &CompileOptions) -> Result<CompileOutput>;
}

#[derive(Serialize)]
struct CompileRequest<'a> {
    source: &'a str,
    path: &'a Path,
    name: &'a str,
}

/// Runs an external program once per template.
///
/// The program receives `{"source", "path", "name"}` as JSON on stdin and must
/// print `{"result": "...", "css": {"result": "..." | null}}` on stdout. A
/// non-zero exit is a compile failure; stderr becomes the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Directory the program runs in, usually the project root.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TemplateCompiler for CommandCompiler {
    fn compile(&self, source: &str, options: &CompileOptions) -> Result<CompileOutput> {
        let path = options.path.clone();
        let request = serde_json::to_vec(&CompileRequest {
            source,
            path: &options.path,
            name: &options.name,
        })
        .map_err(|err| CompileError::Io {
            path: path.clone(),
            source: std::io::Error::other(err),
        })?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| CompileError::Spawn {
            command: self.command_line(),
            source,
        })?;

        // Feed stdin from a separate thread so a chatty compiler cannot
        // deadlock against a full stdout pipe.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&request),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            output.and_then(|output| {
                // A compiler that exits early closes its stdin; its exit
                // status is the better diagnostic.
                match written {
                    Err(err) if output.status.success() => Err(err),
                    _ => Ok(output),
                }
            })
        })
        .map_err(|source| CompileError::Io {
            path: path.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                path,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|source| CompileError::InvalidOutput { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_name_is_file_stem() {
        let options = CompileOptions::for_path("/p/src/pages/About.xht");
        assert_eq!(options.name, "About");
    }

    #[test]
    fn test_output_css_ignores_blank() {
        let output: CompileOutput =
            serde_json::from_str(r#"{"result":"x","css":{"result":"  "}}"#).unwrap();
        assert_eq!(output.css(), None);

        let output: CompileOutput = serde_json::from_str(r#"{"result":"x"}"#).unwrap();
        assert_eq!(output.css(), None);

        let output: CompileOutput =
            serde_json::from_str(r#"{"result":"x","css":{"result":"a{}"}}"#).unwrap();
        assert_eq!(output.css(), Some("a{}"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_compiler_round_trip() {
        let compiler = CommandCompiler::new("sh").args([
            "-c",
            r#"cat >/dev/null; printf '{"result":"export default 1;","css":{"result":"h1{}"}}'"#,
        ]);
        let output = compiler
            .compile("<h1>hi</h1>", &CompileOptions::for_path("/tmp/A.xht"))
            .unwrap();
        assert_eq!(output.result, "export default 1;");
        assert_eq!(output.css(), Some("h1{}"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_compiler_receives_request_json() {
        // Echo the request back as the module body
        let compiler = CommandCompiler::new("sh").args([
            "-c",
            r#"req=$(cat); printf '{"result":%s}' "$(printf '%s' "$req" | sed 's/"/\\"/g; s/^/"/; s/$/"/')""#,
        ]);
        let output = compiler
            .compile("<p/>", &CompileOptions::for_path("/tmp/Card.xht"))
            .unwrap();
        assert!(output.result.contains("\"name\":\"Card\""));
        assert!(output.result.contains("\"source\":\"<p/>\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_compiler_failure_carries_stderr() {
        let compiler = CommandCompiler::new("sh").args([
            "-c",
            "cat >/dev/null; echo 'unexpected token' >&2; exit 3",
        ]);
        let err = compiler
            .compile("<", &CompileOptions::for_path("/tmp/Bad.xht"))
            .unwrap_err();
        match err {
            CompileError::Failed { status, stderr, .. } => {
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "unexpected token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_compiler_rejects_garbage() {
        let compiler = CommandCompiler::new("sh").args(["-c", "cat >/dev/null; echo not-json"]);
        let err = compiler
            .compile("", &CompileOptions::for_path("/tmp/A.xht"))
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidOutput { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let compiler = CommandCompiler::new("kiln-no-such-compiler-binary");
        let err = compiler
            .compile("", &CompileOptions::for_path("/tmp/A.xht"))
            .unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }
}
