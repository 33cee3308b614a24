use std::path::PathBuf;

pub fn default_port() -> u16 {
    3000
}

pub fn default_outdir() -> PathBuf {
    PathBuf::from("public")
}

pub fn default_watch() -> String {
    "**/*".to_string()
}

pub fn default_autoroute() -> bool {
    true
}

pub fn default_entry() -> PathBuf {
    PathBuf::from("src/main.js")
}

pub fn default_src() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_extensions() -> Vec<String> {
    vec!["xht".to_string(), "ma".to_string()]
}

pub fn default_debounce_ms() -> u64 {
    50
}

pub fn default_compiler_command() -> String {
    "node".to_string()
}

pub fn default_compiler_args() -> Vec<String> {
    vec!["kiln.compiler.mjs".to_string()]
}
