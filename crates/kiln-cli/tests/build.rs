//! Integration tests for the build pipeline.
//!
//! These projects contain no templates, so the template compiler is never run.

use kiln_cli::commands::{Project, build};
use kiln_cli::{BuildMode, BuildOrchestrator};
use kiln_config::KilnConfig;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(root: &Path) -> Project {
    Project {
        root: root.to_path_buf(),
        config: KilnConfig::load(root, None).unwrap(),
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_build_generates_barrels_and_bundles_entry() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "src/components/greet.js", r#"export const greet = () => "hello from kiln";"#);
    write(
        root,
        "src/main.js",
        r#"import { greet } from "./components/index.js";
document.title = greet();"#,
    );

    build::run(&project(root)).await.unwrap();

    let barrel = fs::read_to_string(root.join("src/components/index.js")).unwrap();
    assert!(barrel.contains("./greet.js"));

    let bundle = fs::read_to_string(root.join("public/main.js")).unwrap();
    assert!(bundle.contains("hello from kiln"));
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_outfile_override_is_honored() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "src/main.js", "document.title = 'custom';");
    write(
        root,
        "kiln.config.json",
        r#"{ "autoroute": false, "bundler": { "outfile": "public/js/app.js" } }"#,
    );

    build::run(&project(root)).await.unwrap();

    assert!(root.join("public/js/app.js").is_file());
    assert!(!root.join("public/main.js").exists());
    assert!(!root.join("src/routes.js").exists());
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_development_rebuild_picks_up_changes() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "src/main.js", "document.title = 'first version';");

    let project = project(root);
    let orchestrator =
        BuildOrchestrator::new(&project.config, &project.root, BuildMode::Development).unwrap();

    let summary = orchestrator.build().await.unwrap();
    assert!(!summary.outputs.is_empty());
    let first = fs::read_to_string(root.join("public/main.js")).unwrap();
    assert!(first.contains("first version"));

    write(root, "src/main.js", "document.title = 'second version';");
    orchestrator.build().await.unwrap();
    let second = fs::read_to_string(root.join("public/main.js")).unwrap();
    assert!(second.contains("second version"));
    assert!(!second.contains("first version"));
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn test_bundler_error_is_reported() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "src/main.js", r#"import { nope } from "./missing.js"; nope();"#);

    let err = build::run(&project(root)).await.unwrap_err();
    assert!(matches!(err, kiln_cli::CliError::Build(_)), "{err}");
}
