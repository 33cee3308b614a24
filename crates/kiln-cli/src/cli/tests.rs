use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(normalize_legacy_args(args.iter().copied()))
}

#[test]
fn test_no_flags_is_production_build() {
    let cli = parse(&["kiln"]).unwrap();
    assert_eq!(cli.mode(), Mode::Build);
    assert!(cli.config.is_none());
}

#[test]
fn test_watch_flags() {
    assert_eq!(parse(&["kiln", "-w"]).unwrap().mode(), Mode::Dev);
    assert_eq!(parse(&["kiln", "--watch"]).unwrap().mode(), Mode::Dev);
    assert_eq!(parse(&["kiln", "-watch"]).unwrap().mode(), Mode::Dev);
}

#[test]
fn test_legacy_build_flag_is_default_mode() {
    let cli = parse(&["kiln", "-build"]).unwrap();
    assert_eq!(cli.mode(), Mode::Build);
}

#[test]
fn test_serve_mode() {
    assert_eq!(parse(&["kiln", "--serve"]).unwrap().mode(), Mode::Serve);
}

#[test]
fn test_watch_conflicts_with_serve() {
    assert!(parse(&["kiln", "--watch", "--serve"]).is_err());
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    assert!(parse(&["kiln", "-v", "-q"]).is_err());
}

#[test]
fn test_port_zero_is_rejected() {
    assert!(parse(&["kiln", "--port", "0"]).is_err());
    assert_eq!(parse(&["kiln", "-p", "8080"]).unwrap().port, Some(8080));
}

#[test]
fn test_config_and_cwd() {
    let cli = parse(&["kiln", "-c", "alt.json", "--cwd", "/srv/app"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("alt.json")));
    assert_eq!(cli.project_root().unwrap(), PathBuf::from("/srv/app"));
}

#[test]
fn test_normalize_keeps_program_name_and_other_args() {
    let args = normalize_legacy_args(["-watch", "-watch", "-build", "-v"]);
    assert_eq!(
        args,
        vec![
            OsString::from("-watch"),
            OsString::from("--watch"),
            OsString::from("-v"),
        ]
    );
}
