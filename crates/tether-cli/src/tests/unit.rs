//! Entrypoint behaviour that needs no server.

use std::ffi::OsString;
use std::process::ExitCode;

use tether_config::{Config, ConfigError, LauncherPaths};

use crate::{AppError, ConfigLoader, run_with_loader};

struct FailingLoader;

impl ConfigLoader for FailingLoader {
    fn load(&self) -> Result<(Config, LauncherPaths), AppError> {
        Err(AppError::LoadConfiguration(ConfigError::EmptyServerCommand))
    }
}

fn invoke(args: &[&str]) -> (ExitCode, String, String) {
    let args: Vec<OsString> = std::iter::once("tether")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_with_loader(args, &mut stdout, &mut stderr, &FailingLoader);
    (
        code,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

#[test]
fn help_goes_to_stdout_and_succeeds() {
    let (code, stdout, stderr) = invoke(&["--help"]);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("--mode"), "{stdout}");
    assert!(stderr.is_empty());
}

#[test]
fn unknown_mode_is_a_usage_error() {
    let (code, stdout, stderr) = invoke(&["--mode", "bluetooth"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("bluetooth"), "{stderr}");
}

#[test]
fn configuration_failure_is_reported_before_spawning() {
    let (code, _, stderr) = invoke(&["--mode", "local"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.starts_with("❌ failed to load configuration"), "{stderr}");
}
