//! Integration tests for Settings loading with layered precedence.
//!
//! Every test points `XDG_CONFIG_HOME` at an empty temp directory, so no global
//! config is found and only the local file and environment layers apply over the
//! compiled defaults. Tests touching process env hold `ENV_LOCK`.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rstest::rstest;
use tempfile::TempDir;

use optset::application::ApplicationError;
#[cfg(target_os = "linux")]
use optset::config::global_config_path;
use optset::config::{OutputFormat, Settings};
use optset::domain::{MAX_LEVEL_LENGTH, MAX_OPTION_LENGTH};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize env access and hide any real global config.
#[allow(dead_code)]
struct IsolatedEnv {
    _guard: MutexGuard<'static, ()>,
    xdg: TempDir,
}

impl IsolatedEnv {
    fn new() -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg = TempDir::new().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", xdg.path());
        Self { _guard: guard, xdg }
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("optset.toml");
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_no_config_files_when_load_then_defaults() {
    let _env = IsolatedEnv::new();

    let settings = Settings::load(None).expect("load settings");

    assert_eq!(settings.limits.max_level_length, MAX_LEVEL_LENGTH);
    assert_eq!(settings.limits.max_option_length, MAX_OPTION_LENGTH);
}

/// XDG_CONFIG_HOME only steers the global path on Linux.
#[cfg(target_os = "linux")]
#[test]
fn given_global_config_when_load_then_local_config_wins() {
    // Arrange
    let env = IsolatedEnv::new();
    let global_dir = env.xdg.path().join("optset");
    assert_eq!(global_config_path().unwrap(), global_dir.join("optset.toml"));
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("optset.toml"),
        "[limits]\nmax_level_length = 10\nmax_option_length = 11\n",
    )
    .unwrap();
    let local_dir = TempDir::new().unwrap();
    let local = write_config(&local_dir, "[limits]\nmax_option_length = 30\n");

    // Act
    let settings = Settings::load(Some(&local)).expect("load settings");

    // Assert
    assert_eq!(settings.limits.max_level_length, 10);
    assert_eq!(settings.limits.max_option_length, 30);
}

#[test]
fn given_local_config_with_limits_when_load_then_overrides_defaults() {
    // Arrange
    let _env = IsolatedEnv::new();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[limits]
max_option_length = 30
"#,
    );

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert: given field replaced, others keep their defaults
    assert_eq!(settings.limits.max_option_length, 30);
    assert_eq!(settings.limits.max_level_length, MAX_LEVEL_LENGTH);
    assert_eq!(settings.limits.to_limits().max_option_length, 30);
}

#[test]
fn given_zero_limit_in_config_when_load_then_config_error() {
    let _env = IsolatedEnv::new();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[limits]
max_level_length = 0
"#,
    );

    let result = Settings::load(Some(&path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_config_when_load_then_config_error_names_file() {
    let _env = IsolatedEnv::new();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[limits\nmax_level_length = ");

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains("optset.toml"));
}

#[test]
fn given_missing_local_config_when_load_then_config_error() {
    let _env = IsolatedEnv::new();
    let dir = TempDir::new().unwrap();

    let result = Settings::load(Some(&dir.path().join("absent.toml")));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_env_var_when_load_then_env_overrides_local_config() {
    // Arrange
    let _env = IsolatedEnv::new();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[limits]
max_option_length = 30

[output]
format = "tree"
"#,
    );
    std::env::set_var("OPTSET__OUTPUT__FORMAT", "json");
    std::env::set_var("OPTSET__LIMITS__MAX_OPTION_LENGTH", "12");

    // Act
    let settings = Settings::load(Some(&path));
    std::env::remove_var("OPTSET__OUTPUT__FORMAT");
    std::env::remove_var("OPTSET__LIMITS__MAX_OPTION_LENGTH");

    // Assert
    let settings = settings.unwrap();
    assert_eq!(settings.output.format, OutputFormat::Json);
    assert_eq!(settings.limits.max_option_length, 12);
}

#[rstest]
#[case::not_a_number("OPTSET__LIMITS__MAX_OPTION_LENGTH", "abc")]
#[case::negative("OPTSET__LIMITS__MAX_OPTION_LENGTH", "-5")]
#[case::level_not_a_number("OPTSET__LIMITS__MAX_LEVEL_LENGTH", "wide")]
#[case::unknown_format("OPTSET__OUTPUT__FORMAT", "yaml")]
fn given_unparsable_env_override_when_load_then_config_error(
    #[case] key: &str,
    #[case] value: &str,
) {
    // Arrange
    let _env = IsolatedEnv::new();
    std::env::set_var(key, value);

    // Act
    let result = Settings::load(None);
    std::env::remove_var(key);

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains(key), "{message}"),
        other => panic!("expected config error, got {other:?}"),
    }
}
