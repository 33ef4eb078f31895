use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn vidgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vidgen"))
        .args(args)
        .env_remove("VIDGEN_CONFIG")
        .env_remove("VIDGEN_SERVICE__SECRET")
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to run vidgen")
}

#[test]
fn test_config_command_redacts_secret() {
    let config = write_config(
        r#"
[service]
base_url = "http://localhost:3000"
secret = "very-secret-value"

[poll]
interval_ms = 2000
"#,
    );

    let output = vidgen(&["config", "--config", config.path().to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("very-secret-value"));

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["service"]["base_url"], "http://localhost:3000");
    assert_eq!(json["service"]["secret_configured"], true);
    assert_eq!(json["poll"]["interval_ms"], 2000);
}

#[test]
fn test_missing_config_file_fails() {
    let output = vidgen(&["config", "--config", "/nonexistent/vidgen.toml"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_generate_without_secret_fails_before_network() {
    let config = write_config(
        r#"
[service]
base_url = "http://127.0.0.1:9"
"#,
    );

    let output = vidgen(&[
        "--config",
        config.path().to_str().unwrap(),
        "generate",
        "--theme",
        "dark",
        "--profile-photo-url",
        "https://example.com/p.jpg",
        "--profile-name",
        "Jack",
        "--username",
        "jack",
        "--tweet-body",
        "hello",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("secret"), "{}", stderr);
    assert_eq!(
        stderr.matches("Configuration validation failed").count(),
        1,
        "{}",
        stderr
    );
}
