use std::{fs, path::PathBuf, process::Command};

fn short_session_config(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("calm-rally-{name}-{}.toml", std::process::id()));
    fs::write(
        &path,
        "version = 1\n\n[session]\nintroduction = \"\"\ngame_time_secs = 12\nspawn_delay_secs = 1\n",
    )
    .expect("write config");
    path
}

#[test]
fn headless_session_runs_to_final_stats() {
    let config = short_session_config("json");
    let output = Command::new(env!("CARGO_BIN_EXE_calm-rally"))
        .args(["--json", "--tick-hz", "20", "--seed", "7", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run calm-rally");
    let _ = fs::remove_file(&config);

    assert!(output.status.success(), "calm-rally exited with {}", output.status);
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.lines().any(|line| line.contains("\"SpawnBall\"")));
    assert!(stdout.lines().any(|line| line.contains("\"ShowFinalStats\"")));
}

#[test]
fn unsupported_config_version_fails() {
    let path = std::env::temp_dir().join(format!("calm-rally-bad-{}.toml", std::process::id()));
    fs::write(&path, "version = 9\n").expect("write config");
    let output = Command::new(env!("CARGO_BIN_EXE_calm-rally"))
        .arg("--config")
        .arg(&path)
        .output()
        .expect("failed to run calm-rally");
    let _ = fs::remove_file(&path);

    assert!(!output.status.success());
}
