use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "parched-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_parched-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("config-sync"));
    std::fs::remove_file(output_path).ok();
}

#[test]
fn cli_runs_smoke_with_json_report_and_explicit_config_dir() {
    let exe = env!("CARGO_BIN_EXE_parched-tester");
    let output_path = temp_path("run");
    let config_dir = temp_path("config");
    std::fs::create_dir_all(&config_dir).expect("create config dir");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,config-sync",
            "--iterations",
            "1",
            "--seeds",
            "1,dunes",
            "--config-dir",
        ])
        .arg(&config_dir)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).expect("read report"))
            .expect("json report");
    let runs = report.as_array().expect("array of results");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["passed"] == true));
    assert!(config_dir.join("parched-server.json").exists());
    assert!(config_dir.join("Parched.AddItemHydration.json").exists());
    std::fs::remove_dir_all(config_dir).ok();
    std::fs::remove_file(output_path).ok();
}

#[test]
fn cli_warns_about_unknown_scenarios() {
    let exe = env!("CARGO_BIN_EXE_parched-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "no-such-thing", "--report", "markdown"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario"));
    assert!(stdout.contains("_No scenarios executed._"));
}
