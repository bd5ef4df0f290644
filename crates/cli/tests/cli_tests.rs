//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const INVENTORY: &str = "\
psm,physical_cluster,iaas_cluster,cluster_name,idc,instance_num,cpu_limit,mem_limit,cluster_id,save_cores
svc.a,PC1,IC1,default,lf,5,10,20,c-1,4
svc.a,PC2,IC1,default,lf,3,6,12,c-2,12
svc.b,PC1,IC1,default,lf,2,4,8,c-3,15
";

/// Run the binary with an isolated home directory and no inherited settings
fn poolctl(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_poolctl"))
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("POOLCTL_API_URL")
        .env_remove("POOLCTL_INVENTORY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn workspace() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let inventory = dir.path().join("all.csv");
    std::fs::write(&inventory, INVENTORY).unwrap();
    let inventory = inventory.display().to_string();
    (dir, inventory)
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = poolctl(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("migration"), "Should show migration command");
    assert!(stdout.contains("recommend"), "Should show recommend command");
    assert!(stdout.contains("migratable"), "Should show migratable command");
    assert!(stdout.contains("--inventory"), "Should show inventory option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = poolctl(dir.path(), &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("poolctl"), "Should show binary name");
}

#[test]
fn test_migration_json_output() {
    let (dir, inventory) = workspace();
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "--format",
            "json",
            "migration",
            "--pool1",
            "PC1/IC1",
            "--pool2",
            "PC2/IC1",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["status"], "success");
    assert_eq!(view["psm_count"], 1);
    assert_eq!(view["detail"].as_array().unwrap().len(), 2);
    assert_eq!(view["summary"][0]["pool_identifier"], "PC1/IC1");
}

#[test]
fn test_migration_table_shows_both_sections() {
    let (dir, inventory) = workspace();
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "migration",
            "--pool1",
            "PC1/IC1",
            "--pool2",
            "PC2/IC1",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary = stdout.find("资源汇总").expect("summary table");
    let detail = stdout.find("详细数据").expect("detail table");
    assert!(summary < detail, "summary comes first");
    assert!(stdout.contains("svc.a"));
}

#[test]
fn test_migration_rejects_malformed_pool() {
    let (dir, inventory) = workspace();
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "migration",
            "--pool1",
            "PC1",
            "--pool2",
            "PC2/IC1",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("资源池格式错误"), "{stderr}");
}

#[test]
fn test_recommend_exports_report() {
    let (dir, inventory) = workspace();
    let export_dir = dir.path().join("reports");
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "--export-dir",
            &export_dir.display().to_string(),
            "--format",
            "json",
            "recommend",
            "--idc",
            "lf",
            "--pool",
            "PC1/IC1",
            "--min-save-cores",
            "5",
            "--export",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["records"].as_array().unwrap().len(), 1);
    assert_eq!(view["records"][0]["cluster_id"], "c-3");
    assert_eq!(view["total_cpu"], 15);

    let report = view["report_file"].as_str().unwrap();
    assert!(Path::new(report).exists());
    assert!(report.contains("recommend_scale_down_"));
}

#[test]
fn test_recommend_empty_scope_fails() {
    let (dir, inventory) = workspace();
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "recommend",
            "--idc",
            "hl",
            "--pool",
            "PC1/IC1",
        ],
    );

    assert!(!output.status.success());
}

#[test]
fn test_migratable_csv_report() {
    let (dir, inventory) = workspace();
    let export_dir = dir.path().join("reports");
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &inventory,
            "--export-dir",
            &export_dir.display().to_string(),
            "--report-format",
            "csv",
            "--format",
            "json",
            "migratable",
            "--idc",
            "lf",
            "--pool",
            "PC1/IC1",
            "--export",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["total_psm"], 2);
    assert_eq!(view["migratable_psm"], 1);
    assert_eq!(view["records"][0]["other_pools"][0], "PC2/IC1");

    let report = Path::new(view["report_file"].as_str().unwrap());
    assert!(report.join("01_可腾挪集群.csv").exists());
    assert!(report.join("03_分析说明.csv").exists());
}

#[test]
fn test_missing_inventory_fails() {
    let dir = TempDir::new().unwrap();
    let output = poolctl(
        dir.path(),
        &[
            "--inventory",
            &dir.path().join("absent.csv").display().to_string(),
            "migratable",
            "--idc",
            "lf",
            "--pool",
            "PC1/IC1",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.csv"), "{stderr}");
}
