use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn config_hash_prints_hash_then_canonical_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(
        &base,
        "registry:\n  max_entries: 64\ndefaults:\n  fetch_timeout_ms: 5000\n",
    )?;
    std::fs::write(&overlay, "log:\n  filter: \"tcal=debug\"\n")?;

    let expected = tcal_config::load_layered_yaml_from_strings(&[
        &std::fs::read_to_string(&base)?,
        &std::fs::read_to_string(&overlay)?,
    ])?;

    Command::cargo_bin("tcal")?
        .current_dir(dir.path())
        .env_remove(tcal_config::ENV_DEFAULTS_DOWNLOAD)
        .env_remove(tcal_config::ENV_REGISTRY_MAX_ENTRIES)
        .env_remove(tcal_config::ENV_LOG)
        .args(["config-hash"])
        .arg(&base)
        .arg(&overlay)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "config_hash={}\n",
            expected.config_hash
        )))
        .stdout(predicate::str::contains("\"max_entries\":64"));
    Ok(())
}

#[test]
fn config_hash_requires_paths() -> anyhow::Result<()> {
    Command::cargo_bin("tcal")?
        .args(["config-hash"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn invalid_download_config_fails_startup() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg = dir.path().join("bad.yaml");
    std::fs::write(&cfg, "defaults:\n  download: \"ftp://nowhere\"\n")?;

    Command::cargo_bin("tcal")?
        .current_dir(dir.path())
        .env_remove(tcal_config::ENV_DEFAULTS_DOWNLOAD)
        .arg("--config")
        .arg(&cfg)
        .args(["venues", "--schedule", "NYSE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config load failed"));
    Ok(())
}
