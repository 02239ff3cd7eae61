#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const JAMMY_MATRIX: &str = r#"
matrix "cuda-images"
registry "ghcr.io"
base-image "micromamba"

axes {
    os "jammy"
    cuda "12.4.1"
    framework "" "pytorch"
    python "3.10"
}
"#;

const COLLIDING_MATRIX: &str = r#"
matrix "cuda-images"
tag-prefix "cuda"

axes {
    os "jammy" "noble"
    cuda "12.4.1"
    framework ""
    python "3.10"
}
"#;

fn write_matrix(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("matrix.kdl");
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

fn matrixflow() -> Command {
    let mut cmd = Command::cargo_bin("matrixflow").unwrap();
    for var in [
        "MATRIXFLOW_CONFIG",
        "REGISTRY_USERNAME",
        "REGISTRY_PASSWORD",
        "username",
        "password",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    matrixflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CUDA ベースイメージ"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("validate"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    matrixflow()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("matrixflow"));
}

/// buildコマンドのヘルプに認証オプションが表示されることを確認
#[test]
fn test_build_help() {
    matrixflow()
        .arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--username"))
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("--progress"));
}

/// planコマンドがターゲットを列挙順に表示することを確認
#[test]
fn test_plan_lists_targets() {
    let (_dir, path) = write_matrix(JAMMY_MATRIX);

    matrixflow()
        .arg("plan")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ビルド対象: 2件"))
        .stdout(predicate::str::contains("jammy_python_3.10_cuda_12.4.1_base"))
        .stdout(predicate::str::contains("jammy_python_3.10_cuda_12.4.1_pytorch"))
        .stdout(predicate::str::contains(
            "FROM ghcr.io/mamba-org/micromamba:jammy-cuda-12.4.1",
        ));
}

/// plan --json がJSONで出力されることを確認
#[test]
fn test_plan_json() {
    let (_dir, path) = write_matrix(JAMMY_MATRIX);

    let output = matrixflow()
        .arg("plan")
        .arg("--config")
        .arg(&path)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let targets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let targets = targets.as_array().unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(
        targets[1]["image_reference"],
        "jammy_python_3.10_cuda_12.4.1_pytorch"
    );
    assert_eq!(targets[0]["framework_spec"], "");
}

/// 組み込みのデフォルトでも plan できることを確認
#[test]
fn test_plan_builtin_default() {
    let temp_dir = TempDir::new().unwrap();

    matrixflow()
        .current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("(built-in)"))
        .stdout(predicate::str::contains("wolfi_python_3.11_cuda_12.4.1_tensorflow"));
}

/// validateでイメージ参照の衝突を検出することを確認
#[test]
fn test_validate_detects_collisions() {
    let (_dir, path) = write_matrix(COLLIDING_MATRIX);

    matrixflow()
        .arg("validate")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("重複"))
        .stderr(predicate::str::contains("cuda_python_3.10_cuda_12.4.1_base"));
}

/// 正常な設定はvalidateが成功することを確認
#[test]
fn test_validate_success() {
    let (_dir, path) = write_matrix(JAMMY_MATRIX);

    matrixflow()
        .arg("validate")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("設定ファイルは正常です"))
        .stdout(predicate::str::contains("ターゲット: 2件"));
}

/// 存在しない設定ファイルはエラーになることを確認
#[test]
fn test_missing_config_file() {
    matrixflow()
        .arg("plan")
        .arg("--config")
        .arg("/nonexistent/matrix.kdl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("設定エラー"));
}

/// 認証情報がなければDockerに触れる前に失敗することを確認
#[test]
fn test_build_without_credentials() {
    let (_dir, path) = write_matrix(JAMMY_MATRIX);

    matrixflow()
        .arg("build")
        .arg("--config")
        .arg(&path)
        .env("DOCKER_HOST", "unix:///nonexistent/docker.sock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("認証情報エラー"))
        .stderr(predicate::str::contains("REGISTRY_USERNAME"))
        .stderr(predicate::str::contains("Docker接続エラー").not());
}

/// パスワードだけ欠けている場合も失敗することを確認
#[test]
fn test_build_without_secret() {
    let (_dir, path) = write_matrix(JAMMY_MATRIX);

    matrixflow()
        .arg("build")
        .arg("--config")
        .arg(&path)
        .arg("--username")
        .arg("octocat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("認証情報エラー"));
}
