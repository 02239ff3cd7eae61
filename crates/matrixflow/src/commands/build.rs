use super::{exit_with_error, load_config_or_exit};
use crate::report::print_report;
use colored::Colorize;
use matrixflow_build::{BuildProgress, DockerEngine, Orchestrator};
use matrixflow_core::{BuildMatrix, RegistryCredentials};
use std::path::Path;
use std::sync::Arc;

/// マトリクス全体をビルド・公開する
///
/// 全ターゲットが成功した場合に `true` を返す。
pub async fn handle(
    config_path: Option<&Path>,
    username: Option<String>,
    password: Option<String>,
    progress: bool,
) -> anyhow::Result<bool> {
    let (config, source) = load_config_or_exit(config_path);

    println!("{}", "マトリクスビルドを開始します...".blue());
    println!("設定: {}", source.to_string().cyan());

    // エンジンへ接続する前に認証情報を確定させる
    let credentials = RegistryCredentials::new(username, password).with_env_fallback();
    if let Err(e) = credentials.require() {
        exit_with_error("✗ 認証情報エラー", &e.user_message());
    }

    let matrix = BuildMatrix::new(&config);
    let duplicates = matrix.duplicate_references();
    if !duplicates.is_empty() {
        println!(
            "{}",
            format!(
                "⚠ イメージ参照が重複しています（後から公開したものが残ります）: {}",
                duplicates.join(", ")
            )
            .yellow()
        );
    }

    if matrix.is_empty() {
        println!("{}", "ビルド対象がありません".yellow());
        return Ok(true);
    }
    println!("ターゲット: {}件", matrix.len());
    println!();

    let engine = match DockerEngine::connect().await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Docker接続エラー".red().bold());
            eprintln!();
            eprintln!("詳細: {}", e);
            eprintln!();
            eprintln!("{}", "解決方法:".yellow());
            eprintln!("  • Dockerが起動しているか確認してください");
            eprintln!("  • DOCKER_HOST の設定を確認してください");
            std::process::exit(1);
        }
    };

    let mut orchestrator = Orchestrator::new(Arc::new(engine), config);
    if progress {
        orchestrator = orchestrator.with_progress(BuildProgress::new());
    }

    let report = match orchestrator.run(matrix.targets(), &credentials).await {
        Ok(report) => report,
        Err(e) => exit_with_error("✗ ビルドを開始できません", &e.user_message()),
    };

    print_report(&report);
    Ok(report.is_success())
}
