use super::{exit_with_error, load_config_or_exit};
use colored::Colorize;
use matrixflow_build::validate_image_name;
use matrixflow_core::BuildMatrix;
use std::path::Path;

pub fn handle(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());

    let (config, source) = load_config_or_exit(config_path);
    println!("設定: {}", source.to_string().cyan());

    let matrix = BuildMatrix::new(&config);

    let mut problems = Vec::new();
    for reference in matrix.duplicate_references() {
        problems.push(format!("イメージ参照が重複しています: {}", reference));
    }
    for target in matrix.targets() {
        if let Err(e) = validate_image_name(target.image_reference()) {
            problems.push(e.to_string());
        }
    }

    if !problems.is_empty() {
        exit_with_error("✗ 設定エラー", &problems.join("\n"));
    }

    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  リポジトリ: {}", config.repository.cyan());
    println!("  レジストリ: {}", config.registry);
    println!("  ベースイメージ: {}", config.base_image.name());
    println!("  os: {}個", config.axes.os.len());
    println!("  cuda: {}個", config.axes.cuda.len());
    println!("  framework: {}個", config.axes.framework.len());
    println!("  python: {}個", config.axes.python.len());
    println!("  ターゲット: {}件", matrix.len());

    Ok(())
}
