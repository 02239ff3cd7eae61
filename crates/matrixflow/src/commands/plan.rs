use super::load_config_or_exit;
use colored::Colorize;
use matrixflow_core::BuildMatrix;
use std::path::Path;

pub fn handle(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let (config, source) = load_config_or_exit(config_path);
    let matrix = BuildMatrix::new(&config);

    if json {
        println!("{}", serde_json::to_string_pretty(matrix.targets())?);
        return Ok(());
    }

    println!("設定: {}", source.to_string().cyan());
    println!(
        "リポジトリ: {} (base-image: {})",
        config.repository.cyan(),
        config.base_image.name()
    );
    println!();

    if matrix.is_empty() {
        println!("{}", "ビルド対象がありません".yellow());
        return Ok(());
    }

    println!("{}", format!("ビルド対象: {}件", matrix.len()).bold());
    for target in matrix.targets() {
        println!("  - {}", target.image_reference().cyan());
        println!("      {}", target.axis_tuple());
        println!("      FROM {}", target.base_image());
    }

    Ok(())
}
