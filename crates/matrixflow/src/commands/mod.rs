pub mod build;
pub mod plan;
pub mod validate;

use colored::Colorize;
use matrixflow_core::{BuildMatrixConfig, ConfigSource};
use std::path::Path;

/// 設定を読み込む。失敗した場合はエラーを表示して終了
pub fn load_config_or_exit(explicit: Option<&Path>) -> (BuildMatrixConfig, ConfigSource) {
    match matrixflow_core::load_matrix(explicit) {
        Ok(loaded) => loaded,
        Err(e) => exit_with_error("✗ 設定エラー", &e.user_message()),
    }
}

/// エラーを表示して終了コード 1 で終了
pub fn exit_with_error(title: &str, detail: &str) -> ! {
    eprintln!();
    eprintln!("{}", title.red().bold());
    for line in detail.lines() {
        eprintln!("  {}", line);
    }
    std::process::exit(1);
}
