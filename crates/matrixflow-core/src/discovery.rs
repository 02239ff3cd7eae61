//! matrix.kdl 発見ロジック
//!
//! 環境変数 → 上方向探索 → グローバル設定 の順に探す。
//! どこにも無ければ組み込みのデフォルトマトリクスを使う。

use crate::error::{MatrixError, Result};
use crate::model::BuildMatrixConfig;
use crate::parser::parse_matrix_file;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// マトリクス設定ファイル名
pub const MATRIX_FILENAME: &str = "matrix.kdl";

/// マトリクス設定ファイルの環境変数
pub const MATRIX_PATH_ENV: &str = "MATRIXFLOW_CONFIG";

/// 設定の読み込み元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// ファイルから読み込んだ
    File(PathBuf),
    /// 組み込みのデフォルト
    BuiltIn,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::BuiltIn => write!(f, "(built-in)"),
        }
    }
}

/// matrix.kdl を発見する
///
/// 検索順序:
/// 1. MATRIXFLOW_CONFIG 環境変数
/// 2. カレントディレクトリから上方向探索
/// 3. ~/.config/matrixflow/matrix.kdl
#[tracing::instrument]
pub fn find_matrix_file() -> Option<PathBuf> {
    // 1. 環境変数
    if let Ok(path_str) = std::env::var(MATRIX_PATH_ENV) {
        let path = PathBuf::from(&path_str);
        debug!(env_path = %path_str, "Checking MATRIXFLOW_CONFIG");
        if path.exists() {
            info!(matrix_path = %path.display(), "Found matrix from environment variable");
            return Some(path);
        }
        warn!(env_path = %path_str, "MATRIXFLOW_CONFIG is set but file does not exist");
    }

    // 2. カレントディレクトリから上に向かって探す
    if let Ok(start_dir) = std::env::current_dir()
        && let Some(path) = find_matrix_from(&start_dir)
    {
        return Some(path);
    }

    // 3. グローバル設定
    let global = dirs::config_dir()?.join("matrixflow").join(MATRIX_FILENAME);
    if global.exists() {
        info!(matrix_path = %global.display(), "Found global matrix file");
        return Some(global);
    }

    None
}

/// 指定ディレクトリから上方向に matrix.kdl を探す
pub fn find_matrix_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for {}", MATRIX_FILENAME);

    loop {
        let matrix_file = current.join(MATRIX_FILENAME);
        if matrix_file.exists() {
            info!(matrix_path = %matrix_file.display(), "Found matrix file");
            return Some(matrix_file);
        }

        if !current.pop() {
            break;
        }
    }

    debug!("Matrix file not found");
    None
}

/// マトリクス設定を読み込む
///
/// 明示的なパスが渡された場合はそれを必須とし、見つからなければエラー。
/// それ以外は [`find_matrix_file`] の結果、最後に組み込みデフォルトを使う。
pub fn load_matrix(explicit: Option<&Path>) -> Result<(BuildMatrixConfig, ConfigSource)> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(MatrixError::NotFound(path.display().to_string()));
        }
        let config = parse_matrix_file(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    match find_matrix_file() {
        Some(path) => {
            let config = parse_matrix_file(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        None => {
            info!("Using built-in build matrix");
            Ok((BuildMatrixConfig::default(), ConfigSource::BuiltIn))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const MINIMAL: &str = r#"
matrix "test-images"
axes {
    os "jammy"
    cuda "12.4.1"
    framework ""
    python "3.10"
}
"#;

    #[test]
    fn test_find_matrix_from_with_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join(MATRIX_FILENAME), MINIMAL).unwrap();

        let result = find_matrix_from(root);
        assert!(result.is_some());
        assert!(result.unwrap().ends_with(MATRIX_FILENAME));
    }

    #[test]
    fn test_find_matrix_from_subdirectory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join(MATRIX_FILENAME), MINIMAL).unwrap();

        let sub_dir = root.join("images").join("cuda");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let result = find_matrix_from(&sub_dir);
        assert_eq!(result, Some(root.join(MATRIX_FILENAME)));
    }

    #[test]
    fn test_load_matrix_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.kdl");
        std::fs::write(&path, MINIMAL).unwrap();

        let (config, source) = load_matrix(Some(&path)).unwrap();
        assert_eq!(config.repository, "test-images");
        assert_eq!(source, ConfigSource::File(path));
    }

    #[test]
    fn test_load_matrix_explicit_path_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.kdl");

        let err = load_matrix(Some(&path)).unwrap_err();
        assert!(matches!(err, MatrixError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_load_matrix_from_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("env.kdl");
        std::fs::write(&path, MINIMAL).unwrap();

        temp_env::with_var(MATRIX_PATH_ENV, Some(path.as_os_str()), || {
            let (config, source) = load_matrix(None).unwrap();
            assert_eq!(config.repository, "test-images");
            assert_eq!(source, ConfigSource::File(path.clone()));
        });
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::BuiltIn.to_string(), "(built-in)");
    }
}
