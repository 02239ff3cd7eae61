use matrixflow_core::MatrixError;
use serde::Serialize;
use thiserror::Error;

/// ログストリームの取得・読み取りエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct LogStreamError(pub String);

#[derive(Debug, Error)]
pub enum BuildError {
    /// ビルド開始前の致命的な設定エラー
    #[error("設定エラー: {0}")]
    Configuration(#[from] MatrixError),

    #[error("プロビジョニングに失敗しました: {0}")]
    Provisioning(String),

    #[error("プッシュに失敗しました: {message}")]
    PushFailed { message: String },

    #[error("ログの取得に失敗しました: {0}")]
    LogStream(#[from] LogStreamError),

    #[error("無効なイメージタグ: {tag}")]
    InvalidTag { tag: String },

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// ターゲット単位の失敗の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Provisioning,
    Publish,
    LogStream,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Provisioning => "provisioning",
            FailureKind::Publish => "publish",
            FailureKind::LogStream => "log-stream",
        };
        f.write_str(name)
    }
}

impl BuildError {
    /// ターゲット単位の失敗として分類
    ///
    /// Docker 接続・IO エラーはビルド手順の失敗として扱う。
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BuildError::PushFailed { .. } | BuildError::InvalidTag { .. } => FailureKind::Publish,
            BuildError::LogStream(_) => FailureKind::LogStream,
            BuildError::Configuration(_)
            | BuildError::Provisioning(_)
            | BuildError::DockerConnection(_)
            | BuildError::Io(_) => FailureKind::Provisioning,
        }
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Configuration(e) => e.user_message(),
            BuildError::Provisioning(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     ベースイメージとパッケージ指定を確認してください。",
                    msg
                )
            }
            BuildError::PushFailed { message } => {
                format!(
                    "プッシュに失敗しました: {}\n\
                     \n\
                     レジストリの認証情報と書き込み権限を確認してください。",
                    message
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
