//! matrixflow-core エラー型

/// マトリクス設定まわりのエラー
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix.kdl が見つかりません: {0}")]
    NotFound(String),

    #[error("KDL パースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("不正なマトリクス定義: {0}")]
    InvalidConfig(String),

    #[error("必須の認証情報がありません: {name}")]
    MissingCredential { name: &'static str },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

impl MatrixError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            MatrixError::MissingCredential { name } => {
                format!(
                    "レジストリの{}が設定されていません。\n\
                     \n\
                     解決方法:\n\
                     1. 環境変数 REGISTRY_USERNAME / REGISTRY_PASSWORD を設定してください\n\
                        (互換: username / password)\n\
                     2. または --username / --password オプションで指定してください",
                    name
                )
            }
            MatrixError::NotFound(path) => {
                format!(
                    "設定ファイルが見つかりません: {}\n\
                     \n\
                     --config で matrix.kdl のパスを確認してください。",
                    path
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatrixError>;
