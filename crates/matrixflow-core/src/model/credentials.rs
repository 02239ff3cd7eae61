use crate::error::{MatrixError, Result};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// ユーザー名を探す環境変数（先頭が優先）
pub const IDENTITY_ENV_VARS: [&str; 2] = ["REGISTRY_USERNAME", "username"];

/// パスワード / トークンを探す環境変数（先頭が優先）
pub const SECRET_ENV_VARS: [&str; 2] = ["REGISTRY_PASSWORD", "password"];

/// 秘密情報。drop 時にゼロクリアされ、Debug 表示では伏せられる
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 平文を参照する（ログに出さないこと）
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// レジストリ認証情報
///
/// 欠けている可能性があるまま保持し、ビルド開始前に [`RegistryCredentials::require`] で検証する。
#[derive(Debug, Clone, Default)]
pub struct RegistryCredentials {
    identity: Option<String>,
    secret: Option<Secret>,
}

impl RegistryCredentials {
    /// 空文字列は未設定として扱う
    pub fn new(identity: Option<String>, secret: Option<String>) -> Self {
        Self {
            identity: identity.filter(|s| !s.is_empty()),
            secret: secret.filter(|s| !s.is_empty()).map(Secret::new),
        }
    }

    /// 環境変数から読み込む
    pub fn from_env() -> Self {
        Self::default().with_env_fallback()
    }

    /// 未設定の項目を環境変数で補う
    pub fn with_env_fallback(self) -> Self {
        let identity = self.identity.or_else(|| lookup_env(&IDENTITY_ENV_VARS));
        let secret = self
            .secret
            .or_else(|| lookup_env(&SECRET_ENV_VARS).map(Secret::new));
        Self { identity, secret }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// ユーザー名とシークレットが揃っていることを確認
    pub fn require(&self) -> Result<(&str, &Secret)> {
        let identity = self
            .identity
            .as_deref()
            .ok_or(MatrixError::MissingCredential { name: "identity" })?;
        let secret = self
            .secret
            .as_ref()
            .ok_or(MatrixError::MissingCredential { name: "secret" })?;
        Ok((identity, secret))
    }
}

fn lookup_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .filter(|value| !value.is_empty())
            .inspect(|_| tracing::debug!(env = %name, "Registry credential loaded from environment"))
    })
}
