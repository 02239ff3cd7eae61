//! ビルドエンジンの抽象化
//!
//! コンテナのビルド・公開は外部エンジンに委譲する。オーケストレーターはこの
//! トレイト越しにしかエンジンへ触れない。

use crate::error::{LogStreamError, Result};
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use matrixflow_core::Secret;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// ビルドログの遅延ストリーム（有限・再開不可）
pub type LogStream = BoxStream<'static, std::result::Result<String, LogStreamError>>;

type LogItem = std::result::Result<String, LogStreamError>;

/// ビルドエンジンのトレイト
///
/// `from_base_image` / `set_secret` / `logs` にはチャネルベースの既定実装がある。
/// エンジン実装は最低限 `publish` を提供し、その中で [`BuildHandle::log_writer`]
/// にログを書き込む。
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// エンジン名（ログ表示用）
    fn name(&self) -> &str;

    /// ベースイメージからビルドハンドルを作成
    fn from_base_image(&self, reference: &str) -> BuildHandle {
        BuildHandle::new(reference)
    }

    /// 秘密情報を登録し、不透明なハンドルを返す
    fn set_secret(&self, name: &str, plaintext: &Secret) -> SecretHandle {
        SecretHandle::new(name, plaintext.clone())
    }

    /// ビルドログのストリームを取得（1ハンドルにつき1回のみ）
    fn logs(&self, handle: &BuildHandle) -> std::result::Result<LogStream, LogStreamError> {
        handle.take_log_stream()
    }

    /// ビルドしてレジストリに公開する
    async fn publish(&self, handle: &BuildHandle, destination: &str) -> Result<()>;
}

/// 登録済みの秘密情報への参照
#[derive(Clone)]
pub struct SecretHandle {
    name: String,
    value: Arc<Secret>,
}

impl SecretHandle {
    pub fn new(name: impl Into<String>, value: Secret) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretHandle")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

/// レジストリ認証の指定
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    pub address: String,
    pub identity: String,
    pub secret: SecretHandle,
}

/// ストリームへの書き込み側
///
/// drop するとストリームが終端する。
#[derive(Debug)]
pub struct LogWriter {
    sender: mpsc::UnboundedSender<LogItem>,
}

impl LogWriter {
    /// 1行書き込む。読み手がいなくなっていても無視する
    pub fn line(&self, line: impl Into<String>) {
        let _ = self.sender.send(Ok(line.into()));
    }

    /// ストリームの異常を通知する
    pub fn fail(&self, error: LogStreamError) {
        let _ = self.sender.send(Err(error));
    }
}

/// ハンドルに付随する1回限りのログパイプ
#[derive(Clone)]
struct LogPipe {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<LogItem>>>>,
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<LogItem>>>>,
}

impl LogPipe {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            receiver: Arc::new(Mutex::new(Some(rx))),
        }
    }
}

/// ビルド内容の宣言（チェーン可能）
#[derive(Clone)]
pub struct BuildHandle {
    base_image: String,
    user: Option<String>,
    workdir: Option<String>,
    steps: Vec<Vec<String>>,
    labels: BTreeMap<String, String>,
    registry_auth: Option<RegistryAuth>,
    logs: LogPipe,
}

impl BuildHandle {
    pub fn new(base_image: impl Into<String>) -> Self {
        Self {
            base_image: base_image.into(),
            user: None,
            workdir: None,
            steps: Vec::new(),
            labels: BTreeMap::new(),
            registry_auth: None,
            logs: LogPipe::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// プロビジョニング手順を追加（exec 形式）
    pub fn with_exec<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .push(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_registry_auth(
        mut self,
        address: impl Into<String>,
        identity: impl Into<String>,
        secret: SecretHandle,
    ) -> Self {
        self.registry_auth = Some(RegistryAuth {
            address: address.into(),
            identity: identity.into(),
            secret,
        });
        self
    }

    pub fn base_image(&self) -> &str {
        &self.base_image
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn workdir(&self) -> Option<&str> {
        self.workdir.as_deref()
    }

    pub fn steps(&self) -> &[Vec<String>] {
        &self.steps
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn registry_auth(&self) -> Option<&RegistryAuth> {
        self.registry_auth.as_ref()
    }

    /// ログの書き込み側を取り出す（2回目以降は None）
    pub fn log_writer(&self) -> Option<LogWriter> {
        self.logs
            .sender
            .lock()
            .ok()?
            .take()
            .map(|sender| LogWriter { sender })
    }

    /// 書き込み側を破棄してストリームを終端させる
    pub fn close_logs(&self) {
        drop(self.log_writer());
    }

    /// ログストリームを取り出す（2回目以降はエラー）
    pub fn take_log_stream(&self) -> std::result::Result<LogStream, LogStreamError> {
        let receiver = self
            .logs
            .receiver
            .lock()
            .map_err(|_| LogStreamError("log pipe lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| LogStreamError("log stream already consumed".to_string()))?;

        let stream = futures_util::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}

impl fmt::Debug for BuildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildHandle")
            .field("base_image", &self.base_image)
            .field("user", &self.user)
            .field("workdir", &self.workdir)
            .field("steps", &self.steps)
            .field("labels", &self.labels)
            .field("registry_auth", &self.registry_auth)
            .finish()
    }
}
