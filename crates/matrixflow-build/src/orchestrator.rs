//! ビルドオーケストレーター
//!
//! ターゲットごとに1タスクを JoinSet に投入し、すべて並行に実行する。
//! 結果は投入時のインデックスで格納するため、完了順に関わらず列挙順が保たれる。

use crate::engine::{BuildEngine, LogStream, SecretHandle};
use crate::error::{BuildError, FailureKind, LogStreamError, Result};
use crate::progress::{BuildProgress, TargetProgress};
use crate::recipe::recipe;
use crate::result::{BuildReport, BuildResult};
use futures_util::{FutureExt, StreamExt};
use matrixflow_core::{BuildMatrixConfig, BuildTarget, RegistryCredentials};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 全タスクで共有する読み取り専用のコンテキスト
struct TaskContext {
    engine: Arc<dyn BuildEngine>,
    config: Arc<BuildMatrixConfig>,
    identity: String,
    secret: SecretHandle,
}

/// マトリクス全体のビルドを実行する
pub struct Orchestrator {
    engine: Arc<dyn BuildEngine>,
    config: Arc<BuildMatrixConfig>,
    progress: Option<BuildProgress>,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn BuildEngine>, config: BuildMatrixConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            progress: None,
        }
    }

    /// ターゲットごとのスピナーを表示する
    pub fn with_progress(mut self, progress: BuildProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// 全ターゲットをビルド・公開する
    ///
    /// 認証情報が欠けている場合はエンジンに一切触れずに `BuildError::Configuration` を返す。
    /// それ以外の失敗はターゲット単位の結果に変換され、他のターゲットには影響しない。
    pub async fn run(
        &self,
        targets: &[BuildTarget],
        credentials: &RegistryCredentials,
    ) -> Result<BuildReport> {
        let (identity, secret) = credentials.require()?;

        if targets.is_empty() {
            info!("No build targets; nothing to do");
            return Ok(BuildReport::default());
        }

        info!(
            engine = %self.engine.name(),
            targets = targets.len(),
            "Starting matrix build"
        );

        let context = Arc::new(TaskContext {
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
            identity: identity.to_string(),
            secret: self.engine.set_secret("password", secret),
        });

        let mut join_set = JoinSet::new();
        for (idx, target) in targets.iter().cloned().enumerate() {
            let context = Arc::clone(&context);
            let progress = self
                .progress
                .as_ref()
                .map(|p| p.target(target.image_reference()));

            join_set.spawn(async move {
                let started = Instant::now();
                let outcome = AssertUnwindSafe(build_target(&context, &target, progress.as_ref()))
                    .catch_unwind()
                    .await;

                let result = match outcome {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!(image = %target.image_reference(), %message, "Build task panicked");
                        if let Some(progress) = &progress {
                            progress.finish_error(&message);
                        }
                        let destination = context
                            .config
                            .destination(&context.identity, target.image_reference());
                        BuildResult::failed(
                            target,
                            destination,
                            FailureKind::Provisioning,
                            format!("build task panicked: {}", message),
                            started.elapsed(),
                        )
                    }
                };
                (idx, result)
            });
        }

        let mut slots: Vec<Option<BuildResult>> = (0..targets.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => error!("Build task join error: {}", e),
            }
        }

        let results = slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| {
                    let destination = context
                        .config
                        .destination(&context.identity, target.image_reference());
                    BuildResult::failed(
                        target.clone(),
                        destination,
                        FailureKind::Provisioning,
                        "build task did not complete",
                        Duration::ZERO,
                    )
                })
            })
            .collect();

        let report = BuildReport::new(results);
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Matrix build finished"
        );
        Ok(report)
    }
}

/// 1ターゲットのビルド
///
/// 公開処理とログの読み出しを同時に進める。どちらかが失敗すればこのターゲットは失敗。
async fn build_target(
    context: &TaskContext,
    target: &BuildTarget,
    progress: Option<&TargetProgress>,
) -> BuildResult {
    let started = Instant::now();
    let destination = context
        .config
        .destination(&context.identity, target.image_reference());

    let handle = recipe(
        context.engine.as_ref(),
        target,
        &context.config,
        &context.identity,
        &context.secret,
    );

    info!(
        image = %destination,
        base = %target.base_image(),
        "Building {}",
        target.axis_tuple()
    );

    let outcome = match context.engine.logs(&handle) {
        Err(e) => Err(BuildError::LogStream(e)),
        Ok(stream) => {
            let publish = async {
                let published = context.engine.publish(&handle, &destination).await;
                // エンジンが書き込み側を使わなかった場合もストリームを終端させる
                handle.close_logs();
                published
            };
            let (published, streamed) = tokio::join!(
                publish,
                drain_logs(stream, target.image_reference(), progress)
            );
            published.and(streamed.map(|_| ()).map_err(BuildError::from))
        }
    };

    match outcome {
        Ok(()) => {
            info!(image = %destination, "Build succeeded");
            if let Some(progress) = progress {
                progress.finish_success();
            }
            BuildResult::succeeded(target.clone(), destination, started.elapsed())
        }
        Err(e) => {
            warn!(image = %destination, kind = %e.failure_kind(), "Build failed: {}", e);
            if let Some(progress) = progress {
                progress.finish_error(&e.to_string());
            }
            BuildResult::from_error(target.clone(), destination, &e, started.elapsed())
        }
    }
}

/// ログストリームを最後まで読み出す
async fn drain_logs(
    mut stream: LogStream,
    image_reference: &str,
    progress: Option<&TargetProgress>,
) -> std::result::Result<usize, LogStreamError> {
    let mut lines = 0;
    while let Some(item) = stream.next().await {
        let line = item?;
        lines += 1;
        match progress {
            Some(progress) => {
                progress.set_message(&line);
                debug!(image = %image_reference, "{}", line);
            }
            None => info!(image = %image_reference, "{}", line),
        }
    }
    Ok(lines)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
