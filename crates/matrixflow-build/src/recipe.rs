//! ターゲットごとのプロビジョニング手順
//!
//! BuildTarget と設定から、エンジンに渡す BuildHandle を組み立てる。

use crate::engine::{BuildEngine, BuildHandle, SecretHandle};
use matrixflow_core::{BuildMatrixConfig, BuildTarget};

/// OCI source ラベルのキー
pub const SOURCE_LABEL: &str = "org.opencontainers.image.source";

const MICROMAMBA_INSTALL: &str =
    "apk add --no-cache curl bash && curl -Ls https://micro.mamba.pm/install.sh | bash";

/// パッケージ導入コマンド
///
/// フレームワーク指定が空なら Python のみを入れる。
pub fn install_command(target: &BuildTarget) -> String {
    let mut packages: Vec<String> = Vec::with_capacity(2);
    if !target.framework_spec().is_empty() {
        packages.push(target.framework_spec().to_string());
    }
    packages.push(format!("python={}", target.interpreter_version()));

    format!(
        "micromamba install -y -n base -c conda-forge {} && micromamba clean --all --yes && micromamba list",
        packages.join(" ")
    )
}

/// ターゲットのビルド内容を組み立てる
pub fn recipe(
    engine: &dyn BuildEngine,
    target: &BuildTarget,
    config: &BuildMatrixConfig,
    identity: &str,
    secret: &SecretHandle,
) -> BuildHandle {
    let mut handle = engine
        .from_base_image(target.base_image())
        .with_user("root")
        .with_workdir("/app");

    // micromamba 同梱のベースイメージでは導入済み
    if !config.base_image.ships_micromamba() {
        handle = handle.with_exec(["/bin/sh", "-c", MICROMAMBA_INSTALL]);
    }

    handle
        .with_exec(["/bin/sh".to_string(), "-c".to_string(), install_command(target)])
        .with_label(SOURCE_LABEL, config.source_url(identity))
        .with_registry_auth(&config.registry, identity, secret.clone())
}
