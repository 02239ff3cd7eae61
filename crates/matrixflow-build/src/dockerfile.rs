//! BuildHandle を Dockerfile に変換する

use crate::engine::BuildHandle;
use crate::error::{BuildError, Result};

/// Dockerfile を生成
///
/// 手順は exec 形式の RUN として1行ずつ出力し、ラベルはキー順に並べる。
pub fn render_dockerfile(handle: &BuildHandle) -> Result<String> {
    let mut lines = vec![format!("FROM {}", handle.base_image())];

    if let Some(user) = handle.user() {
        lines.push(format!("USER {}", user));
    }
    if let Some(workdir) = handle.workdir() {
        lines.push(format!("WORKDIR {}", workdir));
    }

    for step in handle.steps() {
        if step.is_empty() {
            return Err(BuildError::Provisioning(
                "空のコマンドは実行できません".to_string(),
            ));
        }
        let exec = serde_json::to_string(step)
            .map_err(|e| BuildError::Provisioning(format!("RUN の生成に失敗しました: {}", e)))?;
        lines.push(format!("RUN {}", exec));
    }

    for (key, value) in handle.labels() {
        let key = serde_json::to_string(key)
            .map_err(|e| BuildError::Provisioning(format!("LABEL の生成に失敗しました: {}", e)))?;
        let value = serde_json::to_string(value)
            .map_err(|e| BuildError::Provisioning(format!("LABEL の生成に失敗しました: {}", e)))?;
        lines.push(format!("LABEL {}={}", key, value));
    }

    let mut dockerfile = lines.join("\n");
    dockerfile.push('\n');
    Ok(dockerfile)
}
