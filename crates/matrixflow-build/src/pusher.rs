//! イメージプッシュ処理
//!
//! ビルドしたイメージをコンテナレジストリにプッシュします。

use crate::engine::LogWriter;
use crate::error::{BuildError, Result};
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::models::PushImageInfo;
use futures_util::StreamExt;

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをレジストリにプッシュ
    ///
    /// # Arguments
    /// * `image` - イメージ名（レジストリ込み、タグなし）
    /// * `tag` - イメージタグ
    /// * `credentials` - レジストリ認証情報
    ///
    /// # Returns
    /// プッシュ成功時は完全なイメージ名を返す
    pub async fn push(
        &self,
        image: &str,
        tag: &str,
        credentials: Option<DockerCredentials>,
        logs: Option<&LogWriter>,
    ) -> Result<String> {
        let full_image = format!("{}:{}", image, tag);

        validate_image_name(image)?;
        validate_tag(tag)?;

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        tracing::info!(image = %full_image, "Pushing image");

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(image, Some(options), credentials);

        let mut last_status = String::new();
        let mut error_message: Option<String> = None;

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(err) = info.error {
                        error_message = Some(err);
                    } else if let Some(logs) = logs {
                        handle_progress(&info, &mut last_status, logs);
                    }
                }
                Err(e) => {
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(err) = error_message {
            return Err(BuildError::PushFailed { message: err });
        }

        Ok(full_image)
    }
}

/// プッシュ進捗をログに流す
fn handle_progress(info: &PushImageInfo, last_status: &mut String, logs: &LogWriter) {
    if let Some(status) = &info.status {
        match status.as_str() {
            // 準備中・転送中はノイズになるのでスキップ
            "Preparing" | "Waiting" | "Pushing" => {}
            _ => {
                if status != last_status {
                    logs.line(format!("push: {}", status));
                    *last_status = status.clone();
                }
            }
        }
    }
}

/// タグのバリデーション
///
/// Docker タグの制約:
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }

    if tag.len() > 128 {
        return Err(BuildError::InvalidTag {
            tag: format!("Tag too long ({} characters, max 128)", tag.len()),
        });
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }

    for c in tag.chars() {
        if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
            return Err(BuildError::InvalidTag {
                tag: format!("Invalid character '{}' in tag: {}", c, tag),
            });
        }
    }

    Ok(())
}

/// イメージ名の最後のパス要素（リポジトリ名）のバリデーション
///
/// - 小文字英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭と末尾は英数字
pub fn validate_image_name(image: &str) -> Result<()> {
    let name = image.rsplit('/').next().unwrap_or(image);

    let invalid = || BuildError::InvalidTag {
        tag: image.to_string(),
    };

    let first = name.chars().next().ok_or_else(invalid)?;
    let last = name.chars().last().ok_or_else(invalid)?;
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(invalid());
    }

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            return Err(BuildError::InvalidTag {
                tag: format!("Uppercase character '{}' in image name: {}", c, image),
            });
        }
        if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
            return Err(BuildError::InvalidTag {
                tag: format!("Invalid character '{}' in image name: {}", c, image),
            });
        }
    }

    Ok(())
}

/// イメージ名とタグを分離
///
/// # Examples
/// - `ghcr.io/org/app:v1.0` -> `("ghcr.io/org/app", "v1.0")`
/// - `ghcr.io/org/app` -> `("ghcr.io/org/app", "latest")`
/// - `localhost:5000/app:dev` -> `("localhost:5000/app", "dev")`
pub fn split_image_tag(image: &str) -> (String, String) {
    if let Some(pos) = image.rfind(':') {
        let potential_tag = &image[pos + 1..];
        let potential_image = &image[..pos];

        // ポート番号は / を含まない純粋な数字
        if !potential_tag.contains('/') && !potential_tag.chars().all(|c| c.is_ascii_digit()) {
            return (potential_image.to_string(), potential_tag.to_string());
        }
    }

    (image.to_string(), "latest".to_string())
}
