use crate::engine::LogWriter;
use crate::error::{BuildError, Result};
use bollard::Docker;
use futures_util::stream::StreamExt;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルド
    ///
    /// ビルド出力は `logs` に1行ずつ流す。
    pub async fn build_image(
        &self,
        context_data: Vec<u8>,
        tag: &str,
        logs: Option<&LogWriter>,
    ) -> Result<()> {
        tracing::info!(image = %tag, "Building image");

        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            pull: true,    // ベースイメージを常にpull
            ..Default::default()
        };

        tracing::debug!("Build options: {:?}", options);

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(context_data));
        let mut stream = self.docker.build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => handle_build_output(output, logs)?,
                Err(e) => return Err(BuildError::Provisioning(e.to_string())),
            }
        }

        tracing::info!(image = %tag, "Successfully built");
        Ok(())
    }
}

/// ビルド出力の処理
fn handle_build_output(output: bollard::models::BuildInfo, logs: Option<&LogWriter>) -> Result<()> {
    if let Some(error_detail) = output.error_detail {
        let error_msg = error_detail
            .message
            .unwrap_or_else(|| "Unknown build error".to_string());
        return Err(BuildError::Provisioning(error_msg));
    }

    let Some(logs) = logs else {
        return Ok(());
    };

    if let Some(stream) = output.stream {
        for line in stream.lines().filter(|l| !l.trim().is_empty()) {
            logs.line(line);
        }
    }

    if let Some(status) = output.status {
        logs.line(status);
    }

    Ok(())
}
