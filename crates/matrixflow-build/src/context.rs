use crate::error::{BuildError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// Dockerfile のみを含むビルドコンテキストを tar.gz アーカイブとして作成
    pub fn from_dockerfile(dockerfile: &str) -> Result<Vec<u8>> {
        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            let content = dockerfile.as_bytes();
            let mut header = tar::Header::new_gnu();
            header.set_path("Dockerfile").map_err(|e| {
                BuildError::Provisioning(format!("Failed to set Dockerfile path: {}", e))
            })?;
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();

            tar.append(&header, content).map_err(BuildError::Io)?;

            // GzEncoder まで確実に書き切る
            tar.into_inner()
                .map_err(BuildError::Io)?
                .finish()
                .map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Ok(archive_data)
    }
}
