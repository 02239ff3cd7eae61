//! bollard による Docker ビルドエンジン

use crate::builder::ImageBuilder;
use crate::context::ContextBuilder;
use crate::dockerfile::render_dockerfile;
use crate::engine::{BuildEngine, BuildHandle, RegistryAuth};
use crate::error::Result;
use crate::pusher::{ImagePusher, split_image_tag, validate_image_name, validate_tag};
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;

/// ローカルの Docker デーモンでビルドし、レジストリへプッシュする
pub struct DockerEngine {
    builder: ImageBuilder,
    pusher: ImagePusher,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self {
            builder: ImageBuilder::new(docker.clone()),
            pusher: ImagePusher::new(docker),
        }
    }

    /// ローカルの Docker に接続し、疎通を確認する
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        docker.ping().await?;
        tracing::debug!("Connected to Docker daemon");
        Ok(Self::new(docker))
    }
}

#[async_trait]
impl BuildEngine for DockerEngine {
    fn name(&self) -> &str {
        "docker"
    }

    async fn publish(&self, handle: &BuildHandle, destination: &str) -> Result<()> {
        // この関数を抜けると writer が drop され、ログストリームが終端する
        let writer = handle.log_writer();

        let (image, tag) = split_image_tag(destination);
        validate_image_name(&image)?;
        validate_tag(&tag)?;

        let dockerfile = render_dockerfile(handle)?;
        tracing::debug!(image = %destination, "Rendered Dockerfile:\n{}", dockerfile);
        let context = ContextBuilder::from_dockerfile(&dockerfile)?;

        self.builder
            .build_image(context, destination, writer.as_ref())
            .await?;

        let credentials = handle.registry_auth().map(docker_credentials);
        let pushed = self
            .pusher
            .push(&image, &tag, credentials, writer.as_ref())
            .await?;

        tracing::info!(image = %pushed, "Published");
        Ok(())
    }
}

/// RegistryAuth を bollard の DockerCredentials に変換
fn docker_credentials(auth: &RegistryAuth) -> DockerCredentials {
    DockerCredentials {
        username: Some(auth.identity.clone()),
        password: Some(auth.secret.expose_secret().to_string()),
        serveraddress: Some(auth.address.clone()),
        ..Default::default()
    }
}
