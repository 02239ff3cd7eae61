//! matrixflow のビルド・公開処理
//!
//! ビルドエンジンの抽象化（[`BuildEngine`]）、ターゲットごとのプロビジョニング手順、
//! bollard による Docker 実装、並行ビルドのオーケストレーターを提供します。

pub mod builder;
pub mod context;
pub mod docker_engine;
pub mod dockerfile;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod pusher;
pub mod recipe;
pub mod result;

pub use builder::ImageBuilder;
pub use context::ContextBuilder;
pub use docker_engine::DockerEngine;
pub use dockerfile::render_dockerfile;
pub use engine::{BuildEngine, BuildHandle, LogStream, LogWriter, RegistryAuth, SecretHandle};
pub use error::{BuildError, FailureKind, LogStreamError, Result};
pub use orchestrator::Orchestrator;
pub use progress::{BuildProgress, TargetProgress};
pub use pusher::{ImagePusher, split_image_tag, validate_image_name, validate_tag};
pub use recipe::{SOURCE_LABEL, install_command, recipe};
pub use result::{BuildOutcome, BuildReport, BuildResult};
