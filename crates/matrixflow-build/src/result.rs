//! ビルド結果の集計

use crate::error::{BuildError, FailureKind};
use matrixflow_core::BuildTarget;
use serde::Serialize;
use std::time::Duration;

/// ターゲット1件の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BuildOutcome {
    Succeeded,
    Failed { kind: FailureKind, message: String },
}

/// ターゲットごとのビルド結果
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub target: BuildTarget,
    /// 公開先イメージ
    pub destination: String,
    pub outcome: BuildOutcome,
    pub duration_ms: u64,
}

impl BuildResult {
    pub fn succeeded(target: BuildTarget, destination: String, duration: Duration) -> Self {
        Self {
            target,
            destination,
            outcome: BuildOutcome::Succeeded,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failed(
        target: BuildTarget,
        destination: String,
        kind: FailureKind,
        message: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            target,
            destination,
            outcome: BuildOutcome::Failed {
                kind,
                message: message.into(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn from_error(
        target: BuildTarget,
        destination: String,
        error: &BuildError,
        duration: Duration,
    ) -> Self {
        Self::failed(
            target,
            destination,
            error.failure_kind(),
            error.to_string(),
            duration,
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Succeeded)
    }

    /// 失敗時の診断メッセージ
    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            BuildOutcome::Succeeded => None,
            BuildOutcome::Failed { message, .. } => Some(message),
        }
    }
}

/// 全ターゲットの結果（列挙順）
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    results: Vec<BuildResult>,
}

impl BuildReport {
    pub fn new(results: Vec<BuildResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[BuildResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// 失敗が1件もなければ成功（0件も成功）
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixflow_core::{BaseImageTemplate, TagRule};

    fn target(framework: &str) -> BuildTarget {
        BuildTarget::new(
            "jammy",
            "12.4.1",
            framework,
            "3.10",
            &TagRule::default(),
            BaseImageTemplate::Micromamba,
        )
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = BuildReport::default();
        assert!(report.is_success());
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_report_counts() {
        let report = BuildReport::new(vec![
            BuildResult::succeeded(target(""), "a".into(), Duration::from_millis(5)),
            BuildResult::failed(
                target("pytorch"),
                "b".into(),
                FailureKind::Publish,
                "denied",
                Duration::from_millis(7),
            ),
        ]);
        assert!(!report.is_success());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].target.framework_spec(), "pytorch");
        assert_eq!(failures[0].message(), Some("denied"));
    }

    #[test]
    fn test_outcome_serialization() {
        let result = BuildResult::failed(
            target(""),
            "ghcr.io/o/x".into(),
            FailureKind::LogStream,
            "closed",
            Duration::from_millis(1),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["kind"], "log-stream");
        assert_eq!(json["target"]["image_reference"], "jammy_python_3.10_cuda_12.4.1_base");
    }
}
