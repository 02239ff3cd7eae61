use crate::reference::TagRule;
use serde::{Deserialize, Serialize};

/// ベースイメージのテンプレート
///
/// 1つの設定で有効なテンプレートは常に1つだけ（混在しない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseImageTemplate {
    /// cgr.dev/chainguard/wolfi-base（最小構成・ハードニング済み）
    #[default]
    Wolfi,
    /// ghcr.io/mamba-org/micromamba（ビルド済みランタイムイメージ）
    Micromamba,
}

impl BaseImageTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            BaseImageTemplate::Wolfi => "wolfi",
            BaseImageTemplate::Micromamba => "micromamba",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wolfi" => Some(BaseImageTemplate::Wolfi),
            "micromamba" => Some(BaseImageTemplate::Micromamba),
            _ => None,
        }
    }

    /// ベースイメージに micromamba が同梱されているか
    pub fn ships_micromamba(&self) -> bool {
        matches!(self, BaseImageTemplate::Micromamba)
    }
}

/// マトリクスの4軸（順序付き）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub os: Vec<String>,
    pub cuda: Vec<String>,
    pub framework: Vec<String>,
    pub python: Vec<String>,
}

impl Axes {
    /// 各軸の重複値を除いて作成（最初の出現を残す）
    pub fn new(
        os: Vec<String>,
        cuda: Vec<String>,
        framework: Vec<String>,
        python: Vec<String>,
    ) -> Self {
        Self {
            os: dedupe("os", os),
            cuda: dedupe("cuda", cuda),
            framework: dedupe("framework", framework),
            python: dedupe("python", python),
        }
    }

    /// 直積の要素数
    pub fn combinations(&self) -> usize {
        self.os.len() * self.cuda.len() * self.framework.len() * self.python.len()
    }
}

fn dedupe(axis: &str, values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if unique.contains(&value) {
            tracing::warn!(axis, value = %value, "Duplicate axis value ignored");
            continue;
        }
        unique.push(value);
    }
    unique
}

/// ビルドマトリクス設定
///
/// 起動時に一度だけ読み込まれ、以降は参照のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMatrixConfig {
    /// ソースリポジトリ名（OCI source ラベルに使用）
    pub repository: String,

    /// レジストリアドレス（例: ghcr.io）
    pub registry: String,

    /// 公開先の名前空間。未指定時はレジストリのユーザー名
    pub namespace: Option<String>,

    /// ベースイメージのテンプレート
    pub base_image: BaseImageTemplate,

    /// タグ導出ルール
    pub tag_rule: TagRule,

    /// マトリクスの軸
    pub axes: Axes,
}

impl Default for BuildMatrixConfig {
    fn default() -> Self {
        Self {
            repository: "wolfi-cuda-base-image".to_string(),
            registry: "ghcr.io".to_string(),
            namespace: None,
            base_image: BaseImageTemplate::Wolfi,
            tag_rule: TagRule::default(),
            axes: Axes::new(
                vec!["wolfi".to_string()],
                vec!["12.4.1".to_string()],
                vec![
                    String::new(),
                    "pytorch".to_string(),
                    "tensorflow=2.15.0".to_string(),
                ],
                vec!["3.11".to_string()],
            ),
        }
    }
}

impl BuildMatrixConfig {
    /// 公開先の名前空間を解決
    pub fn namespace_for<'a>(&'a self, identity: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(identity)
    }

    /// 公開先イメージを組み立てる
    ///
    /// `{registry}/{namespace}/{image_reference}` 形式。
    pub fn destination(&self, identity: &str, image_reference: &str) -> String {
        format!(
            "{}/{}/{}",
            self.registry,
            self.namespace_for(identity).to_lowercase(),
            image_reference
        )
    }

    /// org.opencontainers.image.source ラベルの値
    pub fn source_url(&self, identity: &str) -> String {
        format!(
            "https://github.com/{}/{}",
            self.namespace_for(identity),
            self.repository
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_wolfi_table() {
        let config = BuildMatrixConfig::default();
        assert_eq!(config.repository, "wolfi-cuda-base-image");
        assert_eq!(config.base_image, BaseImageTemplate::Wolfi);
        assert_eq!(config.axes.framework.len(), 3);
        assert_eq!(config.axes.combinations(), 3);
    }

    #[test]
    fn test_axes_dedupe_keeps_first() {
        let axes = Axes::new(
            vec!["jammy".into(), "focal".into(), "jammy".into()],
            vec!["12.4.1".into()],
            vec!["".into()],
            vec!["3.10".into()],
        );
        assert_eq!(axes.os, vec!["jammy", "focal"]);
        assert_eq!(axes.combinations(), 2);
    }

    #[test]
    fn test_template_from_name() {
        assert_eq!(
            BaseImageTemplate::from_name("Micromamba"),
            Some(BaseImageTemplate::Micromamba)
        );
        assert_eq!(BaseImageTemplate::from_name("alpine"), None);
        assert!(!BaseImageTemplate::Wolfi.ships_micromamba());
    }

    #[test]
    fn test_destination_uses_identity_by_default() {
        let config = BuildMatrixConfig::default();
        assert_eq!(
            config.destination("Octocat", "wolfi_python_3.11_cuda_12.4.1_base"),
            "ghcr.io/octocat/wolfi_python_3.11_cuda_12.4.1_base"
        );
        assert_eq!(
            config.source_url("octocat"),
            "https://github.com/octocat/wolfi-cuda-base-image"
        );
    }

    #[test]
    fn test_destination_with_namespace() {
        let config = BuildMatrixConfig {
            namespace: Some("my-org".to_string()),
            ..Default::default()
        };
        assert_eq!(config.destination("octocat", "x"), "ghcr.io/my-org/x");
        assert_eq!(
            config.source_url("octocat"),
            "https://github.com/my-org/wolfi-cuda-base-image"
        );
    }
}
