//! イメージ参照とベースイメージの導出
//!
//! どちらも I/O を持たない純粋関数。同じ入力からは常に同じ文字列が得られる。

use crate::model::BaseImageTemplate;
use serde::{Deserialize, Serialize};

/// タグ接頭辞のデフォルト（ベースOS識別子を展開）
pub const DEFAULT_TAG_PREFIX: &str = "{os}";

/// タグの区切り文字
pub const TAG_SEPARATOR: &str = "_";

/// フレームワーク指定が空のときのタグ
pub const BASE_FRAMEWORK_TAG: &str = "base";

/// イメージ参照の導出ルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    /// 接頭辞テンプレート。`{os}` はベースOS識別子に置換される。空なら接頭辞なし
    pub prefix: String,

    /// フレームワーク指定から抜き出すキーワード（先頭から順に照合）
    pub framework_keywords: Vec<String>,
}

impl Default for TagRule {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TAG_PREFIX.to_string(),
            framework_keywords: vec!["tensorflow".to_string()],
        }
    }
}

impl TagRule {
    /// 接頭辞テンプレートを展開
    pub fn expand_prefix(&self, base_os_id: &str) -> String {
        self.prefix.replace("{os}", base_os_id)
    }
}

/// フレームワーク指定からタグ部分を決定
///
/// - 空 → `"base"`
/// - キーワードを含む → そのキーワード（`name=version` の version は使わない）
/// - それ以外 → 指定そのまま
pub fn framework_tag<'a>(framework_spec: &'a str, keywords: &'a [String]) -> &'a str {
    if framework_spec.is_empty() {
        return BASE_FRAMEWORK_TAG;
    }

    let spec_lower = framework_spec.to_lowercase();
    keywords
        .iter()
        .find(|keyword| !keyword.is_empty() && spec_lower.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.as_str())
        .unwrap_or(framework_spec)
}

/// イメージ参照（タグ）を導出
///
/// `[prefix_]python_{interpreter}_cuda_{accelerator}_{framework_tag}` を小文字化したもの。
pub fn image_reference(
    rule: &TagRule,
    base_os_id: &str,
    accelerator_version: &str,
    framework_spec: &str,
    interpreter_version: &str,
) -> String {
    let prefix = rule.expand_prefix(base_os_id);
    let tag = framework_tag(framework_spec, &rule.framework_keywords);

    let mut parts: Vec<&str> = Vec::with_capacity(6);
    if !prefix.is_empty() {
        parts.push(prefix.as_str());
    }
    parts.extend([
        "python",
        interpreter_version,
        "cuda",
        accelerator_version,
        tag,
    ]);

    parts.join(TAG_SEPARATOR).to_lowercase()
}

/// ビルド元のベースイメージを導出
pub fn base_image(
    template: BaseImageTemplate,
    base_os_id: &str,
    accelerator_version: &str,
) -> String {
    match template {
        BaseImageTemplate::Wolfi => {
            format!("cgr.dev/chainguard/wolfi-base:cuda-{}", accelerator_version)
        }
        BaseImageTemplate::Micromamba => format!(
            "ghcr.io/mamba-org/micromamba:{}-cuda-{}",
            base_os_id, accelerator_version
        ),
    }
}
