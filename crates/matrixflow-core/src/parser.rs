//! matrix.kdl パーサー
//!
//! マトリクス KDL 構文をパースして BuildMatrixConfig を生成する。

use crate::error::{MatrixError, Result};
use crate::model::{Axes, BaseImageTemplate, BuildMatrixConfig};
use crate::reference::TagRule;
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// KDLファイルを BuildMatrixConfig にパース
pub fn parse_matrix_file(path: &Path) -> Result<BuildMatrixConfig> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "Parsing matrix file");
    parse_matrix(&content)
}

/// KDL文字列を BuildMatrixConfig にパース
pub fn parse_matrix(content: &str) -> Result<BuildMatrixConfig> {
    let doc: KdlDocument = content.parse()?;
    let defaults = BuildMatrixConfig::default();

    let mut repository: Option<String> = None;
    let mut registry = defaults.registry;
    let mut namespace = None;
    let mut base_image = defaults.base_image;
    let mut tag_rule = TagRule::default();
    let mut axes: Option<Axes> = None;

    for node in doc.nodes() {
        match node.name().value() {
            "matrix" => repository = first_string(node),
            "registry" => {
                registry = first_string(node).ok_or_else(|| {
                    MatrixError::InvalidConfig("registry にはアドレスが必要です".to_string())
                })?;
            }
            "namespace" => namespace = first_string(node).filter(|s| !s.is_empty()),
            "base-image" => {
                let name = first_string(node).ok_or_else(|| {
                    MatrixError::InvalidConfig("base-image にはテンプレート名が必要です".to_string())
                })?;
                base_image = BaseImageTemplate::from_name(&name).ok_or_else(|| {
                    MatrixError::InvalidConfig(format!(
                        "不明な base-image です: {} (wolfi または micromamba)",
                        name
                    ))
                })?;
            }
            "tag-prefix" => {
                // 空文字列は接頭辞なし
                tag_rule.prefix = first_string(node).unwrap_or_default();
            }
            "framework-keywords" => {
                tag_rule.framework_keywords = strings(node);
            }
            "axes" => axes = Some(parse_axes(node)?),
            _ => {
                // 不明なノードはスキップ
            }
        }
    }

    let repository = repository
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MatrixError::InvalidConfig("matrix ノードが必要です".to_string()))?;
    let axes =
        axes.ok_or_else(|| MatrixError::InvalidConfig("axes ノードが必要です".to_string()))?;

    Ok(BuildMatrixConfig {
        repository,
        registry,
        namespace,
        base_image,
        tag_rule,
        axes,
    })
}

/// axes ノードをパース
fn parse_axes(node: &KdlNode) -> Result<Axes> {
    let mut os = Vec::new();
    let mut cuda = Vec::new();
    let mut framework = Vec::new();
    let mut python = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "os" => os.extend(strings(child)),
                "cuda" => cuda.extend(strings(child)),
                "framework" => framework.extend(strings(child)),
                "python" => python.extend(strings(child)),
                other => {
                    return Err(MatrixError::InvalidConfig(format!(
                        "axes に不明な軸があります: {}",
                        other
                    )));
                }
            }
        }
    }

    Ok(Axes::new(os, cuda, framework, python))
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// 位置引数の文字列をすべて取得
fn strings(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
