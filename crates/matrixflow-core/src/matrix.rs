//! ビルドマトリクスの列挙
//!
//! 4軸の直積を固定の入れ子順（外側から OS → CUDA → フレームワーク → Python）で展開する。

use crate::model::{BuildMatrixConfig, BuildTarget};
use std::collections::HashMap;

/// 設定から全ビルドターゲットを列挙
///
/// いずれかの軸が空なら結果も空（エラーではない）。
pub fn enumerate(config: &BuildMatrixConfig) -> Vec<BuildTarget> {
    let axes = &config.axes;
    let mut targets = Vec::with_capacity(axes.combinations());

    for os in &axes.os {
        for cuda in &axes.cuda {
            for framework in &axes.framework {
                for python in &axes.python {
                    targets.push(BuildTarget::new(
                        os,
                        cuda,
                        framework,
                        python,
                        &config.tag_rule,
                        config.base_image,
                    ));
                }
            }
        }
    }

    tracing::debug!(targets = targets.len(), "Build matrix enumerated");
    targets
}

/// 列挙済みのビルドマトリクス
#[derive(Debug, Clone)]
pub struct BuildMatrix {
    targets: Vec<BuildTarget>,
}

impl BuildMatrix {
    pub fn new(config: &BuildMatrixConfig) -> Self {
        Self {
            targets: enumerate(config),
        }
    }

    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// 複数のターゲットで衝突しているイメージ参照を取得
    ///
    /// 例えば固定の接頭辞で複数の OS を並べるとタグが重なる。
    pub fn duplicate_references(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for target in &self.targets {
            *counts.entry(target.image_reference()).or_default() += 1;
        }

        // 列挙順で返す
        let mut duplicates = Vec::new();
        for target in &self.targets {
            let reference = target.image_reference();
            if counts.get(reference).copied().unwrap_or(0) > 1 && !duplicates.contains(&reference)
            {
                duplicates.push(reference);
            }
        }
        duplicates
    }
}

impl IntoIterator for BuildMatrix {
    type Item = BuildTarget;
    type IntoIter = std::vec::IntoIter<BuildTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axes, BaseImageTemplate};
    use crate::reference::TagRule;
    use std::collections::HashSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn config(os: &[&str], cuda: &[&str], framework: &[&str], python: &[&str]) -> BuildMatrixConfig {
        BuildMatrixConfig {
            base_image: BaseImageTemplate::Micromamba,
            axes: Axes::new(strings(os), strings(cuda), strings(framework), strings(python)),
            ..Default::default()
        }
    }

    #[test]
    fn test_enumerate_example_matrix() {
        let targets = enumerate(&config(&["jammy"], &["12.4.1"], &["", "pytorch"], &["3.10"]));
        assert_eq!(targets.len(), 2);
        assert!(targets[0].image_reference().ends_with("_cuda_12.4.1_base"));
        assert!(targets[1].image_reference().ends_with("_cuda_12.4.1_pytorch"));
    }

    #[test]
    fn test_enumerate_cardinality_and_uniqueness() {
        let targets = enumerate(&config(
            &["jammy", "focal"],
            &["11.8.0", "12.1.1", "12.4.1"],
            &["", "pytorch", "tensorflow=2.15.0"],
            &["3.10", "3.11"],
        ));
        assert_eq!(targets.len(), 2 * 3 * 3 * 2);

        let tuples: HashSet<(&str, &str, &str, &str)> = targets
            .iter()
            .map(|t| {
                (
                    t.base_os_id(),
                    t.accelerator_version(),
                    t.framework_spec(),
                    t.interpreter_version(),
                )
            })
            .collect();
        assert_eq!(tuples.len(), targets.len());
    }

    #[test]
    fn test_enumerate_nesting_order() {
        let targets = enumerate(&config(&["jammy", "focal"], &["11.8.0", "12.4.1"], &[""], &["3.10", "3.11"]));
        let order: Vec<(&str, &str, &str)> = targets
            .iter()
            .map(|t| (t.base_os_id(), t.accelerator_version(), t.interpreter_version()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("jammy", "11.8.0", "3.10"),
                ("jammy", "11.8.0", "3.11"),
                ("jammy", "12.4.1", "3.10"),
                ("jammy", "12.4.1", "3.11"),
                ("focal", "11.8.0", "3.10"),
                ("focal", "11.8.0", "3.11"),
                ("focal", "12.4.1", "3.10"),
                ("focal", "12.4.1", "3.11"),
            ]
        );
    }

    #[test]
    fn test_enumerate_is_stable() {
        let cfg = config(&["jammy"], &["12.4.1"], &["", "pytorch"], &["3.10", "3.11"]);
        assert_eq!(enumerate(&cfg), enumerate(&cfg));
    }

    #[test]
    fn test_enumerate_empty_axis_yields_nothing() {
        let targets = enumerate(&config(&["jammy"], &[], &["pytorch"], &["3.10"]));
        assert!(targets.is_empty());
        assert!(BuildMatrix::new(&config(&[], &["12.4.1"], &[""], &["3.10"])).is_empty());
    }

    #[test]
    fn test_duplicate_references_with_fixed_prefix() {
        let mut cfg = config(&["jammy", "focal"], &["12.4.1"], &["", "pytorch"], &["3.10"]);
        cfg.tag_rule = TagRule {
            prefix: "cuda-images".to_string(),
            ..Default::default()
        };
        let matrix = BuildMatrix::new(&cfg);
        assert_eq!(
            matrix.duplicate_references(),
            vec![
                "cuda-images_python_3.10_cuda_12.4.1_base",
                "cuda-images_python_3.10_cuda_12.4.1_pytorch"
            ]
        );
    }

    #[test]
    fn test_no_duplicates_with_os_prefix() {
        let matrix = BuildMatrix::new(&config(&["jammy", "focal"], &["12.4.1"], &["", "pytorch"], &["3.10"]));
        assert!(matrix.duplicate_references().is_empty());
        assert_eq!(matrix.len(), 4);
    }
}
