use crate::model::BaseImageTemplate;
use crate::reference::{self, TagRule};
use serde::Serialize;
use std::fmt;

/// ビルドターゲット（マトリクスの1要素）
///
/// `image_reference` と `base_image` は4つの軸の値から生成時に導出され、
/// 以降変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildTarget {
    base_os_id: String,
    accelerator_version: String,
    framework_spec: String,
    interpreter_version: String,
    image_reference: String,
    base_image: String,
}

impl BuildTarget {
    pub fn new(
        base_os_id: impl Into<String>,
        accelerator_version: impl Into<String>,
        framework_spec: impl Into<String>,
        interpreter_version: impl Into<String>,
        tag_rule: &TagRule,
        template: BaseImageTemplate,
    ) -> Self {
        let base_os_id = base_os_id.into();
        let accelerator_version = accelerator_version.into();
        let framework_spec = framework_spec.into();
        let interpreter_version = interpreter_version.into();

        let image_reference = reference::image_reference(
            tag_rule,
            &base_os_id,
            &accelerator_version,
            &framework_spec,
            &interpreter_version,
        );
        let base_image = reference::base_image(template, &base_os_id, &accelerator_version);

        Self {
            base_os_id,
            accelerator_version,
            framework_spec,
            interpreter_version,
            image_reference,
            base_image,
        }
    }

    pub fn base_os_id(&self) -> &str {
        &self.base_os_id
    }

    pub fn accelerator_version(&self) -> &str {
        &self.accelerator_version
    }

    pub fn framework_spec(&self) -> &str {
        &self.framework_spec
    }

    pub fn interpreter_version(&self) -> &str {
        &self.interpreter_version
    }

    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    pub fn base_image(&self) -> &str {
        &self.base_image
    }

    /// レポート表示用の軸タプル
    pub fn axis_tuple(&self) -> AxisTuple<'_> {
        AxisTuple(self)
    }
}

/// `(os=.., cuda=.., framework=.., python=..)` 形式で表示する
pub struct AxisTuple<'a>(&'a BuildTarget);

impl fmt::Display for AxisTuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.0;
        let framework = if target.framework_spec.is_empty() {
            "(none)"
        } else {
            target.framework_spec.as_str()
        };
        write!(
            f,
            "(os={}, cuda={}, framework={}, python={})",
            target.base_os_id, target.accelerator_version, framework, target.interpreter_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_derived_fields() {
        let t = target("pytorch");
        assert_eq!(t.image_reference(), "jammy_python_3.10_cuda_12.4.1_pytorch");
        assert_eq!(t.base_image(), "ghcr.io/mamba-org/micromamba:jammy-cuda-12.4.1");
    }

    #[test]
    fn test_identical_inputs_are_equal() {
        assert_eq!(target("tensorflow=2.15.0"), target("tensorflow=2.15.0"));
        assert_eq!(
            target("tensorflow=2.15.0").image_reference(),
            target("tensorflow=2.15.0").image_reference()
        );
    }

    #[test]
    fn test_axis_tuple_display() {
        assert_eq!(
            target("").axis_tuple().to_string(),
            "(os=jammy, cuda=12.4.1, framework=(none), python=3.10)"
        );
        assert_eq!(
            target("tensorflow=2.15.0").axis_tuple().to_string(),
            "(os=jammy, cuda=12.4.1, framework=tensorflow=2.15.0, python=3.10)"
        );
    }
}
