use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// 並行ビルドの進捗表示（ターゲットごとにスピナー1つ）
#[derive(Clone)]
pub struct BuildProgress {
    multi: MultiProgress,
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// 何も描画しない（テスト・非TTY用）
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    pub fn target(&self, image_reference: &str) -> TargetProgress {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {prefix:.bold} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(image_reference.to_string());
        pb.set_message("waiting...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        TargetProgress { progress_bar: pb }
    }
}

pub struct TargetProgress {
    progress_bar: ProgressBar,
}

impl TargetProgress {
    pub fn set_message(&self, msg: &str) {
        self.progress_bar.set_message(msg.to_string());
    }

    pub fn finish_success(&self) {
        self.progress_bar
            .finish_with_message(format!("{} published", "✓".green()));
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("{} {}", "✗".red(), error));
    }
}
