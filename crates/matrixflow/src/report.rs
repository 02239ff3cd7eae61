use colored::Colorize;
use matrixflow_build::{BuildOutcome, BuildReport};

/// 完了レポートを表示
pub fn print_report(report: &BuildReport) {
    println!();
    println!("{}", "ビルド結果:".bold());
    for result in report.results() {
        let seconds = result.duration_ms as f64 / 1000.0;
        match &result.outcome {
            BuildOutcome::Succeeded => {
                println!(
                    "  {} {} ({:.1}s)",
                    "✓".green(),
                    result.destination.cyan(),
                    seconds
                );
            }
            BuildOutcome::Failed { kind, .. } => {
                println!(
                    "  {} {} [{}] ({:.1}s)",
                    "✗".red(),
                    result.destination.cyan(),
                    kind,
                    seconds
                );
            }
        }
    }

    println!();
    if report.is_success() {
        println!(
            "{}",
            format!("✓ 全{}件のビルドが完了しました！", report.len())
                .green()
                .bold()
        );
        return;
    }

    println!(
        "{}",
        format!(
            "✗ {}件中{}件が失敗しました",
            report.len(),
            report.failed()
        )
        .red()
        .bold()
    );
    println!();
    println!("{}", "失敗したターゲット:".yellow());
    for result in report.failures() {
        println!("  • {}", result.target.axis_tuple());
        if let Some(message) = result.message() {
            println!("    {}", message.dimmed());
        }
    }
}
