mod commands;
mod report;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "matrixflow")]
#[command(about = "CUDA ベースイメージをマトリクスでまとめてビルド・公開する", long_about = None)]
struct Cli {
    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// マトリクス全体をビルドしてレジストリに公開
    Build {
        /// matrix.kdl のパス（省略時は自動検出）
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// レジストリのユーザー名
        #[arg(short, long, env = "REGISTRY_USERNAME")]
        username: Option<String>,
        /// レジストリのパスワード（トークン）
        #[arg(short, long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// ターゲットごとの進捗スピナーを表示
        #[arg(long)]
        progress: bool,
    },
    /// ビルド対象を一覧表示（ビルドは行わない）
    Plan {
        /// matrix.kdl のパス（省略時は自動検出）
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 設定を検証
    Validate {
        /// matrix.kdl のパス（省略時は自動検出）
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Build {
            config,
            username,
            password,
            progress,
        } => {
            let succeeded =
                commands::build::handle(config.as_deref(), username, password, progress).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Plan { config, json } => {
            commands::plan::handle(config.as_deref(), json)?;
        }
        Commands::Validate { config } => {
            commands::validate::handle(config.as_deref())?;
        }
        Commands::Version => {
            println!("matrixflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
