use clap::Parser;
use guardian_ai::{cli, config, error, intake, session, view, workflow};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use guardian_common::parse_index_list;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workflow::Workflow;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// スキャンまで進める（失敗時は通知を表示してエラーを返す）
async fn load_and_scan(workflow: &Workflow, file: &std::path::Path) -> Result<()> {
    let (bytes, media_type) = intake::load_file(file)?;
    workflow.accept_file(bytes, &media_type).await?;

    let pb = view::spinner("Running Forensics...");
    let result = workflow.start_scan().await;
    pb.finish_and_clear();

    if result.is_err() {
        for notice in workflow.controller().await.take_notices() {
            view::print_notice(&notice);
        }
    }
    result.map(|_| ())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.endpoint = endpoint;
    }

    match cli.command {
        Commands::Scan { file, json } => {
            let workflow = Workflow::from_config(&config)?;
            load_and_scan(&workflow, &file).await?;

            let controller = workflow.controller().await;
            if let Some(report) = controller.report() {
                if json {
                    println!("{}", serde_json::to_string_pretty(report)?);
                } else {
                    println!("🛡 guardian - スキャン結果: {}\n", file.display());
                    view::print_report(report);
                }
            }
        }

        Commands::Protect { file, action, select, output } => {
            println!("🛡 guardian - 保護処理\n");
            let workflow = Workflow::from_config(&config)?;

            println!("[1/3] スキャン中...");
            load_and_scan(&workflow, &file).await?;
            println!("✔ スキャン完了\n");

            println!("[2/3] {} を適用中...", action);
            if action.uses_selection() {
                for index in parse_index_list(&select)? {
                    workflow.toggle_selection(index).await?;
                }
            }
            let pb = view::spinner("Applying protection...");
            let result = workflow.apply_protection(action).await;
            pb.finish_and_clear();
            if result.is_err() {
                for notice in workflow.controller().await.take_notices() {
                    view::print_notice(&notice);
                }
            }
            result?;
            println!("✔ 保護完了\n");

            println!("[3/3] 保存中...");
            let saved = session::save_download(&workflow, output.as_deref()).await?;
            println!("✔ 保存: {}", saved.display());

            println!("\n✅ 完了");
        }

        Commands::Run { file, output } => {
            println!("🛡 guardian - 対話モード\n");
            let workflow = Workflow::from_config(&config)?;
            session::run_interactive(&workflow, &file, output.as_deref()).await?;
        }

        Commands::Inspect { file } => {
            let (bytes, _) = intake::load_file(&file)?;
            println!("🔍 guardian - メタデータ確認: {}\n", file.display());
            view::print_metadata(&intake::inspect_metadata(&bytes));
        }

        Commands::Config { set_endpoint, show } => {
            let mut config = config;

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ エンドポイントを設定しました");
            }

            if show {
                println!("設定:");
                println!("  エンドポイント: {}", config.endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  アップロード上限: {} bytes", config.max_upload_bytes);
                println!("  保存ファイル名: {}", config.download_file_name);
                println!(
                    "  元画像の再送: {}",
                    if config.resend_source_on_protect { "する" } else { "しない" }
                );
            }
        }
    }

    Ok(())
}
