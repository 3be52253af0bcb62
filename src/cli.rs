use clap::{Parser, Subcommand};
use guardian_common::ProtectAction;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guardian")]
#[command(about = "画像プライバシー診断・墨消しツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 診断サービスのURL（設定より優先）
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をスキャンしてレポートを表示
    Scan {
        /// 画像ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// レポートをJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// スキャン後、指定した方法で保護した画像を保存
    Protect {
        /// 画像ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 保護方法 (blur/cloak)
        #[arg(short, long, default_value = "cloak")]
        action: ProtectAction,

        /// ぼかす検出番号（カンマ区切り、例: 0,2）
        #[arg(short, long, default_value = "")]
        select: String,

        /// 出力ファイル/ディレクトリ（省略時: カレントに既定名）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 対話式でスキャン・選択・保護を行う
    Run {
        /// 画像ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 端末内でEXIFメタデータを確認（サービスには送信しない）
    Inspect {
        /// 画像ファイル
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// エンドポイントを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
