//! 命令行入口：翻译一个文件或标准输入的文本
//!
//! 主要用于联调与缓存预热；凭证通过 .env.local / 环境变量提供。

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use icebreak_translation::{TargetLang, TranslationConfig, TranslationService};

#[derive(Parser)]
#[command(name = "icebreak-translate", about = "翻译详情文本并维护翻译缓存")]
struct Cli {
    /// 目标语言（zh-CN 或 en）
    #[arg(short, long, default_value = "zh-CN")]
    lang: String,

    /// 待翻译的文本文件；缺省从标准输入读取
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let lang: TargetLang = match cli.lang.parse() {
        Ok(lang) => lang,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let text = match read_input(cli.input.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("读取输入失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = match TranslationService::new(TranslationConfig::load()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("服务初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Ctrl-C 也要走落盘路径，避免丢掉本次会话积累的缓存
    tokio::select! {
        translated = service.translate_long(&text, lang) => {
            println!("{translated}");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("收到中断信号，落盘缓存后退出");
        }
    }

    service.shutdown();
    ExitCode::SUCCESS
}

fn read_input(path: Option<&std::path::Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
