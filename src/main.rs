//! # geh — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与流程分发，业务逻辑见 `lib.rs` 架构文档。

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use geh::config::GehConfig;
use geh::document::Document;
use geh::error::AppError;
use geh::links;

#[derive(Debug, Parser)]
#[command(name = "geh", version, about = "提取 HTML 图片链接 / 设置桌面背景")]
#[command(group(ArgGroup::new("action").required(true).args(["background", "links"])))]
struct Args {
    /// 将图片设为根窗口背景（本地路径、URL 或 `-` 表示 stdin）
    #[arg(short = 'b', long, value_name = "FILE")]
    background: Option<String>,

    /// 输出 HTML 文档中的全部图片链接，每行一个
    #[arg(long, value_name = "FILE")]
    links: Option<String>,

    /// 背景底色（颜色名或 #rrggbb）
    #[arg(short = 'c', long)]
    color: Option<String>,

    /// 背景合成模式：center / scale / crop / fill / tile
    #[arg(short = 's', long = "set", value_name = "MODE")]
    mode: Option<String>,

    /// JSON 配置文件路径
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let mut config = GehConfig::load(args.config.as_deref())?;
    if let Some(color) = args.color {
        config.background.color = color;
    }
    if let Some(mode) = args.mode {
        config.background.mode = mode;
    }

    if let Some(path) = args.links {
        let doc = open_document(path, &config).await?;
        let urls = links::extract_image_urls(&doc)?;
        log::info!("🔗 {} 中找到 {} 个图片链接", doc.name(), urls.len());

        let mut out = std::io::stdout().lock();
        for url in &urls {
            writeln!(out, "{}", url)?;
        }
        out.flush()?;
        return Ok(());
    }

    if let Some(path) = args.background {
        let doc = open_document(path, &config).await?;
        install_background(&doc, &config)?;
    }

    Ok(())
}

/// 识别来源并在需要时抓取到本地临时文件。
async fn open_document(path: String, config: &GehConfig) -> Result<Document, AppError> {
    let mut doc = Document::open(path);
    log::debug!("📄 打开文档 {}（来源：{:?}）", doc.uri(), doc.method());
    if doc.needs_fetch() {
        doc.fetch(&config.fetch).await?;
    }
    Ok(doc)
}

#[cfg(target_os = "linux")]
fn install_background(doc: &Document, config: &GehConfig) -> Result<(), AppError> {
    use geh::background::xlib::XlibDisplay;
    use geh::background::{set_background, BackgroundOutcome};

    let display = XlibDisplay::open()?;
    match set_background(doc.path(), &config.background, &display)? {
        BackgroundOutcome::Composited(mode) => {
            log::info!("✅ 已设置背景 {}（{}）", doc.name(), mode.as_str());
        }
        BackgroundOutcome::SolidFill(cause) => {
            log::warn!("⚠️ 图片未合成（{}），已设置纯色背景", cause);
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn install_background(_doc: &Document, _config: &GehConfig) -> Result<(), AppError> {
    Err(geh::background::BackgroundError::DisplayConnection("当前平台没有 X11 显示服务器".to_string()).into())
}
