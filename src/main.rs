use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser as _;
use tracing::{debug, error, info, warn};

use ebook_fetcher::common::client::{HttpClient, Transport};
use ebook_fetcher::common::logger::PrettyLogger;
use ebook_fetcher::common::models::{DownloadConfig, ParsedMeta};
use ebook_fetcher::downloader::{BarProgress, DownloadCore};
use ebook_fetcher::parser::{
    EpubParser, ImageSequenceOptions, ImageSequenceParser, Parser, ParseError,
};
use ebook_fetcher::post_process::post_process;
use ebook_fetcher::{Result, log_error, log_info, log_step, log_success, log_warning};

mod cli;

/// 合并配置文件和命令行参数
fn load_config(args: &cli::Cli) -> Result<DownloadConfig> {
    let mut config = match &args.config {
        Some(path) => DownloadConfig::from_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => DownloadConfig::default(),
    };

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.keep {
        config.keep_output_dir = true;
    }
    if let cli::Command::Images(images) = &args.command {
        if let Some(format) = &images.name_format {
            config.file_name_format = format.clone();
        }
        if let Some(ext) = &images.archive_ext {
            config.archive_extension = ext.clone();
        }
    }

    config.validate()?;
    debug!("配置: {:?}", config);
    Ok(config)
}

/// 解析输入，生成下载计划
async fn parse_input(
    args: &cli::Cli,
    config: &DownloadConfig,
    transport: Arc<dyn Transport>,
) -> std::result::Result<ParsedMeta, ParseError> {
    match &args.command {
        cli::Command::Images(images) => {
            // 创建输出目录
            tokio::fs::create_dir_all(&images.output_dir).await?;
            let mut options = ImageSequenceOptions::from_config(images.output_dir.clone(), config);
            options.start = images.start;
            options.stop = images.stop;

            ImageSequenceParser::new(transport, options)
                .parse(&images.url)
                .await
        }
        cli::Command::Epub(epub) => {
            tokio::fs::create_dir_all(&epub.output_dir).await?;
            EpubParser::new(transport, epub.output_dir.clone())
                .with_title(epub.title.clone())
                .parse(&epub.url)
                .await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = load_config(&args)?;
    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(&config)?);

    log_step!("解析下载内容");
    let parsed = parse_input(&args, &config, Arc::clone(&transport))
        .await
        .map_err(|e| {
            error!("解析失败: {}", e);
            e
        })?;
    log_info!("标题: << {} >>", parsed.title);
    PrettyLogger::file_info("下载目录", parsed.output_dir.display().to_string());

    // Ctrl-C 时停止尚未开始的任务并中止正在传输的任务
    let downloader = DownloadCore::from_config(transport, &config)?;
    let cancel_token = downloader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到中断信号，正在取消下载...");
            cancel_token.cancel();
        }
    });

    log_step!("开始下载 {} 个文件", parsed.download_items.len());
    let result = downloader
        .run(parsed.download_items.clone(), Arc::new(BarProgress::new()))
        .await;

    PrettyLogger::separator();
    PrettyLogger::batch_summary(result.attempted, result.succeeded, result.failed);
    for failure in &result.failures {
        log_error!("{} -> {}", failure.url, failure.reason);
    }

    if downloader.cancel_token().is_cancelled() {
        log_warning!("下载已取消，跳过打包");
        return Err("下载已取消".into());
    }

    log_step!("打包");
    let archive_path: PathBuf = post_process(&parsed, &result, &config).await?;
    PrettyLogger::file_info("输出文件", archive_path.display().to_string());

    if result.all_succeeded() {
        log_success!("全部完成！");
    } else {
        log_warning!("有 {} 个文件下载失败，已保留下载目录", result.failed);
    }
    info!("处理结束");
    Ok(())
}
