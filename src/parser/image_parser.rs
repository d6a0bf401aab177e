use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::errors::ParseError;
use super::parser_trait::Parser;
use super::sequence::{DEFAULT_INITIAL_STEP, SequenceDiscoverer};
use super::template::UrlTemplate;
use super::utils::extension_for_content_type;
use crate::common::client::Transport;
use crate::common::models::{DownloadConfig, DownloadType, ParsedMeta};
use crate::downloader::models::DownloadTask;

#[derive(Debug, Clone)]
pub struct ImageSequenceOptions {
    pub output_dir: PathBuf,      // 必须已经存在
    pub start: u64,
    pub stop: Option<u64>,        // 包含在内；None 时自动探测
    pub file_name_format: String, // 本地文件名格式，例如 {:03}
    pub initial_step: i64,
    pub max_probes: Option<usize>,
}

impl ImageSequenceOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            start: 1,
            stop: None,
            file_name_format: "{:03}".to_string(),
            initial_step: DEFAULT_INITIAL_STEP,
            max_probes: None,
        }
    }

    pub fn from_config(output_dir: impl Into<PathBuf>, config: &DownloadConfig) -> Self {
        Self {
            file_name_format: config.file_name_format.clone(),
            initial_step: config.initial_step,
            max_probes: config.max_probes,
            ..Self::new(output_dir)
        }
    }
}

// 连续编号图片：模板 + 起止编号 -> 下载任务列表
pub struct ImageSequenceParser {
    transport: Arc<dyn Transport>,
    options: ImageSequenceOptions,
}

impl ImageSequenceParser {
    pub fn new(transport: Arc<dyn Transport>, options: ImageSequenceOptions) -> Self {
        Self { transport, options }
    }

    // 通过第一张图片的 Content-Type 推断扩展名
    async fn detect_extension(&self, url: &str) -> Result<&'static str, ParseError> {
        let info = self.transport.head(url).await?;
        if !info.is_success() {
            return Err(ParseError::StartNotFound(url.to_string()));
        }

        let content_type = info.content_type.unwrap_or_default();
        debug!("起始图片类型: {}", content_type);
        extension_for_content_type(&content_type)
            .ok_or(ParseError::UnsupportedContentType(content_type))
    }
}

#[async_trait]
impl Parser for ImageSequenceParser {
    async fn parse(&self, url: &str) -> Result<ParsedMeta, ParseError> {
        let template = UrlTemplate::parse(url)?;
        let name_format = UrlTemplate::parse(&self.options.file_name_format)?;

        let output_dir = &self.options.output_dir;
        if !output_dir.is_dir() {
            return Err(ParseError::MissingOutputDir(output_dir.clone()));
        }

        let start = self.options.start;
        let stop = match self.options.stop {
            Some(stop) => stop,
            None => {
                info!("未指定结束编号，开始探测...");
                SequenceDiscoverer::new(Arc::clone(&self.transport))
                    .with_max_probes(self.options.max_probes)
                    .find_upper_bound(&template, start, self.options.initial_step)
                    .await?
            }
        };

        let extension = self.detect_extension(&template.format(start)).await?;
        info!("图片编号范围: {}..={}, 扩展名: {}", start, stop, extension);

        let download_items = (start..=stop)
            .map(|number| {
                let file_name = format!("{}.{}", name_format.format(number), extension);
                DownloadTask::new(template.format(number), output_dir.join(file_name))
            })
            .collect();

        let title = output_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "images".to_string());

        Ok(ParsedMeta {
            title,
            download_type: DownloadType::ImageSequence,
            output_dir: output_dir.clone(),
            download_items,
            metadata_files: Vec::new(),
        })
    }
}
