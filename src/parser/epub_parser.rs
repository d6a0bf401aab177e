use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::errors::ParseError;
use super::manifest::{ManifestExpander, manifest_text, parse_manifest};
use super::parser_trait::Parser;
use super::utils::sanitize_file_name;
use crate::common::client::Transport;
use crate::common::models::{DownloadType, ParsedMeta};

const DEFAULT_TITLE: &str = "ebook";

// EPUB：拉取清单 -> 以标题建目录 -> 展开成下载任务
pub struct EpubParser {
    expander: ManifestExpander,
    output_root: PathBuf,   // 书籍目录建在这里
    title: Option<String>,  // 指定时不使用清单里的标题
}

impl EpubParser {
    pub fn new(transport: Arc<dyn Transport>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            expander: ManifestExpander::new(transport),
            output_root: output_root.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

#[async_trait]
impl Parser for EpubParser {
    async fn parse(&self, url: &str) -> Result<ParsedMeta, ParseError> {
        if !self.output_root.is_dir() {
            return Err(ParseError::MissingOutputDir(self.output_root.clone()));
        }

        let manifest_bytes = self.expander.fetch_manifest(url).await?;
        // 和展开时使用同样严格的解码，编码错误时不会留下空目录
        let declared_title = parse_manifest(&manifest_text(&manifest_bytes)?)?.title;

        let title = self
            .title
            .clone()
            .or(declared_title)
            .and_then(|title| sanitize_file_name(&title))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        info!("书名: {}", title);

        let output_dir = self.output_root.join(&title);
        tokio::fs::create_dir_all(&output_dir).await?;

        let expanded = self
            .expander
            .expand_fetched(url, &manifest_bytes, &output_dir)
            .await?;

        Ok(ParsedMeta {
            title,
            download_type: DownloadType::Epub,
            output_dir,
            download_items: expanded.to_download_tasks(),
            metadata_files: vec![
                expanded.metadata.container_path.clone(),
                expanded.metadata.manifest_path.clone(),
            ],
        })
    }
}
