use std::path::{Path, PathBuf};

use crate::downloader::models::DownloadTask;

/// 清单里声明的一个资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub href: String,        // 清单中的原始 href
    pub url: String,         // 相对清单地址解析出的绝对 URL
    pub local_path: PathBuf, // 相对内容目录的本地路径，目录层级和 href 一致
}

/// 解析后的清单文档
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDocument {
    pub title: Option<String>,
    pub hrefs: Vec<String>,
}

/// 原样保存下来的两个描述文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFiles {
    pub container_path: PathBuf, // META-INF/container.xml
    pub manifest_path: PathBuf,  // 例如 OEBPS/content.opf
}

#[derive(Debug, Clone)]
pub struct ExpandedManifest {
    pub title: Option<String>,
    pub metadata: MetadataFiles,
    pub content_dir: PathBuf, // 清单所在目录对应的本地目录
    pub entries: Vec<ManifestEntry>,
}

impl ExpandedManifest {
    /// 每个清单条目对应一个下载任务，顺序与清单一致
    pub fn to_download_tasks(&self) -> Vec<DownloadTask> {
        self.entries
            .iter()
            .map(|entry| DownloadTask::new(entry.url.clone(), self.destination(entry)))
            .collect()
    }

    pub fn destination(&self, entry: &ManifestEntry) -> PathBuf {
        self.content_dir.join(&entry.local_path)
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }
}
