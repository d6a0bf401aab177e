use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::downloader::models::DownloadTask;

/// 默认并发下载数
pub const DEFAULT_CONCURRENCY: usize = 16;

/// 编号图片支持的扩展名，打包漫画时也只收录这些文件
pub const COMMON_IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

// -----------------------------------------------------------------------------------------------

/// 下载配置，可以从 JSON 文件加载，命令行参数会覆盖文件里的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub concurrency: usize,          // 最大并发数
    pub chunk_size: usize,           // 写文件的缓冲块大小
    pub connect_timeout_secs: u64,   // 建立连接超时
    pub timeout_secs: u64,           // 单个请求的总超时
    pub user_agent: String,
    pub initial_step: i64,           // 探测末尾编号的初始步长
    pub max_probes: Option<usize>,   // 探测次数上限，None 表示不限制
    pub file_name_format: String,    // 图片文件名格式，例如 {:03}
    pub archive_extension: String,   // 图片打包的扩展名，例如 cbz
    pub keep_output_dir: bool,       // 打包后是否保留下载目录
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            chunk_size: 8192,
            connect_timeout_secs: 10,
            timeout_secs: 300,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36".to_string(),
            initial_step: 100,
            max_probes: None,
            file_name_format: "{:03}".to_string(),
            archive_extension: "cbz".to_string(),
            keep_output_dir: false,
        }
    }
}

impl DownloadConfig {
    // 从 JSON 文件加载配置，缺省字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: DownloadConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 在发起任何网络请求之前检查配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("并发数必须大于 0".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("缓冲块大小必须大于 0".to_string()));
        }
        if self.archive_extension.trim().is_empty() {
            return Err(ConfigError::Invalid("打包扩展名不能为空".to_string()));
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------

//需要下载数据的元数据
#[derive(Debug, Clone)]
pub struct ParsedMeta {
    pub title: String,                     // 标题，默认作为输出文件名
    pub download_type: DownloadType,       // 下载类型
    pub output_dir: PathBuf,               // 下载目录，也是打包的源目录
    pub download_items: Vec<DownloadTask>, // 下载任务列表
    pub metadata_files: Vec<PathBuf>,      // 解析阶段写入的文件，清理时和下载结果一起删除
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadType {
    ImageSequence, // 连续编号的图片
    Epub,          // EPUB 内容包
}
