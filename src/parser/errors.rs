use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::common::client::TransportError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("无效的URL模板: {0}")]
    InvalidTemplate(String),

    #[error("URL模板必须只包含一个占位符，实际 {found} 个: {template}")]
    TemplateSlots { template: String, found: usize },

    #[error("输出目录不存在: {}", .0.display())]
    MissingOutputDir(PathBuf),

    #[error("起始编号超出范围: {0}")]
    StartOutOfRange(u64),

    #[error("起始资源不存在: {0}")]
    StartNotFound(String),

    #[error("探测次数超过上限 {0}，资源编号可能没有上界")]
    ProbeLimitExceeded(usize),

    #[error("无法识别的图片类型: {0}")]
    UnsupportedContentType(String),

    #[error("清单解析失败: {0}")]
    Xml(String),

    #[error("不安全的资源路径: {0}")]
    UnsafeHref(String),

    #[error("网络请求失败: {0}")]
    Transport(#[from] TransportError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析错误: {0}")]
    ParseError(String),
}

impl From<ParseIntError> for ParseError {
    fn from(err: ParseIntError) -> Self {
        ParseError::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for ParseError {
    fn from(err: url::ParseError) -> Self {
        ParseError::InvalidUrl(err.to_string())
    }
}
