use async_trait::async_trait;

use super::errors::ParseError;
use crate::common::models::ParsedMeta;

// 定义一个trait，用于把输入 URL 解析成下载计划，然后返回元数据
// 编号图片和 EPUB 各自实现这个trait
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(&self, url: &str) -> Result<ParsedMeta, ParseError>;
}
