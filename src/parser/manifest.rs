use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use tracing::{debug, info};
use url::Url;

use super::errors::ParseError;
use super::models::{ExpandedManifest, ManifestDocument, ManifestEntry, MetadataFiles};
use crate::common::client::Transport;

pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

pub const META_INF_DIR: &str = "META-INF";
pub const CONTAINER_FILE: &str = "container.xml";

fn xml_error(err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml(err.to_string())
}

fn in_namespace(resolved: &ResolveResult, expected: &str) -> bool {
    matches!(resolved, ResolveResult::Bound(Namespace(ns)) if *ns == expected.as_bytes())
}

/// 解析 OPF 清单：收集 opf 命名空间下所有 item 的 href，以及第一个 dc:title
pub fn parse_manifest(xml: &str) -> Result<ManifestDocument, ParseError> {
    let mut reader = NsReader::from_str(xml);
    let mut document = ManifestDocument::default();

    let mut in_title = false;
    let mut title_text = String::new();

    loop {
        let (resolved, event) = reader.read_resolved_event().map_err(xml_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let local_name = e.local_name();
                if in_namespace(&resolved, OPF_NAMESPACE) && local_name.as_ref() == b"item" {
                    let href = e
                        .try_get_attribute("href")
                        .map_err(xml_error)?
                        .ok_or_else(|| ParseError::Xml("item 缺少 href 属性".to_string()))?;
                    let href = href.unescape_value().map_err(xml_error)?.into_owned();
                    debug!("清单条目: {}", href);
                    document.hrefs.push(href);
                } else if matches!(event, Event::Start(_))
                    && document.title.is_none()
                    && in_namespace(&resolved, DC_NAMESPACE)
                    && local_name.as_ref() == b"title"
                {
                    in_title = true;
                    title_text.clear();
                }
            }
            Event::Text(ref text) if in_title => {
                title_text.push_str(&text.unescape().map_err(xml_error)?);
            }
            Event::CData(ref data) if in_title => {
                title_text.push_str(&String::from_utf8_lossy(data));
            }
            Event::End(_) if in_title => {
                in_title = false;
                let title = title_text.trim();
                if !title.is_empty() {
                    document.title = Some(title.to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(document)
}

/// 内容包的 URL 布局
///
/// 清单位于 `<包根目录>/<内容目录>/<清单文件>`，例如 `.../OEBPS/content.opf`，
/// 容器描述文件固定在 `<包根目录>/META-INF/container.xml`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    pub manifest_url: Url,
    pub package_root: Url,
    pub content_dir: PathBuf,   // 本地内容目录，相对输出目录
    pub manifest_file: String,  // 清单文件名
}

impl PackageLayout {
    pub fn from_manifest_url(manifest_url: &str) -> Result<Self, ParseError> {
        let manifest_url = Url::parse(manifest_url)?;

        let segments: Vec<String> = manifest_url
            .path_segments()
            .map(|segments| segments.map(|s| s.to_string()).collect())
            .unwrap_or_default();

        let manifest_file = match segments.last() {
            Some(name) if !name.is_empty() => decode_segment(name, manifest_url.as_str())?,
            _ => {
                return Err(ParseError::InvalidUrl(format!(
                    "清单地址缺少文件名: {}",
                    manifest_url
                )));
            }
        };

        // 清单在包根目录下一级时，内容目录就是那一级目录；否则清单直接在根目录
        let (package_root, content_dir) = if segments.len() >= 2 {
            let dir_name = decode_segment(&segments[segments.len() - 2], manifest_url.as_str())?;
            (manifest_url.join("../")?, PathBuf::from(dir_name))
        } else {
            (manifest_url.join("./")?, PathBuf::new())
        };

        Ok(Self {
            manifest_url,
            package_root,
            content_dir,
            manifest_file,
        })
    }

    pub fn container_url(&self) -> Result<Url, ParseError> {
        Ok(self
            .package_root
            .join(&format!("{}/{}", META_INF_DIR, CONTAINER_FILE))?)
    }

    /// 相对清单自身地址解析 href
    pub fn resolve(&self, href: &str) -> Result<Url, ParseError> {
        Ok(self.manifest_url.join(href)?)
    }
}

fn decode_segment(segment: &str, source: &str) -> Result<String, ParseError> {
    let decoded = urlencoding::decode(segment)
        .map_err(|_| ParseError::UnsafeHref(source.to_string()))?
        .into_owned();

    if decoded.is_empty()
        || decoded == "."
        || decoded == ".."
        || decoded.contains('/')
        || decoded.contains('\\')
    {
        return Err(ParseError::UnsafeHref(source.to_string()));
    }
    Ok(decoded)
}

/// 把 href 转成本地相对路径，`/` 分隔的每一段都变成一层目录
///
/// 去掉片段和查询参数，逐段做百分号解码；绝对路径、外部 URL 和 `..` 都会被拒绝。
pub fn local_relative_path(href: &str) -> Result<PathBuf, ParseError> {
    let path = href.split(['#', '?']).next().unwrap_or_default();

    if path.starts_with('/') || Url::parse(path).is_ok() {
        return Err(ParseError::UnsafeHref(href.to_string()));
    }

    let mut local_path = PathBuf::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        local_path.push(decode_segment(segment, href)?);
    }

    if local_path.as_os_str().is_empty() {
        return Err(ParseError::UnsafeHref(href.to_string()));
    }
    Ok(local_path)
}

/// 为每个 href 生成一个清单条目，条目数量和顺序与清单完全一致
pub fn plan_entries(
    layout: &PackageLayout,
    hrefs: &[String],
) -> Result<Vec<ManifestEntry>, ParseError> {
    hrefs
        .iter()
        .map(|href| {
            Ok(ManifestEntry {
                href: href.clone(),
                url: layout.resolve(href)?.to_string(),
                local_path: local_relative_path(href)?,
            })
        })
        .collect()
}

/// 根据 OPF 清单生成下载计划
pub struct ManifestExpander {
    transport: Arc<dyn Transport>,
}

impl ManifestExpander {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn fetch_manifest(&self, manifest_url: &str) -> Result<Vec<u8>, ParseError> {
        Ok(self.transport.get_bytes(manifest_url).await?)
    }

    // 只取标题，用作默认输出名
    pub async fn fetch_title(&self, manifest_url: &str) -> Result<Option<String>, ParseError> {
        let bytes = self.fetch_manifest(manifest_url).await?;
        let document = parse_manifest(&manifest_text(&bytes)?)?;
        Ok(document.title)
    }

    pub async fn expand(
        &self,
        manifest_url: &str,
        out_dir: &Path,
    ) -> Result<ExpandedManifest, ParseError> {
        let manifest_bytes = self.fetch_manifest(manifest_url).await?;
        self.expand_fetched(manifest_url, &manifest_bytes, out_dir).await
    }

    /// 使用已经拉取到的清单内容展开，容器描述文件仍需要拉取
    pub async fn expand_fetched(
        &self,
        manifest_url: &str,
        manifest_bytes: &[u8],
        out_dir: &Path,
    ) -> Result<ExpandedManifest, ParseError> {
        if !out_dir.is_dir() {
            return Err(ParseError::MissingOutputDir(out_dir.to_path_buf()));
        }

        let layout = PackageLayout::from_manifest_url(manifest_url)?;
        let document = parse_manifest(&manifest_text(manifest_bytes)?)?;
        let entries = plan_entries(&layout, &document.hrefs)?;

        let content_dir = out_dir.join(&layout.content_dir);
        let meta_dir = out_dir.join(META_INF_DIR);
        tokio::fs::create_dir_all(&content_dir).await?;
        tokio::fs::create_dir_all(&meta_dir).await?;

        // 两个描述文件也是成品的一部分，原样保存
        let container_url = layout.container_url()?;
        debug!("拉取容器描述文件: {}", container_url);
        let container_bytes = self.transport.get_bytes(container_url.as_str()).await?;
        let container_path = meta_dir.join(CONTAINER_FILE);
        tokio::fs::write(&container_path, &container_bytes).await?;

        let manifest_path = content_dir.join(&layout.manifest_file);
        tokio::fs::write(&manifest_path, manifest_bytes).await?;

        // 先建目录再下载文件，下载器不负责创建目录
        for entry in &entries {
            if let Some(parent) = content_dir.join(&entry.local_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        info!("清单共 {} 个资源", entries.len());
        Ok(ExpandedManifest {
            title: document.title,
            metadata: MetadataFiles {
                container_path,
                manifest_path,
            },
            content_dir,
            entries,
        })
    }
}

/// 清单必须是合法的 UTF-8
pub fn manifest_text(bytes: &[u8]) -> Result<String, ParseError> {
    String::from_utf8(bytes.to_vec()).map_err(xml_error)
}
