use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::error::ArchiveError;
use crate::common::models::COMMON_IMAGE_EXTENSIONS;

pub const EPUB_MIMETYPE_ENTRY: &str = "mimetype";
pub const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";
pub const EPUB_EXTENSION: &str = "epub";

/// 必须作为第一个条目、且不压缩写入的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedEntry {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ArchiveSpec {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub first_entry: Option<ForcedEntry>,
    pub accepted_extensions: Option<Vec<String>>, // None 表示收录所有文件
}

impl ArchiveSpec {
    /// EPUB：`mimetype` 必须是第一个条目且不压缩，其余文件全部收录
    pub fn epub(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            first_entry: Some(ForcedEntry {
                name: EPUB_MIMETYPE_ENTRY.to_string(),
                content: EPUB_MIMETYPE.to_vec(),
            }),
            accepted_extensions: None,
        }
    }

    /// 漫画包（cbz/zip）：只收录常见图片
    pub fn comic_book(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            first_entry: None,
            accepted_extensions: Some(
                COMMON_IMAGE_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
            ),
        }
    }

    // 扩展名不区分大小写
    pub fn accepts(&self, path: &Path) -> bool {
        match &self.accepted_extensions {
            None => true,
            Some(extensions) => path
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|ext| extensions.iter().any(|accepted| accepted.eq_ignore_ascii_case(&ext))),
        }
    }
}

// 相对路径转成 zip 条目名，统一使用 `/`
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// 把源目录打包成一个压缩文件，同步执行
///
/// 任何一个文件读写失败都会中止整个打包，不会留下“部分成功”的结果。
pub fn build(spec: &ArchiveSpec) -> Result<PathBuf, ArchiveError> {
    if !spec.source_dir.is_dir() {
        return Err(ArchiveError::SourceNotFound(spec.source_dir.clone()));
    }

    let file = File::create(&spec.output_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    if let Some(entry) = &spec.first_entry {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(entry.name.as_str(), stored)?;
        writer.write_all(&entry.content)?;
        debug!("写入首个条目: {}", entry.name);
    }

    // 输出文件放在源目录里时不能把自己也打包进去
    let output_path = std::fs::canonicalize(&spec.output_path)?;

    let mut count = 0usize;

    for entry in WalkDir::new(&spec.source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !spec.accepts(entry.path()) {
            continue;
        }
        if std::fs::canonicalize(entry.path())? == output_path {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&spec.source_dir)
            .map_err(|_| ArchiveError::InvalidPath(entry.path().to_path_buf()))?;
        let name = entry_name(relative);

        if spec
            .first_entry
            .as_ref()
            .is_some_and(|forced| forced.name == name)
        {
            warn!("跳过与首个条目同名的文件: {}", entry.path().display());
            continue;
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name.as_str(), options)?;
        let mut source = File::open(entry.path())?;
        std::io::copy(&mut source, &mut writer)?;
        count += 1;
        debug!("添加文件: {}", name);
    }

    let mut inner = writer.finish()?;
    inner.flush()?;

    info!(
        "打包完成: {} (共 {} 个文件)",
        spec.output_path.display(),
        count
    );
    Ok(spec.output_path.clone())
}
