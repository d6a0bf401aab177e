pub mod archive;
pub mod error;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::common::models::{DownloadConfig, DownloadType, ParsedMeta};
use crate::downloader::models::{BatchResult, TaskStatus};
use archive::{ArchiveSpec, EPUB_EXTENSION};
use error::ArchiveError;

/// 输出文件和下载目录同级: `<目录名>.<扩展名>`
///
/// 目录必须有最后一级名字（例如 `.`、`..` 结尾的路径要先规范化）。
pub fn archive_path_for(output_dir: &Path, extension: &str) -> Result<PathBuf, ArchiveError> {
    let (Some(name), Some(parent)) = (output_dir.file_name(), output_dir.parent()) else {
        return Err(ArchiveError::InvalidPath(output_dir.to_path_buf()));
    };
    let file_name = format!(
        "{}.{}",
        name.to_string_lossy(),
        extension.trim_start_matches('.')
    );
    Ok(parent.join(file_name))
}

/// `source_dir` 应该是规范化后的绝对路径
pub fn archive_spec_for(
    download_type: DownloadType,
    source_dir: &Path,
    config: &DownloadConfig,
) -> Result<ArchiveSpec, ArchiveError> {
    Ok(match download_type {
        DownloadType::Epub => {
            ArchiveSpec::epub(source_dir, archive_path_for(source_dir, EPUB_EXTENSION)?)
        }
        DownloadType::ImageSequence => ArchiveSpec::comic_book(
            source_dir,
            archive_path_for(source_dir, &config.archive_extension)?,
        ),
    })
}

/// 只删除本次写入的文件，再自底向上删除空目录
///
/// 目录里的其他文件保持原样，目录被清空时返回 true。
pub fn cleanup_output_dir(output_dir: &Path, written: &[PathBuf]) -> Result<bool, ArchiveError> {
    for path in written {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    for entry in WalkDir::new(output_dir).contents_first(true) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            // 非空目录删除失败是正常情况
            let _ = std::fs::remove_dir(entry.path());
        }
    }

    Ok(!output_dir.exists())
}

// 下载完成后的处理：打包，然后按需清理下载目录
pub async fn post_process(
    meta: &ParsedMeta,
    result: &BatchResult,
    config: &DownloadConfig,
) -> Result<PathBuf, ArchiveError> {
    // `.`、`..` 这类路径没有目录名，规范化后才能确定输出文件的位置
    let source_dir = tokio::fs::canonicalize(&meta.output_dir)
        .await
        .map_err(|_| ArchiveError::SourceNotFound(meta.output_dir.clone()))?;
    let spec = archive_spec_for(meta.download_type, &source_dir, config)?;
    debug!("开始打包: {:?}", spec);

    if spec.output_path.starts_with(&source_dir) {
        return Err(ArchiveError::InvalidPath(spec.output_path));
    }

    if !result.all_succeeded() {
        warn!("有 {} 个文件下载失败，打包结果可能不完整", result.failed);
    }

    let archive_path = tokio::task::spawn_blocking(move || archive::build(&spec))
        .await
        .map_err(|e| ArchiveError::Join(e.to_string()))??;

    // 有失败时保留目录，方便检查和重试
    if config.keep_output_dir || !result.all_succeeded() {
        info!("保留下载目录: {}", meta.output_dir.display());
        return Ok(archive_path);
    }

    let written: Vec<PathBuf> = result
        .tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .map(|task| task.output_path.clone())
        .chain(meta.metadata_files.iter().cloned())
        .collect();

    let cleanup_dir = source_dir.clone();
    let removed = tokio::task::spawn_blocking(move || cleanup_output_dir(&cleanup_dir, &written))
        .await
        .map_err(|e| ArchiveError::Join(e.to_string()))??;

    if removed {
        debug!("已删除下载目录: {}", source_dir.display());
    } else {
        info!("下载目录中还有其他文件，已保留: {}", source_dir.display());
    }

    Ok(archive_path)
}
