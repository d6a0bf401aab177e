use crate::common::models::COMMON_IMAGE_EXTENSIONS;

// 文件名中不允许出现的字符
const INVALID_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 把标题清理成可以用作目录名和文件名的字符串，清理后为空时返回 None
pub fn sanitize_file_name(title: &str) -> Option<String> {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = cleaned.trim_matches('.').trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// 根据 Content-Type 推断图片扩展名，只认常见的 jpg 和 png
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let extension = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" | "image/x-png" => "png",
        _ => return None,
    };

    COMMON_IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| *ext == extension)
}
