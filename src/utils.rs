//! Key and path processing utility functions / 对象键与路径处理工具函数

/// Clean a user supplied path into key segments / 清理路径为键片段
/// 1. Replace backslashes with forward slashes / 将反斜杠替换为正斜杠
/// 2. Drop empty and `.` segments / 去掉空片段和 `.`
/// 3. `..` pops the previous segment and never escapes the bucket root / `..` 不会越过根
fn clean_segments(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(|c| c == '/' || c == '\\') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    parts
}

/// Normalize a folder path into a listing prefix / 规范化目录前缀
///
/// The result always ends in `/`, except for the bucket root which is `""`.
pub fn folder_prefix(path: &str) -> String {
    let parts = clean_segments(path);
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}/", parts.join("/"))
    }
}

/// Normalize an object key (no leading or trailing separator) / 规范化对象键
pub fn object_key(path: &str) -> String {
    clean_segments(path).join("/")
}

/// Build the key of `file_name` inside `folder` / 拼接目录与文件名
pub fn join_key(folder: &str, file_name: &str) -> String {
    let name = object_key(file_name);
    format!("{}{}", folder_prefix(folder), name)
}

/// Last path segment of a key, folders keep no trailing `/` / 获取键的最后一段
pub fn base_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// File extension after the final `.` of the base name (lowercase) / 获取文件扩展名
///
/// Returns `None` when the base name has no `.` at all.
pub fn get_ext(key: &str) -> Option<String> {
    base_name(key)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_prefix() {
        assert_eq!(folder_prefix(""), "");
        assert_eq!(folder_prefix("/"), "");
        assert_eq!(folder_prefix("."), "");
        assert_eq!(folder_prefix("../.."), "");
        assert_eq!(folder_prefix("docs"), "docs/");
        assert_eq!(folder_prefix("docs/"), "docs/");
        assert_eq!(folder_prefix("/docs//old/"), "docs/old/");
        assert_eq!(folder_prefix("docs\\old"), "docs/old/");
        assert_eq!(folder_prefix("/a/./b/../c"), "a/c/");
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "x.pdf"), "x.pdf");
        assert_eq!(join_key("docs", "x.pdf"), "docs/x.pdf");
        assert_eq!(join_key("docs/", "x.pdf"), "docs/x.pdf");
        assert_eq!(join_key("/docs/old", "/x.pdf"), "docs/old/x.pdf");
    }

    #[test]
    fn test_base_name_and_ext() {
        assert_eq!(base_name("docs/old/x.pdf"), "x.pdf");
        assert_eq!(base_name("docs/old/"), "old");
        assert_eq!(base_name("x"), "x");
        assert_eq!(get_ext("docs/x.PDF").as_deref(), Some("pdf"));
        assert_eq!(get_ext("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(get_ext("v1.2/README"), None);
        assert_eq!(get_ext("docs/"), None);
    }
}
