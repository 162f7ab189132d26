use crate::storage::{self, FileEntry};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// 单层目录列举器
///
/// 只返回根目录下的普通文件，不进入子目录，也不跟随符号链接。
#[derive(Debug, Clone, Default)]
pub struct DirectoryLister {
    /// 是否跳过以 `.` 开头的文件
    skip_hidden: bool,
}

impl DirectoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// 列出目录中的文件，按目录原生顺序返回
    ///
    /// 任意一个条目读取失败，或文件名不是有效的 UTF-8，都会让整次列举失败，
    /// 不返回部分结果。
    pub fn list(&self, root: &Path) -> io::Result<Vec<FileEntry>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry.map_err(|e| {
                let msg = e.to_string();
                e.into_io_error().unwrap_or_else(|| io::Error::other(msg))
            })?;

            if !entry.file_type().is_file() {
                debug!("跳过非普通文件: {:?}", entry.path());
                continue;
            }

            // 无法表示的文件名不能静默丢弃，整次列举失败
            let Some(name) = entry.file_name().to_str() else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("文件名不是有效的 UTF-8: {:?}", entry.path()),
                ));
            };

            // 写入中或上次中断留下的临时文件
            if storage::is_temp_name(name) {
                continue;
            }

            if self.skip_hidden && name.starts_with('.') {
                continue;
            }

            files.push(FileEntry {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
            });
        }

        debug!("列出 {} 个文件: {}", files.len(), root.display());
        Ok(files)
    }
}
