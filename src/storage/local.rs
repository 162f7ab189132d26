use super::{FileEntry, FileMeta, Storage};
use crate::core::scanner::DirectoryLister;
use anyhow::{Context, Result};
use async_trait::async_trait;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 本地文件系统上的一个同步根目录
pub struct LocalStorage {
    base_path: PathBuf,
    name: String,
    lister: DirectoryLister,
}

impl LocalStorage {
    /// 打开一个已存在的目录；不会自动创建
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&base_path)
            .await
            .with_context(|| format!("无法访问目录 {}", base_path.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("不是目录: {}", base_path.display());
        }
        // 只读检查：能打开目录才算可用
        let _entries = fs::read_dir(&base_path)
            .await
            .with_context(|| format!("无法读取目录 {}", base_path.display()))?;

        let name = format!("local:{}", base_path.display());
        Ok(Self {
            base_path,
            name,
            lister: DirectoryLister::new(),
        })
    }

    pub fn with_lister(mut self, lister: DirectoryLister) -> Self {
        self.lister = lister;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join(super::temp_name())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let base = self.base_path.clone();
        let lister = self.lister.clone();

        // 使用 spawn_blocking 避免阻塞 async runtime
        let entries = tokio::task::spawn_blocking(move || lister.list(&base)).await??;

        Ok(entries)
    }

    async fn stat(&self, name: &str) -> Result<FileMeta> {
        let metadata = fs::metadata(self.resolve_path(name)).await?;
        Ok(FileMeta {
            size: metadata.len(),
            modified: metadata.modified()?,
            permissions: metadata.permissions(),
        })
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve_path(name)).await?;
        Ok(data)
    }

    async fn write(&self, name: &str, data: Vec<u8>, meta: &FileMeta) -> Result<()> {
        let full_path = self.resolve_path(name);

        // 使用临时文件写入，然后原子重命名
        let temp_path = self.temp_path();
        fs::write(&temp_path, data).await?;

        let mtime = FileTime::from_system_time(meta.modified);
        let permissions = meta.permissions.clone();
        let attr_path = temp_path.clone();
        let applied = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            filetime::set_file_mtime(&attr_path, mtime)?;
            std::fs::set_permissions(&attr_path, permissions)
        })
        .await?;

        if let Err(e) = applied {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        fs::remove_file(self.resolve_path(name)).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
