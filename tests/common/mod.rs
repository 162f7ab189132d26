#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use filetime::FileTime;
use foldersync_lib::storage::{FileEntry, FileMeta, LocalStorage, Storage};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;

/// 写入文件并设置修改时间（Unix 秒）
pub fn write_file(dir: &Path, name: &str, content: &str, mtime: i64) {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

/// 写入文件并设置精确到纳秒的修改时间
pub fn write_file_at(dir: &Path, name: &str, content: &str, secs: i64, nanos: u32) -> FileTime {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    let when = FileTime::from_unix_time(secs, nanos);
    filetime::set_file_mtime(&path, when).unwrap();
    when
}

pub fn filetime_of(dir: &Path, name: &str) -> FileTime {
    FileTime::from_last_modification_time(&std::fs::metadata(dir.join(name)).unwrap())
}

pub fn mtime_of(dir: &Path, name: &str) -> i64 {
    let meta = std::fs::metadata(dir.join(name)).unwrap();
    FileTime::from_last_modification_time(&meta).unix_seconds()
}

pub fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

/// 包装 LocalStorage，按文件名注入失败
#[derive(Default)]
pub struct FaultyStorage {
    inner: Option<LocalStorage>,
    pub fail_write: HashSet<String>,
    pub fail_delete: HashSet<String>,
    pub fail_stat: HashSet<String>,
    pub fail_list: bool,
    /// 列举前等待该信号，用于让运行停留在进行中
    pub gate: Option<Arc<Notify>>,
    /// 按文件名倒序返回列举结果，使顺序可预测
    pub sort_desc: bool,
    /// 每次写入成功后调用
    pub after_write: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl FaultyStorage {
    pub async fn open(dir: &Path) -> Self {
        Self {
            inner: Some(LocalStorage::open(dir).await.unwrap()),
            ..Default::default()
        }
    }

    pub fn failing_write(mut self, name: &str) -> Self {
        self.fail_write.insert(name.to_string());
        self
    }

    pub fn failing_delete(mut self, name: &str) -> Self {
        self.fail_delete.insert(name.to_string());
        self
    }

    pub fn failing_stat(mut self, name: &str) -> Self {
        self.fail_stat.insert(name.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn sorted_desc(mut self) -> Self {
        self.sort_desc = true;
        self
    }

    pub fn on_write(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.after_write = Some(Arc::new(hook));
        self
    }

    pub fn into_arc(self) -> Arc<dyn Storage> {
        Arc::new(self)
    }

    fn inner(&self) -> &LocalStorage {
        self.inner.as_ref().unwrap()
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_list {
            anyhow::bail!("permission denied (injected)");
        }
        let mut files = self.inner().list_files().await?;
        if self.sort_desc {
            files.sort_by(|a, b| b.name.cmp(&a.name));
        }
        Ok(files)
    }

    async fn stat(&self, name: &str) -> Result<FileMeta> {
        if self.fail_stat.contains(name) {
            anyhow::bail!("stat failed (injected): {}", name);
        }
        self.inner().stat(name).await
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.inner().read(name).await
    }

    async fn write(&self, name: &str, data: Vec<u8>, meta: &FileMeta) -> Result<()> {
        if self.fail_write.contains(name) {
            anyhow::bail!("write failed (injected): {}", name);
        }
        self.inner().write(name, data, meta).await?;
        if let Some(hook) = &self.after_write {
            hook(name);
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if self.fail_delete.contains(name) {
            anyhow::bail!("delete failed (injected): {}", name);
        }
        self.inner().delete(name).await
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
