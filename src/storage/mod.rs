pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use std::fs::Permissions;
use std::path::PathBuf;
use std::time::SystemTime;

pub use local::LocalStorage;

/// 写入时使用的临时文件前缀和后缀，列举时会被忽略
pub const TEMP_PREFIX: &str = ".foldersync-";
pub const TEMP_SUFFIX: &str = ".tmp";

/// 临时文件名，长度固定，与目标文件名无关
pub fn temp_name() -> String {
    format!("{}{}{}", TEMP_PREFIX, uuid::Uuid::new_v4().simple(), TEMP_SUFFIX)
}

/// 是否为写入过程中（或中断后残留）的临时文件
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// 目录中的一个文件条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// 文件名（不含路径分隔符）
    pub name: String,
    /// 该文件在根目录下的绝对路径
    pub path: PathBuf,
}

/// 文件元数据
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub size: u64,
    pub modified: SystemTime,
    pub permissions: Permissions,
}

/// 同步根目录的存储抽象
///
/// 所有路径参数都是根目录下的直接文件名。
#[async_trait]
pub trait Storage: Send + Sync {
    /// 列出根目录下的直接文件（不递归）
    async fn list_files(&self) -> Result<Vec<FileEntry>>;

    /// 获取文件元数据
    async fn stat(&self, name: &str) -> Result<FileMeta>;

    /// 读取整个文件
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// 写入整个文件，并恢复给定的修改时间和权限
    async fn write(&self, name: &str, data: Vec<u8>, meta: &FileMeta) -> Result<()>;

    /// 删除文件
    async fn delete(&self, name: &str) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 在两个存储之间复制文件，保留修改时间和权限
pub async fn copy_between(from: &dyn Storage, to: &dyn Storage, name: &str) -> Result<()> {
    let meta = from.stat(name).await?;
    let data = from.read(name).await?;
    tracing::debug!(
        "复制: {}/{} -> {}/{} ({}字节)",
        from.name(),
        name,
        to.name(),
        name,
        data.len()
    );
    to.write(name, data, &meta).await
}
