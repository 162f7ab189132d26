use thiserror::Error;

/// 整次同步运行级别的错误
///
/// 单个文件的失败不会出现在这里，而是记录为 `Classification::Error`。
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("无效的同步目录 {path}: {reason}")]
    InvalidRoot { path: String, reason: String },

    #[error("列出目录失败 {root}: {reason}")]
    Listing { root: String, reason: String },

    #[error("已有同步任务正在运行")]
    RunInProgress,

    #[error("同步任务异常退出: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl SyncError {
    pub(crate) fn invalid_root(path: &std::path::Path, err: anyhow::Error) -> Self {
        SyncError::InvalidRoot {
            path: path.display().to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub(crate) fn listing(root: &str, err: anyhow::Error) -> Self {
        SyncError::Listing {
            root: root.to_string(),
            reason: format!("{:#}", err),
        }
    }
}
