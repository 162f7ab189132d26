use std::path::PathBuf;
use std::sync::Arc;

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod logging;
pub mod storage;

pub use config::{StatFailurePolicy, SyncSettings};
pub use crate::core::{
    ActionEvent, ActionRecorder, Classification, RunStatus, SyncConfig, SyncEngine, SyncError,
    SyncHandle, SyncReport,
};

/// 应用状态，在前端命令之间共享
#[derive(Clone)]
pub struct AppState {
    pub sync_engine: Arc<SyncEngine>,
    pub config_dir: PathBuf,
}

impl AppState {
    /// 使用默认配置目录和其中保存的同步配置
    pub fn new() -> anyhow::Result<Self> {
        let config_dir = default_config_dir();
        std::fs::create_dir_all(&config_dir)?;

        let settings = SyncSettings::load(&config_dir);
        tracing::debug!("同步配置: {:?}", settings);

        Ok(Self::with_engine(
            config_dir,
            SyncEngine::with_config(settings.to_sync_config()),
        ))
    }

    pub fn with_engine(config_dir: PathBuf, engine: SyncEngine) -> Self {
        Self {
            sync_engine: Arc::new(engine),
            config_dir,
        }
    }

    /// 取消仍在进行的同步（应用退出时调用）
    pub fn cleanup(&self) {
        if self.sync_engine.cancel() {
            tracing::info!("已取消正在进行的同步");
        }
    }
}

/// 应用配置目录，例如 `~/.config/foldersync`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("foldersync"))
        .unwrap_or_else(|| PathBuf::from(".foldersync"))
}

pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        }
    }
}
