//! 应用配置模块

use crate::core::{CompareConfig, SyncConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// 成对文件读取元数据失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StatFailurePolicy {
    /// 记录为 Error，便于人工处理
    #[default]
    #[serde(rename = "error")]
    #[value(name = "error")]
    RecordError,
    /// 跳过且不记录，仅写日志
    Skip,
}

/// 同步配置，保存在 config.json 的 "sync" 节
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default)]
    pub stat_failure: StatFailurePolicy,
    /// 修改时间容差（毫秒），0 表示精确比较
    #[serde(default)]
    pub time_tolerance_ms: u64,
    /// 是否忽略以 `.` 开头的文件
    #[serde(default)]
    pub skip_hidden: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            stat_failure: StatFailurePolicy::default(),
            time_tolerance_ms: 0,
            skip_hidden: false,
        }
    }
}

impl SyncSettings {
    /// 从配置文件加载同步配置
    pub fn load(config_dir: &Path) -> Self {
        read_section(config_dir, "sync").unwrap_or_default()
    }

    /// 保存同步配置
    pub fn save(&self, config_dir: &Path) -> io::Result<()> {
        write_section(config_dir, "sync", self)
    }

    /// 转换为引擎配置
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            stat_failure: self.stat_failure,
            compare: CompareConfig {
                time_tolerance: Duration::from_millis(self.time_tolerance_ms),
            },
            skip_hidden: self.skip_hidden,
        }
    }
}

/// 读取 config.json 中的某一节，文件缺失或内容无效时返回 None
pub(crate) fn read_section<T: serde::de::DeserializeOwned>(
    config_dir: &Path,
    section: &str,
) -> Option<T> {
    let content = fs::read_to_string(config_dir.join("config.json")).ok()?;
    let config: serde_json::Value = serde_json::from_str(&content).ok()?;
    serde_json::from_value(config.get(section)?.clone()).ok()
}

/// 更新 config.json 中的某一节，保留其它节
pub(crate) fn write_section<T: Serialize>(
    config_dir: &Path,
    section: &str,
    value: &T,
) -> io::Result<()> {
    let config_file = config_dir.join("config.json");

    // 读取现有配置
    let mut config: serde_json::Value = if config_file.exists() {
        let content = fs::read_to_string(&config_file)?;
        serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({}))
    } else {
        serde_json::json!({})
    };
    if !config.is_object() {
        config = serde_json::json!({});
    }

    config[section] = serde_json::to_value(value).map_err(io::Error::other)?;

    let content = serde_json::to_string_pretty(&config).map_err(io::Error::other)?;
    fs::create_dir_all(config_dir)?;
    fs::write(&config_file, content)
}
