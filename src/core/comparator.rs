use crate::storage::FileMeta;
use std::time::Duration;

/// 文件比较结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRelation {
    /// 修改时间相同
    Equal,
    /// A 侧文件更新
    ANewer,
    /// B 侧文件更新
    BNewer,
}

/// 比较配置
#[derive(Debug, Clone, Default)]
pub struct CompareConfig {
    /// 时间容差，差值不超过该值视为相同；默认为零，即精确比较
    pub time_tolerance: Duration,
}

/// 文件比较器，仅比较修改时间
#[derive(Debug, Clone, Default)]
pub struct FileComparator {
    config: CompareConfig,
}

impl FileComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    /// 比较同名文件在两侧的元数据
    pub fn compare_files(&self, a: &FileMeta, b: &FileMeta) -> FileRelation {
        let (diff, a_newer) = match a.modified.duration_since(b.modified) {
            Ok(d) => (d, true),
            Err(e) => (e.duration(), false),
        };

        if diff <= self.config.time_tolerance {
            return FileRelation::Equal;
        }

        tracing::debug!(
            "文件时间不同: a={:?}, b={:?}, diff={:?}",
            a.modified,
            b.modified,
            diff
        );

        if a_newer {
            FileRelation::ANewer
        } else {
            FileRelation::BNewer
        }
    }
}
