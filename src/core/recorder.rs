//! 同步动作记录
//!
//! 每次同步运行都有一个全新的记录器，按处理顺序保存每个文件名的最终分类，
//! 并维护各分类的计数。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// 文件处理结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// 两侧修改时间相同
    Same,
    /// 读取元数据、复制或删除失败，需要人工处理
    Error,
    /// 较旧的一侧被较新的一侧覆盖
    Updated,
    /// 只存在于一侧，已复制到另一侧
    New,
}

impl Classification {
    /// 固定的展示顺序
    pub const ALL: [Classification; 4] = [
        Classification::Same,
        Classification::Error,
        Classification::Updated,
        Classification::New,
    ];

    fn index(self) -> usize {
        match self {
            Classification::Same => 0,
            Classification::Error => 1,
            Classification::Updated => 2,
            Classification::New => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Same => "Same",
            Classification::Error => "Error",
            Classification::Updated => "Updated",
            Classification::New => "New",
        }
    }

    pub fn is_error(self) -> bool {
        self == Classification::Error
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 被写入的一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
    /// 未写入任何一侧（相同或元数据读取失败）
    Both,
}

/// 推送给观察者的单条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub name: String,
    pub classification: Classification,
    pub side: Side,
}

/// 记录内容的快照，可直接序列化给展示层
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogSnapshot {
    pub summary: Vec<(Classification, usize)>,
    pub items: Vec<(String, Classification)>,
}

impl ActionLogSnapshot {
    pub fn summary_line(&self) -> String {
        format_summary(&self.summary)
    }
}

fn format_summary(summary: &[(Classification, usize)]) -> String {
    summary
        .iter()
        .map(|(c, n)| format!("{}: {}", c, n))
        .collect::<Vec<_>>()
        .join(" / ")
}

#[derive(Debug, Default)]
struct ActionLog {
    items: IndexMap<String, Classification>,
    counts: [usize; 4],
}

/// 线程安全的动作记录器
///
/// 克隆得到的是同一个记录的句柄。
#[derive(Debug, Clone, Default)]
pub struct ActionRecorder {
    log: Arc<Mutex<ActionLog>>,
    observer: Option<mpsc::UnboundedSender<ActionEvent>>,
}

impl ActionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每条记录完成后把事件发送给观察者
    pub fn with_observer(observer: mpsc::UnboundedSender<ActionEvent>) -> Self {
        Self {
            log: Arc::default(),
            observer: Some(observer),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActionLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 记录一个文件的分类
    ///
    /// 同名文件再次记录时覆盖原分类并保留原位置，计数随之转移。
    pub fn record(&self, classification: Classification, name: &str) {
        self.record_on(classification, name, Side::Both);
    }

    pub(crate) fn record_on(&self, classification: Classification, name: &str, side: Side) {
        {
            let mut log = self.lock();
            if let Some(previous) = log.items.insert(name.to_string(), classification) {
                log.counts[previous.index()] -= 1;
            }
            log.counts[classification.index()] += 1;
        }

        if let Some(observer) = &self.observer {
            // 观察者已关闭时忽略
            let _ = observer.send(ActionEvent {
                name: name.to_string(),
                classification,
                side,
            });
        }
    }

    /// 各分类计数，按 Same, Error, Updated, New 顺序，包含为零的分类
    pub fn summary(&self) -> Vec<(Classification, usize)> {
        let log = self.lock();
        Classification::ALL
            .iter()
            .map(|c| (*c, log.counts[c.index()]))
            .collect()
    }

    /// 形如 `Same: 0 / Error: 0 / Updated: 1 / New: 2` 的摘要
    pub fn summary_line(&self) -> String {
        format_summary(&self.summary())
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.lock().counts[classification.index()]
    }

    /// 按插入顺序返回所有条目
    pub fn items(&self) -> Vec<(String, Classification)> {
        self.lock()
            .items
            .iter()
            .map(|(name, c)| (name.clone(), *c))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Classification> {
        self.lock().items.get(name).copied()
    }

    /// 按行号取条目，供表格展示
    pub fn row(&self, index: usize) -> Option<(String, Classification)> {
        self.lock()
            .items
            .get_index(index)
            .map(|(name, c)| (name.clone(), *c))
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        self.count(Classification::Error) > 0
    }

    /// 在同一临界区内取出摘要和条目，两者保持一致
    pub fn snapshot(&self) -> ActionLogSnapshot {
        let log = self.lock();
        ActionLogSnapshot {
            summary: Classification::ALL
                .iter()
                .map(|c| (*c, log.counts[c.index()]))
                .collect(),
            items: log.items.iter().map(|(n, c)| (n.clone(), *c)).collect(),
        }
    }
}
