use crate::core::{ActionLogSnapshot, SyncHandle};
use crate::AppState;
use serde::Serialize;
use std::path::PathBuf;

/// 表格中的一行
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogRow {
    pub file_name: String,
    pub action: String,
}

/// 展示层需要的同步记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogView {
    pub running: bool,
    pub summary: String,
    pub rows: Vec<LogRow>,
}

impl From<(bool, ActionLogSnapshot)> for SyncLogView {
    fn from((running, snapshot): (bool, ActionLogSnapshot)) -> Self {
        let summary = snapshot.summary_line();
        let rows = snapshot
            .items
            .into_iter()
            .map(|(file_name, c)| LogRow {
                file_name,
                action: c.label().to_string(),
            })
            .collect();
        Self {
            running,
            summary,
            rows,
        }
    }
}

/// 开始同步两个目录
pub fn start_sync(
    folder_a: PathBuf,
    folder_b: PathBuf,
    state: &AppState,
) -> Result<SyncHandle, String> {
    tracing::info!("请求同步: {} <-> {}", folder_a.display(), folder_b.display());
    state
        .sync_engine
        .synchronize(&folder_a, &folder_b)
        .map_err(|e| e.to_string())
}

/// 取消同步任务
pub fn cancel_sync(state: &AppState) -> Result<(), String> {
    if state.sync_engine.cancel() {
        Ok(())
    } else {
        Err("没有正在运行的同步任务".to_string())
    }
}

/// 获取最近一次同步的记录，运行中也可以调用
pub fn get_sync_log(state: &AppState) -> Result<SyncLogView, String> {
    let recorder = state
        .sync_engine
        .latest_recorder()
        .ok_or_else(|| "尚未开始同步".to_string())?;
    Ok(SyncLogView::from((
        state.sync_engine.is_running(),
        recorder.snapshot(),
    )))
}
