use crate::config::StatFailurePolicy;
use crate::core::comparator::{CompareConfig, FileComparator, FileRelation};
use crate::core::error::SyncError;
use crate::core::recorder::{ActionEvent, ActionLogSnapshot, ActionRecorder, Classification, Side};
use crate::core::scanner::DirectoryLister;
use crate::storage::{self, LocalStorage, Storage};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 同步配置
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// 成对文件元数据读取失败时的处理方式
    pub stat_failure: StatFailurePolicy,
    /// 修改时间比较配置
    pub compare: CompareConfig,
    /// 列举时忽略隐藏文件
    pub skip_hidden: bool,
}

/// 运行结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// 同步报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub root_a: String,
    pub root_b: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub log: ActionLogSnapshot,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        self.log
            .items
            .iter()
            .any(|(_, classification)| classification.is_error())
    }
}

type Roots = (Arc<dyn Storage>, Arc<dyn Storage>);

/// 最近一次运行的控制信息
#[derive(Clone)]
struct RunControl {
    run_id: Uuid,
    recorder: ActionRecorder,
    cancelled: Arc<AtomicBool>,
}

/// 一次正在进行（或已结束）的同步运行
pub struct SyncHandle {
    run_id: Uuid,
    recorder: ActionRecorder,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<Result<SyncReport, SyncError>>,
}

impl SyncHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// 本次运行的记录器，运行期间可随时读取
    pub fn recorder(&self) -> &ActionRecorder {
        &self.recorder
    }

    /// 请求取消，在处理下一个文件之前生效
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 等待运行结束
    pub async fn wait(self) -> Result<SyncReport, SyncError> {
        self.task.await?
    }
}

/// 同步引擎
///
/// 同一时间只允许一次运行；运行期间再次调用 `synchronize` 会返回
/// `SyncError::RunInProgress`。必须在 tokio 运行时中调用。
pub struct SyncEngine {
    config: SyncConfig,
    observer: Option<mpsc::UnboundedSender<ActionEvent>>,
    running: Arc<AtomicBool>,
    latest: Mutex<Option<RunControl>>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            config,
            observer: None,
            running: Arc::new(AtomicBool::new(false)),
            latest: Mutex::new(None),
        }
    }

    /// 每条记录都会转发给该观察者
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<ActionEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 是否有运行尚未结束
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 取消正在进行的运行，没有运行时返回 false
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.latest_control() {
            Some(control) => {
                info!("请求取消同步: {}", control.run_id);
                control.cancelled.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// 最近一次运行的记录器
    pub fn latest_recorder(&self) -> Option<ActionRecorder> {
        self.latest_control().map(|c| c.recorder)
    }

    fn latest_control(&self) -> Option<RunControl> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 同步两个本地目录
    pub fn synchronize(
        &self,
        folder_a: impl AsRef<Path>,
        folder_b: impl AsRef<Path>,
    ) -> Result<SyncHandle, SyncError> {
        let folder_a = folder_a.as_ref().to_path_buf();
        let folder_b = folder_b.as_ref().to_path_buf();
        let lister = DirectoryLister::new().skip_hidden(self.config.skip_hidden);

        self.start(async move {
            let a = open_root(&folder_a, lister.clone()).await?;
            let b = open_root(&folder_b, lister).await?;
            Ok((a, b))
        })
    }

    /// 同步任意两个存储
    pub fn synchronize_storages(
        &self,
        a: Arc<dyn Storage>,
        b: Arc<dyn Storage>,
    ) -> Result<SyncHandle, SyncError> {
        self.start(async move { Ok((a, b)) })
    }

    fn start<F>(&self, roots: F) -> Result<SyncHandle, SyncError>
    where
        F: Future<Output = Result<Roots, SyncError>> + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("已有同步任务在运行，拒绝新的请求");
            return Err(SyncError::RunInProgress);
        }

        let run_id = Uuid::new_v4();
        let recorder = match &self.observer {
            Some(observer) => ActionRecorder::with_observer(observer.clone()),
            None => ActionRecorder::new(),
        };
        let cancelled = Arc::new(AtomicBool::new(false));

        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(RunControl {
            run_id,
            recorder: recorder.clone(),
            cancelled: cancelled.clone(),
        });

        let worker = RunWorker {
            run_id,
            recorder: recorder.clone(),
            cancelled: cancelled.clone(),
            comparator: FileComparator::with_config(self.config.compare.clone()),
            stat_failure: self.config.stat_failure,
        };
        let running = self.running.clone();

        // 所有文件操作都在这一个任务里顺序执行
        let task = tokio::spawn(async move {
            scopeguard::defer! {
                running.store(false, Ordering::SeqCst);
            }
            let (a, b) = roots.await?;
            worker.run(a.as_ref(), b.as_ref()).await
        });

        Ok(SyncHandle {
            run_id,
            recorder,
            cancelled,
            task,
        })
    }
}

async fn open_root(path: &Path, lister: DirectoryLister) -> Result<Arc<dyn Storage>, SyncError> {
    let storage = LocalStorage::open(path)
        .await
        .map_err(|e| SyncError::invalid_root(path, e))?
        .with_lister(lister);
    Ok(Arc::new(storage))
}

/// 单次运行的执行者
struct RunWorker {
    run_id: Uuid,
    recorder: ActionRecorder,
    cancelled: Arc<AtomicBool>,
    comparator: FileComparator,
    stat_failure: StatFailurePolicy,
}

impl RunWorker {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn run(&self, a: &dyn Storage, b: &dyn Storage) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        info!("开始同步 [{}]: {} <-> {}", self.run_id, a.name(), b.name());

        // 两侧都列举成功之后才会动任何文件
        let listing_a = a
            .list_files()
            .await
            .map_err(|e| SyncError::listing(a.name(), e))?;
        let listing_b = b
            .list_files()
            .await
            .map_err(|e| SyncError::listing(b.name(), e))?;

        debug!(
            "列举完成: A {} 个文件, B {} 个文件",
            listing_a.len(),
            listing_b.len()
        );

        let mut remaining_b: IndexSet<String> =
            listing_b.into_iter().map(|entry| entry.name).collect();
        let mut status = RunStatus::Completed;

        for entry in &listing_a {
            if self.is_cancelled() {
                status = RunStatus::Cancelled;
                break;
            }

            if remaining_b.shift_remove(entry.name.as_str()) {
                self.resolve_pair(a, b, &entry.name).await;
            } else {
                self.copy_new(a, b, &entry.name, Side::B).await;
            }
        }

        // 剩下的只存在于 B
        if status == RunStatus::Completed {
            for name in &remaining_b {
                if self.is_cancelled() {
                    status = RunStatus::Cancelled;
                    break;
                }
                self.copy_new(b, a, name, Side::A).await;
            }
        }

        let log = self.recorder.snapshot();
        info!(
            "同步结束 [{}] ({:?}): {}",
            self.run_id,
            status,
            self.recorder.summary_line()
        );

        Ok(SyncReport {
            run_id: self.run_id,
            root_a: a.name().to_string(),
            root_b: b.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            status,
            log,
        })
    }

    /// 两侧都存在的文件：较新的覆盖较旧的
    async fn resolve_pair(&self, a: &dyn Storage, b: &dyn Storage, name: &str) {
        let (meta_a, meta_b) = match (a.stat(name).await, b.stat(name).await) {
            (Ok(meta_a), Ok(meta_b)) => (meta_a, meta_b),
            (result_a, result_b) => {
                let reason = result_a
                    .err()
                    .or(result_b.err())
                    .map(|e| format!("{:#}", e))
                    .unwrap_or_default();
                match self.stat_failure {
                    StatFailurePolicy::RecordError => {
                        warn!("读取元数据失败: {} - {}", name, reason);
                        self.recorder
                            .record_on(Classification::Error, name, Side::Both);
                    }
                    StatFailurePolicy::Skip => {
                        warn!("读取元数据失败，跳过: {} - {}", name, reason);
                    }
                }
                return;
            }
        };

        match self.comparator.compare_files(&meta_a, &meta_b) {
            FileRelation::Equal => {
                debug!("相同: {}", name);
                self.recorder.record_on(Classification::Same, name, Side::Both);
            }
            FileRelation::ANewer => self.replace(a, b, name, Side::B).await,
            FileRelation::BNewer => self.replace(b, a, name, Side::A).await,
        }
    }

    /// 删除较旧的文件后从较新的一侧复制
    ///
    /// 删除失败时记录 Error 但仍尝试复制，复制结果覆盖之前的分类。
    async fn replace(&self, newer: &dyn Storage, older: &dyn Storage, name: &str, side: Side) {
        if let Err(e) = older.delete(name).await {
            warn!("删除失败: {}/{} - {:#}", older.name(), name, e);
            self.recorder.record_on(Classification::Error, name, side);
        }

        match storage::copy_between(newer, older, name).await {
            Ok(()) => {
                debug!("已更新: {}/{}", older.name(), name);
                self.recorder.record_on(Classification::Updated, name, side);
            }
            Err(e) => {
                warn!("复制失败: {}/{} - {:#}", older.name(), name, e);
                self.recorder.record_on(Classification::Error, name, side);
            }
        }
    }

    /// 只存在于一侧的文件：复制到另一侧
    async fn copy_new(&self, from: &dyn Storage, to: &dyn Storage, name: &str, side: Side) {
        match storage::copy_between(from, to, name).await {
            Ok(()) => {
                debug!("新建: {}/{}", to.name(), name);
                self.recorder.record_on(Classification::New, name, side);
            }
            Err(e) => {
                warn!("复制失败: {}/{} - {:#}", to.name(), name, e);
                self.recorder.record_on(Classification::Error, name, side);
            }
        }
    }
}
