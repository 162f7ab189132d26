pub mod comparator;
pub mod engine;
pub mod error;
pub mod recorder;
pub mod scanner;

pub use comparator::{CompareConfig, FileComparator, FileRelation};
pub use engine::{RunStatus, SyncConfig, SyncEngine, SyncHandle, SyncReport};
pub use error::SyncError;
pub use recorder::{ActionEvent, ActionLogSnapshot, ActionRecorder, Classification, Side};
pub use scanner::DirectoryLister;
