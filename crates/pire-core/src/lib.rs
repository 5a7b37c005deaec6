//! pire-core
//!
//! タスクに「失敗ハンドラの表・除外・cleanup」を後付けし、
//! supervise でそれに従って実行するためのライブラリです。
//!
//! # モジュール構成
//! - **domain**: FailureKind, Failure, Selector, ID, 呼び出し状態
//! - **typed**: Task, TaskRecord, 登録操作, HandlerCatalog
//! - **app**: dispatch（一致判定）, supervisor, config
//!
//! ```ignore
//! use pire_core::prelude::*;
//!
//! let task = Task::new("load", |path: &String| load(path))
//!     .excepting(&kinds::IO_ERROR, |failure, path| { log(failure, path); Ok(()) })
//!     .skipping(&kinds::TIMEOUT_ERROR)
//!     .finally(|_| Ok(Default::default()));
//!
//! let value = supervise(&task, &"config.json".to_string())?;
//! ```

pub mod app;
pub mod domain;
pub mod typed;

pub mod prelude {
    pub use crate::app::{CallReport, SupervisionConfig, supervise, supervise_with_report, with_supervision};
    pub use crate::domain::{Failure, FailureKind, KindRegistry, Selector, kinds};
    pub use crate::typed::{HandlerCatalog, Task, exclude, record_of, register, set_cleanup};
}
