//! Typed - タスクとメタデータ
//!
//! # 構成
//! - **Task**: 本体 + 任意の TaskRecord を所有する値
//! - **TaskRecord**: selector → handler の表、除外集合、cleanup
//! - **registry**: 登録操作（register / exclude / set_cleanup / record_of）と HandlerCatalog

pub mod handler;
pub mod record;
pub mod registry;
pub mod task;

pub use self::handler::{Cleanup, Handler};
pub use self::record::TaskRecord;
pub use self::registry::{HandlerCatalog, RegistryError, exclude, record_of, register, set_cleanup};
pub use self::task::{Body, Task};
