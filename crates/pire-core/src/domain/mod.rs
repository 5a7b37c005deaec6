//! Domain model (failure kinds, failures, selectors, ids, call states).

pub mod failure;
pub mod ids;
pub mod kind;
pub mod selector;
pub mod state;

pub use self::failure::Failure;
pub use self::ids::{CallId, TaskId};
pub use self::kind::{FailureKind, KindRegistry, kinds};
pub use self::selector::{Selector, SelectorClass};
pub use self::state::{CallPath, CallState};
