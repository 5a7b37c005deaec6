//! State - supervise 呼び出しの状態
//!
//! # 状態遷移
//! - running: タスク実行中
//! - succeeded: タスクが正常に戻った
//! - failed_handled: 失敗し、一致したハンドラが処理した
//! - failed_unhandled: 失敗し、ハンドラが無いか除外された（再送出予定）
//! - cleaned_up: クリーンアップ済み（終端）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Running,
    Succeeded,
    FailedHandled,
    FailedUnhandled,
    CleanedUp,
}

/// Which branch a finished call took before cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallPath {
    Succeeded,
    FailedHandled,
    FailedUnhandled,
}

impl From<CallPath> for CallState {
    fn from(path: CallPath) -> Self {
        match path {
            CallPath::Succeeded => CallState::Succeeded,
            CallPath::FailedHandled => CallState::FailedHandled,
            CallPath::FailedUnhandled => CallState::FailedUnhandled,
        }
    }
}

impl CallPath {
    /// cleanup の戻り値が呼び出しの戻り値を上書きする経路か
    pub fn cleanup_overrides_result(&self) -> bool {
        matches!(self, CallPath::Succeeded | CallPath::FailedHandled)
    }
}
