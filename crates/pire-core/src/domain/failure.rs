//! Failure - タスク・ハンドラ・クリーンアップが返す失敗値
//!
//! 失敗は「種類（FailureKind）+ ペイロード」で表現します。
//! supervise が未処理の失敗を再送出するときは、この値をそのまま返します
//! （ラップや変換はしません）。

use serde_json::Value;

use super::kind::FailureKind;

/// Failure is the error value that flows through tasks, handlers and cleanups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    kind: &'static FailureKind,
    message: String,
    payload: Option<Value>,
}

impl Failure {
    pub fn new(kind: &'static FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            payload: None,
        }
    }

    /// Attach structured data describing the failure.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn kind(&self) -> &'static FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// 失敗の種類が `kind` と同じか、そこから派生しているか
    pub fn is_kind_of(&self, kind: &FailureKind) -> bool {
        self.kind.is_kind_of(kind)
    }
}
