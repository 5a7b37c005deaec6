//! Task - supervise 対象の処理単位
//!
//! # 学習ポイント
//! - 関数本体（`Arc<dyn Fn>`）とメタデータ（`Option<TaskRecord>`）を 1 つの値で所有する
//! - Builder 風の `excepting` / `skipping` / `finally` はどれも同じ record を変更するので、
//!   呼ぶ順番に依存しない
//!
//! # 使用例
//! ```ignore
//! let task = Task::new("parse", |input: &String| input.parse::<i32>().map_err(to_failure))
//!     .excepting(&kinds::VALUE_ERROR, |failure, input| { ...; Ok(()) })
//!     .skipping(&kinds::TIMEOUT_ERROR)
//!     .finally(|_| Ok(0));
//! ```

use std::fmt;
use std::sync::Arc;

use super::handler::{cleanup as into_cleanup, handler as into_handler};
use super::record::TaskRecord;
use super::registry;
use crate::domain::{Failure, Selector, TaskId};

/// タスク本体
pub type Body<A, R> = Arc<dyn Fn(&A) -> Result<R, Failure> + Send + Sync>;

pub struct Task<A, R> {
    id: TaskId,
    name: String,
    body: Body<A, R>,
    /// 最初の登録操作で作られる。None は「何も付いていない」
    record: Option<TaskRecord<A, R>>,
}

impl<A, R> Task<A, R> {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&A) -> Result<R, Failure> + Send + Sync + 'static,
    {
        Self::from_body(name, Arc::new(body))
    }

    pub fn from_body(name: impl Into<String>, body: Body<A, R>) -> Self {
        Self {
            id: TaskId::generate(),
            name: name.into(),
            body,
            record: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Supervise せずに本体を直接呼ぶ
    pub fn call(&self, args: &A) -> Result<R, Failure> {
        (self.body)(args)
    }

    pub fn record(&self) -> Option<&TaskRecord<A, R>> {
        self.record.as_ref()
    }

    /// record を返す。無ければ空の record を作る
    pub fn record_mut(&mut self) -> &mut TaskRecord<A, R> {
        self.record.get_or_insert_with(TaskRecord::new)
    }

    /// `selector` に一致する失敗を `handler` で処理する
    pub fn excepting<H>(self, selector: impl Into<Selector>, handler: H) -> Self
    where
        H: Fn(&Failure, &A) -> Result<(), Failure> + Send + Sync + 'static,
    {
        registry::register(self, selector, into_handler(handler))
    }

    /// `selector` に一致する失敗はハンドラがあっても処理しない
    pub fn skipping(self, selector: impl Into<Selector>) -> Self {
        registry::exclude(self, selector)
    }

    /// 成否にかかわらず最後に 1 回呼ばれる処理を設定する（上書き）
    pub fn finally<C>(self, cleanup: C) -> Self
    where
        C: Fn(&A) -> Result<R, Failure> + Send + Sync + 'static,
    {
        registry::set_cleanup(self, into_cleanup(cleanup))
    }
}

impl<A, R> fmt::Debug for Task<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("record", &self.record)
            .finish()
    }
}
