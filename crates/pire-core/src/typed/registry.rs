//! Registry - タスクへの登録操作と、名前付きハンドラの表
//!
//! # 登録操作
//! - `register(task, selector, handler)`: selector → handler を追加（集合は要素ごとに展開）
//! - `exclude(task, selector)`: 除外集合に追加（同じく展開）
//! - `set_cleanup(task, cleanup)`: cleanup を設定（上書き）
//! - `record_of(task)`: record を返す（無ければ空で作る）
//!
//! どれもエラーになりません。`register` / `exclude` / `set_cleanup` は
//! 受け取ったタスクをそのまま返すので、連鎖して書けます。
//!
//! # HandlerCatalog
//! 設定ファイルからは名前でしかハンドラを指定できないので、
//! 名前 → Handler / Cleanup の表を用意します。

use std::collections::HashMap;

use super::handler::{Cleanup, Handler, cleanup, handler};
use super::record::TaskRecord;
use super::task::Task;
use crate::domain::{Failure, Selector};

pub fn register<A, R>(
    mut task: Task<A, R>,
    selector: impl Into<Selector>,
    handler: Handler<A>,
) -> Task<A, R> {
    let selector = selector.into();
    tracing::trace!(task = %task.name(), %selector, "register handler");
    task.record_mut().register(selector, handler);
    task
}

pub fn exclude<A, R>(mut task: Task<A, R>, selector: impl Into<Selector>) -> Task<A, R> {
    let selector = selector.into();
    tracing::trace!(task = %task.name(), %selector, "exclude selector");
    task.record_mut().exclude(selector);
    task
}

pub fn set_cleanup<A, R>(mut task: Task<A, R>, cleanup: Cleanup<A, R>) -> Task<A, R> {
    tracing::trace!(task = %task.name(), "set cleanup");
    task.record_mut().set_cleanup(cleanup);
    task
}

pub fn record_of<A, R>(task: &mut Task<A, R>) -> &mut TaskRecord<A, R> {
    task.record_mut()
}

/// RegistryError は HandlerCatalog の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// HandlerCatalog は名前付きの Handler / Cleanup を管理
///
/// # 使用例
/// ```ignore
/// let mut catalog = HandlerCatalog::new();
/// catalog.add_handler("log_and_recover", |failure, args| { ...; Ok(()) })?;
/// catalog.add_cleanup("release", |args| Ok(()))?;
/// ```
pub struct HandlerCatalog<A, R> {
    handlers: HashMap<String, Handler<A>>,
    cleanups: HashMap<String, Cleanup<A, R>>,
}

impl<A, R> HandlerCatalog<A, R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            cleanups: HashMap::new(),
        }
    }

    pub fn add_handler<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&Failure, &A) -> Result<(), Failure> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.handlers.insert(name, handler(f));
        Ok(())
    }

    pub fn add_cleanup<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&A) -> Result<R, Failure> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.cleanups.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.cleanups.insert(name, cleanup(f));
        Ok(())
    }

    pub fn handler(&self, name: &str) -> Option<Handler<A>> {
        self.handlers.get(name).cloned()
    }

    pub fn cleanup(&self, name: &str) -> Option<Cleanup<A, R>> {
        self.cleanups.get(name).cloned()
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl<A, R> Default for HandlerCatalog<A, R> {
    fn default() -> Self {
        Self::new()
    }
}
