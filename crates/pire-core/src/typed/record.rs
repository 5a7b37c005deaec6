//! TaskRecord - タスクに付随する supervise 用のメタデータ
//!
//! # 内容
//! - handlers: selector → handler（登録順を保持）
//! - excluded: 処理しない selector の集合
//! - cleanup: 任意の後処理（1 つだけ）
//!
//! # 登録順
//! 表は `Vec` で持ち、挿入順をそのまま一致判定の順序として使います。
//! 同じ selector を再登録するとハンドラだけが置き換わり、位置は変わりません。

use std::collections::HashSet;
use std::fmt;

use super::handler::{Cleanup, Handler};
use crate::domain::Selector;

pub struct TaskRecord<A, R> {
    handlers: Vec<(Selector, Handler<A>)>,
    excluded: HashSet<Selector>,
    cleanup: Option<Cleanup<A, R>>,
}

impl<A, R> TaskRecord<A, R> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            excluded: HashSet::new(),
            cleanup: None,
        }
    }

    /// Register `handler` for every member of `selector`, in order.
    pub fn register(&mut self, selector: Selector, handler: Handler<A>) -> &mut Self {
        for member in selector.members() {
            self.insert_handler(member, handler.clone());
        }
        self
    }

    /// Exclude every member of `selector`.
    pub fn exclude(&mut self, selector: Selector) -> &mut Self {
        self.excluded.extend(selector.members());
        self
    }

    pub fn set_cleanup(&mut self, cleanup: Cleanup<A, R>) -> &mut Self {
        self.cleanup = Some(cleanup);
        self
    }

    fn insert_handler(&mut self, selector: Selector, handler: Handler<A>) {
        match self.handlers.iter_mut().find(|(s, _)| *s == selector) {
            Some(entry) => entry.1 = handler,
            None => self.handlers.push((selector, handler)),
        }
    }

    /// 登録順の (selector, handler) の並び
    pub fn handlers(&self) -> &[(Selector, Handler<A>)] {
        &self.handlers
    }

    pub fn handler_for(&self, selector: &Selector) -> Option<&Handler<A>> {
        self.handlers
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, handler)| handler)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.handlers.iter().map(|(selector, _)| selector)
    }

    pub fn excluded(&self) -> &HashSet<Selector> {
        &self.excluded
    }

    pub fn cleanup(&self) -> Option<&Cleanup<A, R>> {
        self.cleanup.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.excluded.is_empty() && self.cleanup.is_none()
    }
}

impl<A, R> Default for TaskRecord<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for TaskRecord<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("handlers", &self.selectors().collect::<Vec<_>>())
            .field("excluded", &self.excluded)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}
