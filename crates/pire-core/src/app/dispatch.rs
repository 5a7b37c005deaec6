//! Dispatch - 発生した失敗に対応するハンドラを選ぶ
//!
//! # 選択規則
//! - 表を登録順に走査し、最初に一致した selector のハンドラを返す
//! - 「最も具体的な種類」ではなく「最も早く登録された selector」が勝つ
//! - 除外集合に一致した失敗は、ハンドラが見つかっても処理しない
//!
//! 一致判定は種類の継承関係を考慮します（除外判定も同じ）。

use std::collections::HashSet;

use crate::domain::{Failure, Selector};
use crate::typed::{Handler, TaskRecord};

pub fn matches(selector: &Selector, failure: &Failure) -> bool {
    selector.matches(failure)
}

/// 登録順で最初に一致したハンドラ
pub fn find_handler<'a, A>(
    handlers: &'a [(Selector, Handler<A>)],
    failure: &Failure,
) -> Option<(&'a Selector, &'a Handler<A>)> {
    handlers
        .iter()
        .find(|(selector, _)| matches(selector, failure))
        .map(|(selector, handler)| (selector, handler))
}

pub fn is_excluded(excluded: &HashSet<Selector>, failure: &Failure) -> bool {
    excluded.iter().any(|selector| matches(selector, failure))
}

/// 除外を考慮したうえで、実際に呼ぶべきハンドラ
pub fn active_handler<'a, A, R>(
    record: &'a TaskRecord<A, R>,
    failure: &Failure,
) -> Option<(&'a Selector, &'a Handler<A>)> {
    let found = find_handler(record.handlers(), failure)?;
    if is_excluded(record.excluded(), failure) {
        tracing::debug!(selector = %found.0, %failure, "match suppressed by exclusion");
        return None;
    }
    Some(found)
}
