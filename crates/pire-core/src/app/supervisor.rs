//! Supervisor - タスクを実行し、失敗時にハンドラを選んで呼ぶ
//!
//! # 状態遷移
//! ```text
//! RUNNING ─┬─> SUCCEEDED ─────────┐
//!          ├─> FAILED_HANDLED ────┼─> CLEANED_UP ─> (FAILED_UNHANDLED なら再送出)
//!          └─> FAILED_UNHANDLED ──┘
//! ```
//!
//! # 戻り値
//! - SUCCEEDED: タスクの戻り値（`Some`）
//! - FAILED_HANDLED: `None`
//! - cleanup があれば、上の 2 つの経路では cleanup の戻り値が常に優先される
//! - FAILED_UNHANDLED: 元の失敗をそのまま `Err` で返す（cleanup の後）
//!
//! # ハンドラ・cleanup 自身の失敗
//! 捕捉しません。ハンドラが失敗しても cleanup は実行され、その後ハンドラの失敗を返します。
//! cleanup が失敗した場合は、その失敗が戻り値・再送出の両方より優先されます。
//!
//! panic は失敗ではないので横取りしません（cleanup も実行されません）。

use serde::{Deserialize, Serialize};

use super::dispatch;
use crate::domain::{CallId, CallPath, CallState, Failure, TaskId};
use crate::typed::Task;

/// CallReport は 1 回の supervise 呼び出しの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub call_id: CallId,
    pub task_id: TaskId,
    pub task: String,
    pub path: CallPath,
    /// 呼ばれたハンドラの selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<String>,
    pub handler_failed: bool,
    pub cleanup_ran: bool,
}

impl CallReport {
    fn start<A, R>(call_id: CallId, task: &Task<A, R>) -> Self {
        Self {
            call_id,
            task_id: task.id(),
            task: task.name().to_string(),
            path: CallPath::Succeeded,
            handled_by: None,
            handler_failed: false,
            cleanup_ran: false,
        }
    }
}

/// タスク本体とハンドラを実行した後、cleanup 前の状態
enum Settled<R> {
    Returned(R),
    Handled,
    HandlerFailed(Failure),
    Unhandled(Failure),
}

/// Run `task` under its attached record.
///
/// An undecorated task behaves like `task.call(args)`, with the success value
/// wrapped in `Some`.
pub fn supervise<A, R>(task: &Task<A, R>, args: &A) -> Result<Option<R>, Failure> {
    supervise_with_report(task, args).1
}

pub fn supervise_with_report<A, R>(
    task: &Task<A, R>,
    args: &A,
) -> (CallReport, Result<Option<R>, Failure>) {
    let call_id = CallId::generate();
    let span = tracing::debug_span!("supervise", task = %task.name(), call = %call_id);
    let _enter = span.enter();

    let mut report = CallReport::start(call_id, task);
    let settled = settle(task, args, &mut report);
    let result = clean_up(task, args, settled, &mut report);
    (report, result)
}

fn settle<A, R>(task: &Task<A, R>, args: &A, report: &mut CallReport) -> Settled<R> {
    tracing::debug!(state = ?CallState::Running, "invoking task");

    let failure = match task.call(args) {
        Ok(value) => {
            report.path = CallPath::Succeeded;
            tracing::debug!(state = ?CallState::Succeeded, "task returned");
            return Settled::Returned(value);
        }
        Err(failure) => failure,
    };

    let active = task
        .record()
        .and_then(|record| dispatch::active_handler(record, &failure));

    let Some((selector, handler)) = active else {
        report.path = CallPath::FailedUnhandled;
        tracing::debug!(state = ?CallState::FailedUnhandled, %failure, "no active handler");
        return Settled::Unhandled(failure);
    };

    report.path = CallPath::FailedHandled;
    report.handled_by = Some(selector.to_string());
    tracing::debug!(state = ?CallState::FailedHandled, %selector, %failure, "invoking handler");

    match handler(&failure, args) {
        Ok(()) => Settled::Handled,
        Err(handler_failure) => {
            report.handler_failed = true;
            tracing::error!(%selector, failure = %handler_failure, "handler failed");
            Settled::HandlerFailed(handler_failure)
        }
    }
}

fn clean_up<A, R>(
    task: &Task<A, R>,
    args: &A,
    settled: Settled<R>,
    report: &mut CallReport,
) -> Result<Option<R>, Failure> {
    let cleaned = task.record().and_then(|record| record.cleanup()).map(|cleanup| {
        report.cleanup_ran = true;
        cleanup(args)
    });
    tracing::debug!(state = ?CallState::CleanedUp, cleanup_ran = report.cleanup_ran, "cleaned up");

    match (settled, cleaned) {
        (_, Some(Err(cleanup_failure))) => {
            tracing::error!(failure = %cleanup_failure, "cleanup failed");
            Err(cleanup_failure)
        }
        (Settled::Unhandled(failure), _) => {
            tracing::warn!(%failure, "re-signaling unhandled failure");
            Err(failure)
        }
        (Settled::HandlerFailed(failure), _) => Err(failure),
        (Settled::Returned(_) | Settled::Handled, Some(Ok(value))) => Ok(Some(value)),
        (Settled::Returned(value), None) => Ok(Some(value)),
        (Settled::Handled, None) => Ok(None),
    }
}

/// Wrap `task` so that calling the result performs `supervise(&task, args)`.
///
/// The wrapper keeps the inner task's name but gets its own id and starts with
/// no record; registrations on it never reach the inner task.
pub fn with_supervision<A, R>(task: Task<A, R>) -> Task<A, Option<R>>
where
    A: 'static,
    R: 'static,
{
    let name = task.name().to_string();
    Task::new(name, move |args: &A| supervise(&task, args))
}

impl<A, R> Task<A, R> {
    pub fn supervise(&self, args: &A) -> Result<Option<R>, Failure> {
        supervise(self, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kinds::*;
    use crate::domain::{FailureKind, Selector};
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    /// 呼ばれた順番を記録する
    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn failing(kind: &'static FailureKind) -> Task<i32, i32> {
        Task::new("failing", move |_: &i32| Err(Failure::new(kind, "boom")))
    }

    fn doubling() -> Task<i32, i32> {
        Task::new("doubling", |x: &i32| Ok(x * 2))
    }

    fn recording(
        journal: &Journal,
        name: &'static str,
    ) -> impl Fn(&Failure, &i32) -> Result<(), Failure> + Send + Sync + 'static {
        let journal = journal.clone();
        move |failure: &Failure, args: &i32| {
            journal.push(format!("{name}({}, {args})", failure.kind()));
            Ok(())
        }
    }

    #[test]
    fn undecorated_task_behaves_like_direct_call() {
        let ok = doubling();
        assert_eq!(ok.call(&4), Ok(8));
        assert_eq!(supervise(&ok, &4), Ok(Some(8)));

        let err = failing(&IO_ERROR);
        assert_eq!(supervise(&err, &1), Err(err.call(&1).unwrap_err()));
        assert!(err.record().is_none());
    }

    #[test]
    fn io_error_without_handlers_is_re_signaled_unchanged() {
        let original =
            Failure::new(&IO_ERROR, "disk full").with_payload(serde_json::json!({"dev": "sda"}));
        let raised = original.clone();
        let task = Task::new("write", move |_: &()| -> Result<(), Failure> { Err(raised.clone()) });

        let (report, result) = supervise_with_report(&task, &());
        assert_eq!(result, Err(original));
        assert_eq!(report.path, CallPath::FailedUnhandled);
        assert!(!report.cleanup_ran);
    }

    #[test]
    fn matching_handler_is_called_once_with_failure_and_args() {
        let journal = Journal::default();
        let task = failing(&VALUE_ERROR).excepting(&VALUE_ERROR, recording(&journal, "h"));

        let (report, result) = supervise_with_report(&task, &7);
        assert_eq!(result, Ok(None));
        assert_eq!(journal.entries(), vec!["h(ValueError, 7)"]);
        assert_eq!(report.path, CallPath::FailedHandled);
        assert_eq!(report.handled_by.as_deref(), Some("ValueError"));
    }

    #[test]
    fn first_registered_selector_wins() {
        let journal = Journal::default();
        let task = failing(&VALUE_ERROR)
            .excepting(&VALUE_ERROR, recording(&journal, "h1"))
            .excepting(&EXCEPTION, recording(&journal, "h2"));

        assert_eq!(supervise(&task, &0), Ok(None));
        assert_eq!(journal.entries(), vec!["h1(ValueError, 0)"]);
    }

    #[test]
    fn base_kind_registered_first_wins_over_specific() {
        let journal = Journal::default();
        let task = failing(&VALUE_ERROR)
            .excepting(&EXCEPTION, recording(&journal, "base"))
            .excepting(&VALUE_ERROR, recording(&journal, "value"));

        supervise(&task, &0).unwrap();
        assert_eq!(journal.entries(), vec!["base(ValueError, 0)"]);
    }

    #[test]
    fn re_registration_keeps_position_and_last_handler_wins() {
        let journal = Journal::default();
        let task = failing(&KEY_ERROR)
            .excepting(&LOOKUP_ERROR, recording(&journal, "first"))
            .excepting(&EXCEPTION, recording(&journal, "base"))
            .excepting(&LOOKUP_ERROR, recording(&journal, "second"));

        supervise(&task, &3).unwrap();
        assert_eq!(journal.entries(), vec!["second(KeyError, 3)"]);
    }

    #[rstest]
    #[case::exact(&VALUE_ERROR)]
    #[case::general(&EXCEPTION)]
    fn exclusion_re_signals_and_skips_handler(#[case] excluded: &'static FailureKind) {
        let journal = Journal::default();
        let task = failing(&VALUE_ERROR)
            .excepting(&VALUE_ERROR, recording(&journal, "h"))
            .skipping(excluded);

        let result = supervise(&task, &1);
        assert_eq!(result, Err(Failure::new(&VALUE_ERROR, "boom")));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn exclusion_order_does_not_matter() {
        let journal = Journal::default();
        let task = failing(&KEY_ERROR)
            .skipping(&KEY_ERROR)
            .excepting(&LOOKUP_ERROR, recording(&journal, "h"));

        assert!(supervise(&task, &1).is_err());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn unknown_selector_never_matches() {
        let journal = Journal::default();
        let task =
            failing(&KEY_ERROR).excepting(Selector::unknown("KeyError"), recording(&journal, "h"));

        assert!(supervise(&task, &1).is_err());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn set_selector_registers_each_member() {
        let journal = Journal::default();
        let task = failing(&TIMEOUT_ERROR)
            .excepting([&VALUE_ERROR, &IO_ERROR], recording(&journal, "h"));

        assert_eq!(supervise(&task, &2), Ok(None));
        assert_eq!(journal.entries(), vec!["h(TimeoutError, 2)"]);
    }

    #[derive(Debug, Clone, Copy)]
    enum Outcome {
        Succeeds,
        Handled,
        Unhandled,
    }

    #[rstest]
    #[case::succeeded(Outcome::Succeeds)]
    #[case::handled(Outcome::Handled)]
    #[case::unhandled(Outcome::Unhandled)]
    fn cleanup_runs_exactly_once_on_every_path(#[case] outcome: Outcome) {
        let journal = Journal::default();
        let task_journal = journal.clone();
        let cleanup_journal = journal.clone();

        let task = Task::new("t", move |x: &i32| {
            task_journal.push("task");
            match outcome {
                Outcome::Succeeds => Ok(*x),
                Outcome::Handled => Err(Failure::new(&VALUE_ERROR, "v")),
                Outcome::Unhandled => Err(Failure::new(&IO_ERROR, "io")),
            }
        })
        .excepting(&VALUE_ERROR, recording(&journal, "h"))
        .finally(move |_| {
            cleanup_journal.push("cleanup");
            Ok(-1)
        });

        let (report, result) = supervise_with_report(&task, &5);
        let entries = journal.entries();
        assert_eq!(entries.iter().filter(|e| *e == "cleanup").count(), 1);
        assert_eq!(entries.last().map(String::as_str), Some("cleanup"));
        assert!(report.cleanup_ran);

        match outcome {
            Outcome::Succeeds | Outcome::Handled => assert_eq!(result, Ok(Some(-1))),
            Outcome::Unhandled => assert_eq!(result, Err(Failure::new(&IO_ERROR, "io"))),
        }
    }

    #[test]
    fn cleanup_value_overrides_task_value() {
        let task = doubling().finally(|x| Ok(x + 100));
        assert_eq!(supervise(&task, &1), Ok(Some(101)));
    }

    #[test]
    fn cleanup_receives_original_args() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let task = failing(&IO_ERROR).finally(move |x| {
            *sink.lock().unwrap() = Some(*x);
            Ok(0)
        });

        assert!(supervise(&task, &42).is_err());
        assert_eq!(*seen.lock().unwrap(), Some(42));
    }

    #[test]
    fn handler_failure_propagates_after_cleanup() {
        let journal = Journal::default();
        let cleanup_journal = journal.clone();
        let task = failing(&VALUE_ERROR)
            .excepting(&VALUE_ERROR, |failure, _| {
                Err(Failure::new(&RUNTIME_ERROR, format!("wrapped: {}", failure.message())))
            })
            .finally(move |_| {
                cleanup_journal.push("cleanup");
                Ok(0)
            });

        let (report, result) = supervise_with_report(&task, &1);
        assert_eq!(result, Err(Failure::new(&RUNTIME_ERROR, "wrapped: boom")));
        assert_eq!(journal.entries(), vec!["cleanup"]);
        assert!(report.handler_failed);
        assert_eq!(report.path, CallPath::FailedHandled);
    }

    #[test]
    fn cleanup_failure_replaces_re_signal() {
        let task = failing(&IO_ERROR).finally(|_| Err(Failure::new(&RUNTIME_ERROR, "release failed")));
        assert_eq!(
            supervise(&task, &1),
            Err(Failure::new(&RUNTIME_ERROR, "release failed"))
        );
    }

    #[test]
    fn cleanup_failure_after_handler_still_propagates() {
        let task = failing(&VALUE_ERROR)
            .excepting(&VALUE_ERROR, |_, _| Ok(()))
            .finally(|_| Err(Failure::new(&RUNTIME_ERROR, "release failed")));
        assert!(supervise(&task, &1).is_err());
    }

    #[test]
    fn with_supervision_has_no_record_of_its_own() {
        let journal = Journal::default();
        let inner = failing(&VALUE_ERROR).excepting(&VALUE_ERROR, recording(&journal, "h"));
        assert!(inner.record().is_some());
        let inner_id = inner.id();

        let wrapped = with_supervision(inner);
        assert!(wrapped.record().is_none());
        assert_ne!(wrapped.id(), inner_id);
        assert_eq!(wrapped.name(), "failing");

        assert_eq!(wrapped.call(&9), Ok(None));
        assert_eq!(journal.entries(), vec!["h(ValueError, 9)"]);
    }

    #[test]
    fn with_supervision_re_signals_unhandled() {
        let wrapped = with_supervision(failing(&KEY_ERROR));
        assert_eq!(wrapped.call(&0), Err(Failure::new(&KEY_ERROR, "boom")));
    }

    #[test]
    fn supervised_task_can_be_shared_across_threads() {
        let journal = Journal::default();
        let task = Arc::new(failing(&VALUE_ERROR).excepting(&VALUE_ERROR, recording(&journal, "h")));

        let joins: Vec<_> = (0..4)
            .map(|i| {
                let task = Arc::clone(&task);
                std::thread::spawn(move || task.supervise(&i))
            })
            .collect();
        for join in joins {
            assert_eq!(join.join().unwrap(), Ok(None));
        }
        assert_eq!(journal.entries().len(), 4);
    }

    #[test]
    fn report_serializes_path() {
        let (report, _) = supervise_with_report(&doubling(), &1);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["path"], "SUCCEEDED");
        assert_eq!(v["task"], "doubling");
        assert!(v.get("handled_by").is_none());
    }
}
