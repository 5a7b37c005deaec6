//! Handler / Cleanup - 失敗時・終了時に呼ばれる処理
//!
//! # 学習ポイント
//! - クロージャを `Arc<dyn Fn ...>` に型消去して表に格納する
//! - ハンドラ自身も `Failure` を返せる（別の失敗に変換して投げ直す用途）
//!
//! ハンドラの戻り値は supervise では捨てられます。
//! cleanup の戻り値は呼び出しの戻り値を上書きします（supervisor.rs 参照）。

use std::sync::Arc;

use crate::domain::Failure;

/// Handler は `(failure, args)` で呼ばれる失敗ハンドラ
///
/// `Arc` なので、同じハンドラを複数の selector・複数のタスクで共有できます。
pub type Handler<A> = Arc<dyn Fn(&Failure, &A) -> Result<(), Failure> + Send + Sync>;

/// Cleanup はタスクの成否にかかわらず `args` で 1 回呼ばれる処理
pub type Cleanup<A, R> = Arc<dyn Fn(&A) -> Result<R, Failure> + Send + Sync>;

/// クロージャから Handler を作る
pub fn handler<A, F>(f: F) -> Handler<A>
where
    F: Fn(&Failure, &A) -> Result<(), Failure> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// クロージャから Cleanup を作る
pub fn cleanup<A, R, F>(f: F) -> Cleanup<A, R>
where
    F: Fn(&A) -> Result<R, Failure> + Send + Sync + 'static,
{
    Arc::new(f)
}
