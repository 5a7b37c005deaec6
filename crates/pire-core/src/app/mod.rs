//! App - 実行時の処理
//!
//! # 主要コンポーネント
//! - **dispatch**: 失敗に一致するハンドラの選択（登録順・除外）
//! - **supervisor**: supervise の状態遷移（実行 → ハンドラ → cleanup → 再送出）
//! - **config**: JSON による宣言的な登録

pub mod config;
pub mod dispatch;
pub mod supervisor;

pub use self::config::{ConfigError, HandlerBinding, SupervisionConfig};
pub use self::dispatch::{find_handler, matches};
pub use self::supervisor::{CallReport, supervise, supervise_with_report, with_supervision};
