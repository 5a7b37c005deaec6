//! FailureKind - 失敗の種類と継承関係
//!
//! # 学習ポイント
//! - `const fn` で static な種類階層を定義する
//! - 親へのポインタを辿る "is-kind-of" 判定（クラス階層の代わり）
//!
//! ```ignore
//! pub static PAYMENT_ERROR: FailureKind = FailureKind::derive("PaymentError", &kinds::VALUE_ERROR);
//! ```

use std::collections::HashMap;
use std::fmt;

/// FailureKind は失敗の種類を表す記述子
///
/// 親を 1 つだけ持つ木構造です。`is_kind_of` は自分自身から根に向かって
/// 親を辿り、一致する種類があれば true を返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailureKind {
    name: &'static str,
    parent: Option<&'static FailureKind>,
}

impl FailureKind {
    /// 親を持たない種類
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// `parent` から派生した種類
    pub const fn derive(name: &'static str, parent: &'static FailureKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static FailureKind> {
        self.parent
    }

    /// `self` が `other` と同じか、`other` から派生しているか
    pub fn is_kind_of(&self, other: &FailureKind) -> bool {
        if self == other {
            return true;
        }
        let mut current = self.parent;
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// 自分から根までの種類（自分を含む）
    pub fn lineage(&'static self) -> impl Iterator<Item = &'static FailureKind> {
        std::iter::successors(Some(self), |kind| kind.parent)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Built-in failure kinds.
///
/// The tree mirrors the usual failure taxonomy so that selectors for a general
/// kind (e.g. `LOOKUP_ERROR`) cover the specific ones (`KEY_ERROR`).
pub mod kinds {
    use super::FailureKind;

    pub static EXCEPTION: FailureKind = FailureKind::root("Exception");

    pub static VALUE_ERROR: FailureKind = FailureKind::derive("ValueError", &EXCEPTION);
    pub static TYPE_ERROR: FailureKind = FailureKind::derive("TypeError", &EXCEPTION);
    pub static RUNTIME_ERROR: FailureKind = FailureKind::derive("RuntimeError", &EXCEPTION);

    pub static LOOKUP_ERROR: FailureKind = FailureKind::derive("LookupError", &EXCEPTION);
    pub static KEY_ERROR: FailureKind = FailureKind::derive("KeyError", &LOOKUP_ERROR);
    pub static INDEX_ERROR: FailureKind = FailureKind::derive("IndexError", &LOOKUP_ERROR);

    pub static IO_ERROR: FailureKind = FailureKind::derive("IOError", &EXCEPTION);
    pub static TIMEOUT_ERROR: FailureKind = FailureKind::derive("TimeoutError", &IO_ERROR);

    pub static ARITHMETIC_ERROR: FailureKind = FailureKind::derive("ArithmeticError", &EXCEPTION);
    pub static ZERO_DIVISION_ERROR: FailureKind =
        FailureKind::derive("ZeroDivisionError", &ARITHMETIC_ERROR);

    pub(crate) static BUILTIN: [&FailureKind; 11] = [
        &EXCEPTION,
        &VALUE_ERROR,
        &TYPE_ERROR,
        &RUNTIME_ERROR,
        &LOOKUP_ERROR,
        &KEY_ERROR,
        &INDEX_ERROR,
        &IO_ERROR,
        &TIMEOUT_ERROR,
        &ARITHMETIC_ERROR,
        &ZERO_DIVISION_ERROR,
    ];
}

/// KindRegistry は名前から FailureKind を引くための表
///
/// 設定ファイルのように名前でしか種類を書けない場所で使います。
/// `new()` は組み込みの種類を登録済みの状態で作成します。
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: HashMap<&'static str, &'static FailureKind>,
}

impl KindRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for kind in kinds::BUILTIN {
            registry.add(kind);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// 種類を追加する。同名の種類があれば置き換える
    pub fn add(&mut self, kind: &'static FailureKind) -> &mut Self {
        self.kinds.insert(kind.name(), kind);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&'static FailureKind> {
        self.kinds.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}
