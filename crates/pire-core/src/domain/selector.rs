//! Selector - どの失敗をハンドラが受け持つかの記述
//!
//! # 分類
//! - **Kind**: 単一の FailureKind
//! - **Kinds**: FailureKind の集合（どれか 1 つに一致すればよい）
//! - **Unknown**: 種類として解釈できない記述子。登録はできるが、何にも一致しない
//!
//! 分類も一致判定も失敗しません。解釈できない selector は「一致しない」に
//! 落ちるだけで、エラーにはなりません。

use std::fmt;

use super::failure::Failure;
use super::kind::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Kind(&'static FailureKind),
    AnyOf(Vec<&'static FailureKind>),
    Unknown(String),
}

/// Result of classifying a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorClass {
    Kind,
    Kinds,
    Unknown,
}

impl Selector {
    pub fn unknown(descriptor: impl Into<String>) -> Self {
        Self::Unknown(descriptor.into())
    }

    pub fn classify(&self) -> SelectorClass {
        match self {
            Selector::Kind(_) => SelectorClass::Kind,
            Selector::AnyOf(_) => SelectorClass::Kinds,
            Selector::Unknown(_) => SelectorClass::Unknown,
        }
    }

    /// `failure` がこの selector の表す種類に属するか
    pub fn matches(&self, failure: &Failure) -> bool {
        match self {
            Selector::Kind(kind) => failure.is_kind_of(kind),
            Selector::AnyOf(kinds) => kinds.iter().any(|kind| failure.is_kind_of(kind)),
            Selector::Unknown(_) => false,
        }
    }

    /// Expand a set selector into one selector per member, in order.
    ///
    /// Single and unknown selectors expand to themselves.
    pub fn members(&self) -> Vec<Selector> {
        match self {
            Selector::AnyOf(kinds) => kinds.iter().copied().map(Selector::Kind).collect(),
            other => vec![other.clone()],
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Kind(kind) => write!(f, "{kind}"),
            Selector::AnyOf(kinds) => {
                let names: Vec<_> = kinds.iter().map(|kind| kind.name()).collect();
                write!(f, "({})", names.join(", "))
            }
            Selector::Unknown(descriptor) => write!(f, "<unknown {descriptor}>"),
        }
    }
}

impl From<&'static FailureKind> for Selector {
    fn from(kind: &'static FailureKind) -> Self {
        Selector::Kind(kind)
    }
}

impl From<Vec<&'static FailureKind>> for Selector {
    fn from(kinds: Vec<&'static FailureKind>) -> Self {
        Selector::AnyOf(kinds)
    }
}

impl<const N: usize> From<[&'static FailureKind; N]> for Selector {
    fn from(kinds: [&'static FailureKind; N]) -> Self {
        Selector::AnyOf(kinds.to_vec())
    }
}
