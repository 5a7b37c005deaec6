//! SupervisionConfig - 宣言的なハンドラ・除外の設定
//!
//! # 形式（JSON）
//! ```json
//! {
//!   "strict_kinds": false,
//!   "handlers": [ { "kinds": ["ValueError", "KeyError"], "handler": "recover" } ],
//!   "skip": ["TimeoutError"],
//!   "cleanup": "release"
//! }
//! ```
//!
//! # Fail-fast
//! - handler / cleanup の名前が HandlerCatalog に無ければ `ConfigError::MissingHandler`
//! - `strict_kinds` のとき、KindRegistry で解決できない種類名は `ConfigError::UnknownKind`
//! - `strict_kinds` でなければ、解決できない名前は `Selector::Unknown`（何にも一致しない）
//!
//! handlers はファイルに書かれた順に登録されるので、その順が一致判定の順になります。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{KindRegistry, Selector};
use crate::typed::{HandlerCatalog, Task, exclude, register, set_cleanup};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionConfig {
    #[serde(default)]
    pub strict_kinds: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<HandlerBinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<String>,
}

/// 種類名の並びと、それを受け持つハンドラ名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerBinding {
    pub kinds: Vec<String>,
    pub handler: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown failure kind '{0}'")]
    UnknownKind(String),

    #[error("handler '{0}' is not in the catalog")]
    MissingHandler(String),

    #[error("invalid supervision config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read supervision config: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resolve `names` into one selector.
    ///
    /// A single name gives a single-kind selector, several names give a set.
    fn selector(&self, names: &[String], kinds: &KindRegistry) -> Result<Selector, ConfigError> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            match kinds.resolve(name) {
                Some(kind) => resolved.push(kind),
                None if self.strict_kinds => return Err(ConfigError::UnknownKind(name.clone())),
                None => {
                    tracing::warn!(kind = %name, "unknown failure kind; selector will never match");
                    return Ok(Selector::unknown(names.join(",")));
                }
            }
        }
        if resolved.len() == 1 {
            Ok(Selector::Kind(resolved[0]))
        } else {
            Ok(Selector::AnyOf(resolved))
        }
    }

    /// Apply this config to `task` and return it.
    ///
    /// Everything is resolved before the task is touched, so an error leaves
    /// no partial registration behind.
    pub fn apply<A, R>(
        &self,
        task: Task<A, R>,
        catalog: &HandlerCatalog<A, R>,
        kinds: &KindRegistry,
    ) -> Result<Task<A, R>, ConfigError> {
        let mut bindings = Vec::with_capacity(self.handlers.len());
        for binding in &self.handlers {
            let handler = catalog
                .handler(&binding.handler)
                .ok_or_else(|| ConfigError::MissingHandler(binding.handler.clone()))?;
            bindings.push((self.selector(&binding.kinds, kinds)?, handler));
        }

        let mut skipped = Vec::with_capacity(self.skip.len());
        for name in &self.skip {
            skipped.push(self.selector(std::slice::from_ref(name), kinds)?);
        }

        let cleanup = match &self.cleanup {
            Some(name) => Some(
                catalog
                    .cleanup(name)
                    .ok_or_else(|| ConfigError::MissingHandler(name.clone()))?,
            ),
            None => None,
        };

        let mut task = task;
        for (selector, handler) in bindings {
            task = register(task, selector, handler);
        }
        for selector in skipped {
            task = exclude(task, selector);
        }
        if let Some(cleanup) = cleanup {
            task = set_cleanup(task, cleanup);
        }
        tracing::debug!(task = %task.name(), "applied supervision config");
        Ok(task)
    }
}
