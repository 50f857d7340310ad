use thiserror::Error;

use crate::StyleKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    #[error("unknown style key `{0}`")]
    UnknownKey(String),
    #[error("style key `{key}` expects {expected:?}, got {got:?}")]
    TypeMismatch {
        key: &'static str,
        expected: StyleKind,
        got: StyleKind,
    },
    #[error("cannot decode `{text}` as {expected:?} for style key `{key}`")]
    Decode {
        key: &'static str,
        expected: StyleKind,
        text: String,
    },
}

/// Aggregate failure from applying a string-keyed style sheet; successful
/// entries stay applied.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("style sheet rejected {} entries", errors.len())]
pub struct SheetError {
    pub errors: Vec<(String, StyleError)>,
}
