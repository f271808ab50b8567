use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CodecErrorKind {
    MissingReference,
    MalformedInput,
    MissingStructure,
    UnsupportedValue,
    CyclicReference,
    Entropy,
    Json,
}

impl CodecErrorKind {
    pub fn code_str(self) -> &'static str {
        match self {
            CodecErrorKind::MissingReference => "SB3-REF-0001",
            CodecErrorKind::MalformedInput => "SB3-INPUT-0001",
            CodecErrorKind::MissingStructure => "SB3-STRUCT-0001",
            CodecErrorKind::UnsupportedValue => "SB3-VALUE-0001",
            CodecErrorKind::CyclicReference => "SB3-REF-0002",
            CodecErrorKind::Entropy => "SB3-ID-0001",
            CodecErrorKind::Json => "SB3-JSON-0001",
        }
    }
}

/// A fatal structural error raised by serialization, deserialization, or
/// validation. Carries enough context (block id, slot key, missing id) to
/// locate the offending part of the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

impl CodecError {
    pub fn new(kind: CodecErrorKind, message: impl Into<String>) -> Self {
        CodecError {
            kind,
            message: message.into(),
            block_id: None,
            slot: None,
            missing: None,
        }
    }

    pub fn with_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    pub fn with_missing(mut self, missing: impl Into<String>) -> Self {
        self.missing = Some(missing.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code_str()
    }

    /// `block_id` (if known) references `missing` through `slot`, which is
    /// `next`, `parent`, or an input key.
    pub fn missing_reference(block_id: Option<&str>, slot: &str, missing: &str) -> Self {
        let message = match block_id {
            Some(id) => format!("block {id:?} references non-existent {slot} block: {missing:?}"),
            None => format!("block not found: {missing:?}"),
        };
        let mut err = CodecError::new(CodecErrorKind::MissingReference, message)
            .with_slot(slot)
            .with_missing(missing);
        err.block_id = block_id.map(str::to_string);
        err
    }

    pub fn malformed_input(block_id: &str, slot: &str, detail: impl fmt::Display) -> Self {
        CodecError::new(
            CodecErrorKind::MalformedInput,
            format!("unsupported input format in block {block_id:?} slot {slot:?}: {detail}"),
        )
        .with_block(block_id)
        .with_slot(slot)
    }

    pub fn missing_structure(message: impl Into<String>) -> Self {
        CodecError::new(CodecErrorKind::MissingStructure, message)
    }

    pub fn unsupported_value(message: impl Into<String>) -> Self {
        CodecError::new(CodecErrorKind::UnsupportedValue, message)
    }
}

impl std::error::Error for CodecError {}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code_str(), self.message)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::new(CodecErrorKind::Json, err.to_string())
    }
}
