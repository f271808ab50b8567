use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CodecError, CodecErrorKind};
use crate::wire::{workspace_from_value, Workspace};

/// A project actor (stage or sprite) object. Only `blocks` is interpreted;
/// every other member is carried through untouched, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub blocks: Workspace,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Target {
    /// `blocks` is decoded the same way as a bare workspace document; a
    /// target without one gets an empty workspace.
    pub fn from_value(v: Value) -> Result<Target, CodecError> {
        let mut rest = match v {
            Value::Object(map) => map,
            other => {
                return Err(CodecError::new(
                    CodecErrorKind::Json,
                    format!("decode target: expected an object, got {other}"),
                ))
            }
        };
        let blocks = match rest.shift_remove("blocks") {
            Some(blocks) => workspace_from_value(blocks)?,
            None => Workspace::new(),
        };
        Ok(Target { blocks, rest })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Target, CodecError> {
        let v: Value = serde_json::from_slice(bytes).map_err(|e| {
            CodecError::new(CodecErrorKind::Json, format!("parse target JSON: {e}"))
        })?;
        Target::from_value(v)
    }

    pub fn with_blocks(mut self, blocks: Workspace) -> Self {
        self.blocks = blocks;
        self
    }
}
