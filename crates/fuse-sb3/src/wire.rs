//! The flat, id-keyed workspace document.
//!
//! Shapes here are the exchange format of the consuming runtime: field names
//! and tuple layouts must stay exactly as written.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use fuse_sb3_contracts::{
    INPUT_BLOCK_NO_SHADOW, INPUT_DIFF_BLOCK_SHADOW, INPUT_SAME_BLOCK_SHADOW, PRIMITIVE_TEXT,
    PRIMITIVE_VARIABLE,
};

use crate::error::{CodecError, CodecErrorKind};

/// Node id -> node. Insertion order is the document order, which decides
/// which top-level root counts as "first".
pub type Workspace = IndexMap<String, WireBlock>;

/// Free-form metadata blob: each key holds a string or a list of nested blobs.
pub type Mutation = IndexMap<String, MutationValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationValue {
    Text(String),
    Flag(bool),
    Children(Vec<Mutation>),
}

impl MutationValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MutationValue::Text(s) => Some(s.as_str()),
            MutationValue::Flag(_) | MutationValue::Children(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBlock {
    pub opcode: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub inputs: IndexMap<String, WireInput>,
    #[serde(default)]
    pub fields: IndexMap<String, WireField>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub top_level: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_coord"
    )]
    pub x: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_coord"
    )]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
}

impl WireBlock {
    pub fn new(opcode: impl Into<String>) -> Self {
        WireBlock {
            opcode: opcode.into(),
            next: None,
            parent: None,
            inputs: IndexMap::new(),
            fields: IndexMap::new(),
            shadow: false,
            top_level: false,
            x: None,
            y: None,
            mutation: None,
        }
    }

    /// Roots are the heads of top-level chains: `topLevel` with no parent.
    pub fn is_root(&self) -> bool {
        self.top_level && self.parent.is_none()
    }
}

// Whole-number canvas positions are written as integers, the way the runtime
// writes them.
fn serialize_coord<S>(coord: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match coord {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            serializer.serialize_i64(*v as i64)
        }
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

/// `[value, id]`: a literal field value and an optional secondary id used by
/// variable and list references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireField(pub String, pub Option<String>);

impl WireField {
    pub fn literal(value: impl Into<String>) -> Self {
        WireField(value.into(), None)
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn from_value(v: &Value) -> Result<WireField, String> {
        let items = v
            .as_array()
            .ok_or_else(|| format!("field must be an array, got {v}"))?;
        let value = match items.first() {
            Some(first) => scalar_to_string(first)
                .ok_or_else(|| format!("field value must be a scalar, got {first}"))?,
            None => return Err("field must not be empty".to_string()),
        };
        let id = match items.get(1) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => return Err(format!("field id must be a string or null, got {other}")),
        };
        Ok(WireField(value, id))
    }
}

impl<'de> Deserialize<'de> for WireField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        WireField::from_value(&v).map_err(de::Error::custom)
    }
}

/// One input slot of a node.
///
/// * `[1, payload]`: value without a visible shadow wrapper.
/// * `[2, payload]`: boolean expression or nested statement chain.
/// * `[3, payload, shadow]`: value covering a visible shadow (`shadow` may be
///   `null` for an obscured shadow, or absent).
#[derive(Debug, Clone, PartialEq)]
pub enum WireInput {
    Inline(InputPayload),
    Linked(InputPayload),
    Shadowed(InputPayload, Option<InputPayload>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputPayload {
    Block(String),
    Primitive(Primitive),
    Empty,
}

/// `[kind, value, ...rest]` such as `[10, "hello"]` or `[12, name, id]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: u64,
    pub value: Value,
    pub rest: Vec<Value>,
}

impl Primitive {
    pub fn text(value: impl Into<String>) -> Self {
        Primitive {
            kind: PRIMITIVE_TEXT,
            value: Value::String(value.into()),
            rest: Vec::new(),
        }
    }

    pub fn is_variable(&self) -> bool {
        self.kind == PRIMITIVE_VARIABLE
    }

    /// The literal rendered as the string the IR carries.
    pub fn value_text(&self) -> Option<String> {
        scalar_to_string(&self.value)
    }

    fn from_items(items: &[Value]) -> Result<Primitive, String> {
        let kind = items
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| "primitive must start with a numeric subtag".to_string())?;
        let value = items
            .get(1)
            .cloned()
            .ok_or_else(|| format!("primitive [{kind}, ...] is missing its value"))?;
        Ok(Primitive {
            kind,
            value,
            rest: items[2..].to_vec(),
        })
    }
}

impl InputPayload {
    pub fn block_id(&self) -> Option<&str> {
        match self {
            InputPayload::Block(id) => Some(id.as_str()),
            InputPayload::Primitive(_) | InputPayload::Empty => None,
        }
    }

    fn from_value(v: &Value) -> Result<InputPayload, String> {
        match v {
            Value::String(id) => Ok(InputPayload::Block(id.clone())),
            Value::Array(items) => Ok(InputPayload::Primitive(Primitive::from_items(items)?)),
            Value::Null => Ok(InputPayload::Empty),
            other => Err(format!(
                "input payload must be a block id, a primitive array, or null, got {other}"
            )),
        }
    }
}

impl WireInput {
    pub fn tag(&self) -> u64 {
        match self {
            WireInput::Inline(_) => INPUT_SAME_BLOCK_SHADOW,
            WireInput::Linked(_) => INPUT_BLOCK_NO_SHADOW,
            WireInput::Shadowed(_, _) => INPUT_DIFF_BLOCK_SHADOW,
        }
    }

    pub fn payload(&self) -> &InputPayload {
        match self {
            WireInput::Inline(p) | WireInput::Linked(p) | WireInput::Shadowed(p, _) => p,
        }
    }

    /// The block id in the second tuple position, if that position is a
    /// string.
    pub fn block_ref(&self) -> Option<&str> {
        self.payload().block_id()
    }

    pub fn from_value(v: &Value) -> Result<WireInput, String> {
        let items = v
            .as_array()
            .ok_or_else(|| format!("input must be an array, got {v}"))?;
        let tag = items
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| format!("input must start with a numeric tag, got {v}"))?;
        match (tag, items.len()) {
            (INPUT_SAME_BLOCK_SHADOW, 2) => {
                Ok(WireInput::Inline(InputPayload::from_value(&items[1])?))
            }
            (INPUT_BLOCK_NO_SHADOW, 2) => {
                Ok(WireInput::Linked(InputPayload::from_value(&items[1])?))
            }
            (INPUT_DIFF_BLOCK_SHADOW, 2) => Ok(WireInput::Shadowed(
                InputPayload::from_value(&items[1])?,
                None,
            )),
            (INPUT_DIFF_BLOCK_SHADOW, 3) => {
                let shadow = match InputPayload::from_value(&items[2])? {
                    InputPayload::Empty => None,
                    other => Some(other),
                };
                Ok(WireInput::Shadowed(InputPayload::from_value(&items[1])?, shadow))
            }
            (INPUT_SAME_BLOCK_SHADOW | INPUT_BLOCK_NO_SHADOW | INPUT_DIFF_BLOCK_SHADOW, n) => {
                Err(format!("input tag {tag} has unexpected arity {n}"))
            }
            _ => Err(format!("unknown input tag {tag}")),
        }
    }
}

struct PayloadRef<'a>(&'a InputPayload);

impl Serialize for PayloadRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            InputPayload::Block(id) => serializer.serialize_str(id),
            InputPayload::Empty => serializer.serialize_none(),
            InputPayload::Primitive(p) => {
                let mut seq = serializer.serialize_seq(Some(2 + p.rest.len()))?;
                seq.serialize_element(&p.kind)?;
                seq.serialize_element(&p.value)?;
                for extra in &p.rest {
                    seq.serialize_element(extra)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for WireInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            WireInput::Inline(p) | WireInput::Linked(p) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&self.tag())?;
                seq.serialize_element(&PayloadRef(p))?;
                seq.end()
            }
            WireInput::Shadowed(p, shadow) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&self.tag())?;
                seq.serialize_element(&PayloadRef(p))?;
                match shadow {
                    Some(s) => seq.serialize_element(&PayloadRef(s))?,
                    None => seq.serialize_element(&Value::Null)?,
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for WireInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        WireInput::from_value(&v).map_err(de::Error::custom)
    }
}

pub(crate) fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn parse_workspace_json(bytes: &[u8]) -> Result<Workspace, CodecError> {
    let v: Value = serde_json::from_slice(bytes).map_err(|e| {
        CodecError::new(CodecErrorKind::Json, format!("parse workspace JSON: {e}"))
    })?;
    workspace_from_value(v)
}

/// Decodes a workspace document node by node.
///
/// Input tuples are checked here so a bad tuple is reported against its
/// block and slot. Top-level entries stored as bare arrays (loose variable or
/// list reporters dropped on the canvas) carry no block structure and are
/// skipped.
pub fn workspace_from_value(v: Value) -> Result<Workspace, CodecError> {
    let entries = match v {
        Value::Object(map) => map,
        other => {
            return Err(CodecError::new(
                CodecErrorKind::Json,
                format!("decode workspace: expected an object of blocks, got {other}"),
            ))
        }
    };

    let mut workspace = Workspace::with_capacity(entries.len());
    for (id, entry) in entries {
        match entry {
            Value::Object(mut fields) => {
                let inputs = fields.remove("inputs");
                let mut block: WireBlock =
                    serde_json::from_value(Value::Object(fields)).map_err(|e| {
                        CodecError::new(
                            CodecErrorKind::Json,
                            format!("decode workspace: block {id:?}: {e}"),
                        )
                        .with_block(id.as_str())
                    })?;
                block.inputs = inputs_from_value(&id, inputs)?;
                workspace.insert(id, block);
            }
            Value::Array(_) => {
                log::debug!("decode workspace: skipping loose primitive {id:?}");
            }
            other => {
                return Err(CodecError::new(
                    CodecErrorKind::Json,
                    format!("decode workspace: block {id:?} must be an object, got {other}"),
                )
                .with_block(id))
            }
        }
    }
    Ok(workspace)
}

fn inputs_from_value(
    block_id: &str,
    inputs: Option<Value>,
) -> Result<IndexMap<String, WireInput>, CodecError> {
    let slots = match inputs {
        None | Some(Value::Null) => return Ok(IndexMap::new()),
        Some(Value::Object(slots)) => slots,
        Some(other) => {
            return Err(CodecError::new(
                CodecErrorKind::Json,
                format!(
                    "decode workspace: block {block_id:?} inputs must be an object, got {other}"
                ),
            )
            .with_block(block_id))
        }
    };
    let mut out = IndexMap::with_capacity(slots.len());
    for (key, raw) in slots {
        let input = WireInput::from_value(&raw)
            .map_err(|detail| CodecError::malformed_input(block_id, &key, detail))?;
        out.insert(key, input);
    }
    Ok(out)
}

/// Ids of `topLevel` nodes without a parent, in document order.
pub fn top_level_roots(workspace: &Workspace) -> Vec<&str> {
    workspace
        .iter()
        .filter(|(_, block)| block.is_root())
        .map(|(id, _)| id.as_str())
        .collect()
}

/// Shallow union of workspaces. On an id collision the later workspace's node
/// replaces the earlier one (keeping the earlier position); collisions are not
/// reported as errors.
pub fn merge_workspaces<I>(workspaces: I) -> Workspace
where
    I: IntoIterator<Item = Workspace>,
{
    let mut merged = Workspace::new();
    for workspace in workspaces {
        for (id, block) in workspace {
            if merged.insert(id.clone(), block).is_some() {
                log::debug!("merge: block id {id:?} shadowed by a later workspace");
            }
        }
    }
    merged
}
