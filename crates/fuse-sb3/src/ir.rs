//! The tree-shaped IR produced and consumed by the compiler front-end.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::wire::Mutation;

/// A statement node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub opcode: String,
    #[serde(default)]
    pub inputs: IndexMap<String, Input>,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
}

/// Expressions have the same shape as statements; where a node sits decides
/// which one it is.
pub type Reporter = Block;

impl Block {
    pub fn new(opcode: impl Into<String>) -> Self {
        Block {
            opcode: opcode.into(),
            inputs: IndexMap::new(),
            fields: IndexMap::new(),
            mutation: None,
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, input: Input) -> Self {
        self.inputs.insert(key.into(), input);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = Some(mutation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Input {
    Any(AnyValue),
    Bool(Box<Reporter>),
    Substack(Vec<Block>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnyValue {
    Literal(String),
    Reporter(Box<Reporter>),
}

impl Input {
    pub fn literal(value: impl Into<String>) -> Self {
        Input::Any(AnyValue::Literal(value.into()))
    }

    pub fn reporter(reporter: Reporter) -> Self {
        Input::Any(AnyValue::Reporter(Box::new(reporter)))
    }

    pub fn boolean(reporter: Reporter) -> Self {
        Input::Bool(Box::new(reporter))
    }

    pub fn substack(blocks: Vec<Block>) -> Self {
        Input::Substack(blocks)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hat: Option<Block>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Any,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Parameter {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    /// Source-level name. The workspace only carries the proccode, so a
    /// declaration raised from a workspace has an empty name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Run without screen refresh (`warp` on the wire).
    #[serde(default)]
    pub atomic: bool,
    #[serde(default)]
    pub return_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledFunction {
    pub decl: FunctionDeclaration,
    pub proccode: String,
    #[serde(rename = "impl", default)]
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledFunctionWithDefault {
    #[serde(flatten)]
    pub function: CompiledFunction,
    pub default_values: Vec<String>,
}
