//! Workspace -> IR raising.

use std::collections::HashSet;

use serde_json::Value;

use fuse_sb3_contracts::{
    DEFAULT_ANY_ARGUMENT, DEFAULT_BOOL_ARGUMENT, INPUT_CUSTOM_BLOCK, MUTATION_ARGUMENT_DEFAULTS,
    MUTATION_ARGUMENT_NAMES, MUTATION_PROCCODE, MUTATION_WARP, OPCODE_PROCEDURES_DEFINITION,
    OPCODE_PROCEDURES_PROTOTYPE,
};

use crate::error::{CodecError, CodecErrorKind};
use crate::ir::{
    AnyValue, Block, CompiledFunction, CompiledFunctionWithDefault, FunctionDeclaration, Input,
    ParamType, Parameter, Reporter, Script,
};
use crate::options::CodecOptions;
use crate::proccode::parse_proccode_argument_types;
use crate::wire::{
    scalar_to_string, top_level_roots, InputPayload, Mutation, MutationValue, Primitive,
    WireBlock, WireInput, Workspace,
};

/// State for one raising pass over a workspace.
struct Raising<'a> {
    workspace: &'a Workspace,
    options: &'a CodecOptions,
    /// Statements already placed in some chain.
    visited: HashSet<String>,
    /// Nodes on the current recursion path.
    active: HashSet<String>,
}

impl<'a> Raising<'a> {
    fn new(workspace: &'a Workspace, options: &'a CodecOptions) -> Self {
        Raising {
            workspace,
            options,
            visited: HashSet::new(),
            active: HashSet::new(),
        }
    }

    fn node(&self, id: &str, from: Option<&str>, slot: &str) -> Result<&'a WireBlock, CodecError> {
        self.workspace
            .get(id)
            .ok_or_else(|| CodecError::missing_reference(from, slot, id))
    }

    fn raise_node(&mut self, id: &str, node: &'a WireBlock) -> Result<Block, CodecError> {
        if !self.active.insert(id.to_string()) {
            return Err(CodecError::new(
                CodecErrorKind::CyclicReference,
                format!("block {id:?} references itself through its inputs"),
            )
            .with_block(id));
        }

        let mut block = Block::new(node.opcode.clone());
        for (key, input) in &node.inputs {
            if let Some(raised) = self.raise_input(id, key, input)? {
                block.inputs.insert(key.clone(), raised);
            }
        }
        block.fields = node
            .fields
            .iter()
            .map(|(k, f)| (k.clone(), f.value().to_string()))
            .collect();
        block.mutation = node.mutation.clone();

        self.active.remove(id);
        Ok(block)
    }

    fn raise_reporter(
        &mut self,
        owner: &str,
        slot: &str,
        id: &str,
    ) -> Result<Reporter, CodecError> {
        let node = self.node(id, Some(owner), slot)?;
        self.raise_node(id, node)
    }

    /// Follows `next` from `head`, stopping at the end of the chain or at a
    /// statement some other chain already claimed.
    fn raise_chain(
        &mut self,
        head: &str,
        owner: Option<&str>,
        slot: &str,
    ) -> Result<Vec<Block>, CodecError> {
        let mut blocks = Vec::new();
        let mut from = owner.map(str::to_string);
        let mut slot = slot;
        let mut current = Some(head.to_string());
        while let Some(id) = current {
            if self.visited.contains(&id) {
                log::trace!("chain stops at already visited block {id}");
                break;
            }
            let node = self.node(&id, from.as_deref(), slot)?;
            self.visited.insert(id.clone());
            blocks.push(self.raise_node(&id, node)?);
            current = node.next.clone();
            from = Some(id);
            slot = "next";
        }
        Ok(blocks)
    }

    /// `None` drops the slot (`null` payloads).
    fn raise_input(
        &mut self,
        owner: &str,
        key: &str,
        input: &WireInput,
    ) -> Result<Option<Input>, CodecError> {
        match input {
            WireInput::Linked(InputPayload::Block(id)) => {
                let target = self.node(id, Some(owner), key)?;
                if target.next.is_some() || self.options.is_substack_key(key) {
                    let blocks = self.raise_chain(id, Some(owner), key)?;
                    Ok(Some(Input::Substack(blocks)))
                } else {
                    let reporter = self.raise_node(id, target)?;
                    Ok(Some(Input::Bool(Box::new(reporter))))
                }
            }
            WireInput::Inline(payload)
            | WireInput::Linked(payload)
            | WireInput::Shadowed(payload, _) => match payload {
                InputPayload::Block(id) => {
                    let reporter = self.raise_reporter(owner, key, id)?;
                    Ok(Some(Input::Any(AnyValue::Reporter(Box::new(reporter)))))
                }
                InputPayload::Primitive(primitive) => {
                    self.raise_primitive(owner, key, primitive).map(Some)
                }
                InputPayload::Empty => Ok(None),
            },
        }
    }

    fn raise_primitive(
        &self,
        owner: &str,
        key: &str,
        primitive: &Primitive,
    ) -> Result<Input, CodecError> {
        let text = primitive.value_text().ok_or_else(|| {
            CodecError::unsupported_value(format!(
                "block {owner:?} slot {key:?}: primitive value {} is not a scalar",
                primitive.value
            ))
            .with_block(owner)
            .with_slot(key)
        })?;
        if primitive.is_variable() {
            let reporter = Block::new(self.options.variable_opcode.clone())
                .with_field(self.options.variable_field.clone(), text);
            Ok(Input::reporter(reporter))
        } else {
            Ok(Input::literal(text))
        }
    }

    fn raise_script_at(&mut self, root: &str) -> Result<Script, CodecError> {
        let node = self.node(root, None, "root")?;
        if self.options.is_hat_opcode(&node.opcode) {
            self.visited.insert(root.to_string());
            let hat = self.raise_node(root, node)?;
            let blocks = match &node.next {
                Some(next) => self.raise_chain(next, Some(root), "next")?,
                None => Vec::new(),
            };
            Ok(Script {
                hat: Some(hat),
                blocks,
            })
        } else {
            Ok(Script {
                hat: None,
                blocks: self.raise_chain(root, None, "root")?,
            })
        }
    }
}

pub(crate) fn raise_blocks(
    workspace: &Workspace,
    options: &CodecOptions,
) -> Result<Vec<Block>, CodecError> {
    let Some(&root) = top_level_roots(workspace).first() else {
        return Ok(Vec::new());
    };
    log::debug!("raise blocks from root {root}");
    Raising::new(workspace, options).raise_chain(root, None, "root")
}

pub(crate) fn raise_script(
    workspace: &Workspace,
    options: &CodecOptions,
) -> Result<Script, CodecError> {
    let Some(&root) = top_level_roots(workspace).first() else {
        return Ok(Script::default());
    };
    log::debug!("raise script from root {root}");
    Raising::new(workspace, options).raise_script_at(root)
}

pub(crate) fn raise_all_scripts(
    workspace: &Workspace,
    options: &CodecOptions,
) -> Result<Vec<Script>, CodecError> {
    let roots = top_level_roots(workspace);
    log::debug!("raise scripts from {} roots", roots.len());
    let mut raising = Raising::new(workspace, options);
    let mut scripts = Vec::new();
    for root in roots {
        if raising.visited.contains(root) {
            continue;
        }
        if workspace[root].opcode == OPCODE_PROCEDURES_DEFINITION {
            continue;
        }
        scripts.push(raising.raise_script_at(root)?);
    }
    Ok(scripts)
}

pub(crate) fn raise_function(
    workspace: &Workspace,
    options: &CodecOptions,
) -> Result<CompiledFunctionWithDefault, CodecError> {
    let (definition_id, definition) = workspace
        .iter()
        .find(|(_, block)| block.opcode == OPCODE_PROCEDURES_DEFINITION)
        .ok_or_else(|| {
            CodecError::missing_structure(format!("no {OPCODE_PROCEDURES_DEFINITION} block found"))
        })?;

    let prototype_id = definition
        .inputs
        .get(INPUT_CUSTOM_BLOCK)
        .and_then(WireInput::block_ref)
        .ok_or_else(|| {
            CodecError::missing_structure(format!(
                "definition {definition_id:?} has no valid {INPUT_CUSTOM_BLOCK} input"
            ))
            .with_block(definition_id.as_str())
            .with_slot(INPUT_CUSTOM_BLOCK)
        })?;
    let prototype = workspace
        .get(prototype_id)
        .filter(|block| block.opcode == OPCODE_PROCEDURES_PROTOTYPE)
        .ok_or_else(|| {
            CodecError::missing_structure(format!(
                "definition {definition_id:?} does not point at a \
                 {OPCODE_PROCEDURES_PROTOTYPE} block"
            ))
            .with_block(definition_id.as_str())
            .with_missing(prototype_id)
        })?;
    let mutation = prototype.mutation.as_ref().ok_or_else(|| {
        CodecError::missing_structure(format!("prototype {prototype_id:?} has no mutation"))
            .with_block(prototype_id)
    })?;

    let proccode = mutation_text(mutation, prototype_id, MUTATION_PROCCODE)?.to_string();
    let names: Vec<String> =
        parse_json_array(mutation_text(mutation, prototype_id, MUTATION_ARGUMENT_NAMES)?)
            .map_err(|detail| malformed_blob(prototype_id, MUTATION_ARGUMENT_NAMES, detail))?;

    let types = parse_proccode_argument_types(&proccode);
    let parameters: Vec<Parameter> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Parameter::new(name, types.get(i).copied().unwrap_or(ParamType::Any)))
        .collect();

    let derived = || -> Vec<String> {
        parameters
            .iter()
            .map(|p| match p.ty {
                ParamType::Bool => DEFAULT_BOOL_ARGUMENT.to_string(),
                ParamType::Any => DEFAULT_ANY_ARGUMENT.to_string(),
            })
            .collect()
    };
    let default_values = match mutation.get(MUTATION_ARGUMENT_DEFAULTS) {
        None => derived(),
        Some(value) => {
            let text = value.as_text().ok_or_else(|| {
                malformed_blob(prototype_id, MUTATION_ARGUMENT_DEFAULTS, "not a string")
            })?;
            let values = parse_json_array(text).map_err(|detail| {
                malformed_blob(prototype_id, MUTATION_ARGUMENT_DEFAULTS, detail)
            })?;
            if values.len() == parameters.len() {
                values
            } else {
                log::warn!(
                    "prototype {prototype_id}: {} defaults for {} parameters, using type defaults",
                    values.len(),
                    parameters.len()
                );
                derived()
            }
        }
    };

    let atomic = match mutation.get(MUTATION_WARP) {
        Some(MutationValue::Text(s)) => s == "true",
        Some(MutationValue::Flag(b)) => *b,
        Some(MutationValue::Children(_)) | None => false,
    };

    log::debug!("raise function {proccode:?} from definition {definition_id}");
    let mut raising = Raising::new(workspace, options);
    raising.visited.insert(definition_id.clone());
    let body = match &definition.next {
        Some(next) => raising.raise_chain(next, Some(definition_id.as_str()), "next")?,
        None => Vec::new(),
    };

    Ok(CompiledFunctionWithDefault {
        function: CompiledFunction {
            decl: FunctionDeclaration {
                name: String::new(),
                parameters,
                atomic,
                return_type: String::new(),
            },
            proccode,
            body,
        },
        default_values,
    })
}

/// Raises every definition in the workspace, each from the sub-workspace
/// reachable from it through `next` links and block-valued inputs.
pub(crate) fn raise_all_functions(
    workspace: &Workspace,
    options: &CodecOptions,
) -> Result<Vec<CompiledFunctionWithDefault>, CodecError> {
    let definitions: Vec<&String> = workspace
        .iter()
        .filter(|(_, block)| block.opcode == OPCODE_PROCEDURES_DEFINITION)
        .map(|(id, _)| id)
        .collect();
    log::debug!("raise {} function definitions", definitions.len());

    definitions
        .into_iter()
        .map(|id| raise_function(&reachable_from(workspace, id), options))
        .collect()
}

fn reachable_from(workspace: &Workspace, start: &str) -> Workspace {
    let mut out = Workspace::new();
    let mut pending = vec![start.to_string()];
    while let Some(id) = pending.pop() {
        if out.contains_key(&id) {
            continue;
        }
        let Some(block) = workspace.get(&id) else {
            continue;
        };
        if let Some(next) = &block.next {
            pending.push(next.clone());
        }
        for input in block.inputs.values() {
            if let Some(target) = input.block_ref() {
                pending.push(target.to_string());
            }
        }
        out.insert(id, block.clone());
    }
    out
}

fn mutation_text<'m>(
    mutation: &'m Mutation,
    block_id: &str,
    key: &str,
) -> Result<&'m str, CodecError> {
    match mutation.get(key) {
        Some(value) => value
            .as_text()
            .ok_or_else(|| malformed_blob(block_id, key, "not a string")),
        None => Err(CodecError::missing_structure(format!(
            "prototype {block_id:?} mutation is missing {key:?}"
        ))
        .with_block(block_id)
        .with_slot(key)),
    }
}

/// A JSON-encoded array of scalars, rendered as strings.
fn parse_json_array(text: &str) -> Result<Vec<String>, String> {
    let items: Vec<Value> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    items
        .iter()
        .map(|item| scalar_to_string(item).ok_or_else(|| format!("{item} is not a scalar")))
        .collect()
}

fn malformed_blob(block_id: &str, key: &str, detail: impl std::fmt::Display) -> CodecError {
    CodecError::missing_structure(format!(
        "prototype {block_id:?} mutation key {key:?} is malformed: {detail}"
    ))
    .with_block(block_id)
    .with_slot(key)
}
