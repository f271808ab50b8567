//! IR -> workspace lowering.

use indexmap::IndexMap;

use fuse_sb3_contracts::{
    DEFAULT_ANY_ARGUMENT, DEFAULT_BOOL_ARGUMENT, FIELD_ARGUMENT_VALUE, INPUT_CUSTOM_BLOCK,
    MUTATION_ARGUMENT_DEFAULTS, MUTATION_ARGUMENT_IDS, MUTATION_ARGUMENT_NAMES,
    MUTATION_CHILDREN, MUTATION_PROCCODE, MUTATION_TAG_NAME, MUTATION_TAG_NAME_VALUE,
    MUTATION_WARP, OPCODE_ARGUMENT_REPORTER_BOOLEAN, OPCODE_ARGUMENT_REPORTER_STRING_NUMBER,
    OPCODE_PROCEDURES_DEFINITION, OPCODE_PROCEDURES_PROTOTYPE,
};

use crate::error::CodecError;
use crate::ir::{AnyValue, Block, CompiledFunction, Input, ParamType, Reporter, Script};
use crate::options::CodecOptions;
use crate::proccode::parse_proccode_argument_types;
use crate::uid::IdSource;
use crate::wire::{
    InputPayload, Mutation, MutationValue, Primitive, WireBlock, WireField, WireInput, Workspace,
};

/// One serialization pass. Owns the workspace being built; ids come from the
/// caller's source.
pub(crate) struct Lowering<'a, I: IdSource + ?Sized> {
    ids: &'a mut I,
    options: &'a CodecOptions,
    workspace: Workspace,
}

impl<'a, I: IdSource + ?Sized> Lowering<'a, I> {
    pub(crate) fn new(ids: &'a mut I, options: &'a CodecOptions) -> Self {
        Lowering {
            ids,
            options,
            workspace: Workspace::new(),
        }
    }

    pub(crate) fn finish(self) -> Workspace {
        self.workspace
    }

    /// Emits `block` as a node under `parent`, then its inputs. The node is
    /// inserted before its inputs so parents precede children in the output.
    fn emit_node(&mut self, block: &Block, parent: Option<&str>) -> Result<String, CodecError> {
        let id = self.ids.next_id()?;
        log::trace!("lower {:?} -> {id}", block.opcode);

        let mut node = WireBlock::new(block.opcode.clone());
        node.parent = parent.map(str::to_string);
        node.fields = block
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), WireField::literal(v.clone())))
            .collect();
        node.mutation = block.mutation.clone();
        self.workspace.insert(id.clone(), node);

        let mut inputs = IndexMap::with_capacity(block.inputs.len());
        for (key, input) in &block.inputs {
            if let Some(wire) = self.lower_input(key, input, &id)? {
                inputs.insert(key.clone(), wire);
            }
        }
        if let Some(node) = self.workspace.get_mut(&id) {
            node.inputs = inputs;
        }
        Ok(id)
    }

    /// A reporter filling an input slot of `owner`.
    pub(crate) fn lower_reporter(
        &mut self,
        reporter: &Reporter,
        owner: &str,
    ) -> Result<String, CodecError> {
        self.emit_node(reporter, Some(owner))
    }

    /// `None` means the slot is omitted (empty substack).
    fn lower_input(
        &mut self,
        key: &str,
        input: &Input,
        owner: &str,
    ) -> Result<Option<WireInput>, CodecError> {
        match input {
            Input::Any(AnyValue::Literal(value)) => Ok(Some(WireInput::Inline(
                InputPayload::Primitive(Primitive::text(value.clone())),
            ))),
            Input::Any(AnyValue::Reporter(reporter)) => {
                let id = self.lower_reporter(reporter, owner)?;
                Ok(Some(WireInput::Shadowed(
                    InputPayload::Block(id),
                    Some(InputPayload::Primitive(Primitive::text(""))),
                )))
            }
            Input::Bool(reporter) => {
                let id = self.lower_reporter(reporter, owner)?;
                Ok(Some(WireInput::Linked(InputPayload::Block(id))))
            }
            Input::Substack(blocks) => match self.lower_chain(blocks, Some(owner))? {
                Some(head) => Ok(Some(WireInput::Linked(InputPayload::Block(head)))),
                None => {
                    log::trace!("empty substack {key:?} of {owner} omitted");
                    Ok(None)
                }
            },
        }
    }

    /// Lowers `blocks` as one `next`/`parent` linked chain and returns the
    /// head id. The head's parent is `owner` (`None` for a root chain).
    pub(crate) fn lower_chain(
        &mut self,
        blocks: &[Block],
        owner: Option<&str>,
    ) -> Result<Option<String>, CodecError> {
        let mut head: Option<String> = None;
        let mut prev: Option<String> = None;
        for block in blocks {
            let parent = prev.as_deref().or(owner);
            let id = self.emit_node(block, parent)?;
            match &prev {
                Some(prev_id) => self.set_next(prev_id, &id),
                None => head = Some(id.clone()),
            }
            prev = Some(id);
        }
        Ok(head)
    }

    fn set_next(&mut self, id: &str, next: &str) {
        if let Some(node) = self.workspace.get_mut(id) {
            node.next = Some(next.to_string());
        }
    }

    fn mark_top_level(&mut self, id: &str) {
        let origin = self.options.canvas_origin;
        if let Some(node) = self.workspace.get_mut(id) {
            node.top_level = true;
            node.x = Some(origin.x);
            node.y = Some(origin.y);
        }
    }

    pub(crate) fn lower_blocks(&mut self, blocks: &[Block]) -> Result<(), CodecError> {
        if let Some(head) = self.lower_chain(blocks, None)? {
            self.mark_top_level(&head);
        }
        Ok(())
    }

    pub(crate) fn lower_script(&mut self, script: &Script) -> Result<(), CodecError> {
        match &script.hat {
            Some(hat) => {
                let hat_id = self.emit_node(hat, None)?;
                self.mark_top_level(&hat_id);
                if let Some(first) = self.lower_chain(&script.blocks, Some(hat_id.as_str()))? {
                    self.set_next(&hat_id, &first);
                }
            }
            None => self.lower_blocks(&script.blocks)?,
        }
        Ok(())
    }

    /// Emits the definition/prototype pair, one argument reporter per
    /// parameter, and the body. `defaults` overrides the per-type defaults.
    pub(crate) fn lower_function(
        &mut self,
        function: &CompiledFunction,
        defaults: Option<&[String]>,
    ) -> Result<String, CodecError> {
        let params = &function.decl.parameters;
        let defaults: Vec<String> = match defaults {
            Some(values) if values.len() != params.len() => {
                return Err(CodecError::unsupported_value(format!(
                    "function {:?} has {} parameters but {} default values",
                    function.proccode,
                    params.len(),
                    values.len()
                )));
            }
            Some(values) => values.to_vec(),
            None => params.iter().map(|p| default_for(p.ty).to_string()).collect(),
        };

        let placeholders = parse_proccode_argument_types(&function.proccode);
        if placeholders.len() != params.len() {
            log::warn!(
                "proccode {:?} has {} placeholders for {} parameters",
                function.proccode,
                placeholders.len(),
                params.len()
            );
        }

        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        // Real argument ids are only known at call sites, so names stand in.
        let names_json = serde_json::to_string(&names)?;

        let mut mutation = Mutation::new();
        mutation.insert(
            MUTATION_TAG_NAME.to_string(),
            MutationValue::Text(MUTATION_TAG_NAME_VALUE.to_string()),
        );
        mutation.insert(MUTATION_CHILDREN.to_string(), MutationValue::Children(Vec::new()));
        mutation.insert(
            MUTATION_PROCCODE.to_string(),
            MutationValue::Text(function.proccode.clone()),
        );
        mutation.insert(
            MUTATION_ARGUMENT_IDS.to_string(),
            MutationValue::Text(names_json.clone()),
        );
        mutation.insert(
            MUTATION_ARGUMENT_NAMES.to_string(),
            MutationValue::Text(names_json),
        );
        mutation.insert(
            MUTATION_ARGUMENT_DEFAULTS.to_string(),
            MutationValue::Text(serde_json::to_string(&defaults)?),
        );
        mutation.insert(
            MUTATION_WARP.to_string(),
            MutationValue::Text(function.decl.atomic.to_string()),
        );

        let definition_id = self.ids.next_id()?;
        let prototype_id = self.ids.next_id()?;
        log::debug!(
            "lower function {:?}: definition {definition_id}, prototype {prototype_id}",
            function.proccode
        );

        let mut definition = WireBlock::new(OPCODE_PROCEDURES_DEFINITION);
        definition.inputs.insert(
            INPUT_CUSTOM_BLOCK.to_string(),
            WireInput::Inline(InputPayload::Block(prototype_id.clone())),
        );
        self.workspace.insert(definition_id.clone(), definition);
        self.mark_top_level(&definition_id);

        let mut prototype = WireBlock::new(OPCODE_PROCEDURES_PROTOTYPE);
        prototype.parent = Some(definition_id.clone());
        prototype.shadow = true;
        prototype.mutation = Some(mutation);

        let mut arguments = Vec::with_capacity(params.len());
        for param in params {
            let arg_id = self.ids.next_id()?;
            let opcode = match param.ty {
                ParamType::Bool => OPCODE_ARGUMENT_REPORTER_BOOLEAN,
                ParamType::Any => OPCODE_ARGUMENT_REPORTER_STRING_NUMBER,
            };
            let mut reporter = WireBlock::new(opcode);
            reporter.parent = Some(prototype_id.clone());
            reporter.shadow = true;
            reporter.fields.insert(
                FIELD_ARGUMENT_VALUE.to_string(),
                WireField::literal(param.name.clone()),
            );

            let slot = match param.ty {
                ParamType::Bool => WireInput::Linked(InputPayload::Block(arg_id.clone())),
                ParamType::Any => WireInput::Inline(InputPayload::Block(arg_id.clone())),
            };
            prototype.inputs.insert(param.name.clone(), slot);
            arguments.push((arg_id, reporter));
        }

        self.workspace.insert(prototype_id, prototype);
        self.workspace.extend(arguments);

        if let Some(first) = self.lower_chain(&function.body, Some(definition_id.as_str()))? {
            self.set_next(&definition_id, &first);
        }
        Ok(definition_id)
    }
}

fn default_for(ty: ParamType) -> &'static str {
    match ty {
        ParamType::Bool => DEFAULT_BOOL_ARGUMENT,
        ParamType::Any => DEFAULT_ANY_ARGUMENT,
    }
}
