//! Entry points. [`Codec`] bundles options with an id source; the free
//! functions run a default-configured codec with random ids.

use crate::deserialize;
use crate::error::CodecError;
use crate::ir::{Block, CompiledFunction, CompiledFunctionWithDefault, Script};
use crate::options::CodecOptions;
use crate::serialize::Lowering;
use crate::uid::{IdSource, RandomIds};
use crate::wire::Workspace;

#[derive(Debug, Clone, Default)]
pub struct Codec<I = RandomIds> {
    options: CodecOptions,
    ids: I,
}

impl Codec<RandomIds> {
    pub fn new() -> Self {
        Codec::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Codec {
            options,
            ids: RandomIds,
        }
    }
}

impl<I: IdSource> Codec<I> {
    pub fn with_ids(options: CodecOptions, ids: I) -> Self {
        Codec { options, ids }
    }

    fn lower<F>(&mut self, f: F) -> Result<Workspace, CodecError>
    where
        F: FnOnce(&mut Lowering<'_, I>) -> Result<(), CodecError>,
    {
        let mut lowering = Lowering::new(&mut self.ids, &self.options);
        f(&mut lowering)?;
        Ok(lowering.finish())
    }

    /// One root chain; the first block is the top-level head.
    pub fn serialize_blocks(&mut self, blocks: &[Block]) -> Result<Workspace, CodecError> {
        self.lower(|l| l.lower_blocks(blocks))
    }

    pub fn serialize_script(&mut self, script: &Script) -> Result<Workspace, CodecError> {
        self.lower(|l| l.lower_script(script))
    }

    /// Defaults are derived from parameter types: `"false"` for bool, `""`
    /// otherwise.
    pub fn serialize_function(
        &mut self,
        function: &CompiledFunction,
    ) -> Result<Workspace, CodecError> {
        self.lower(|l| l.lower_function(function, None).map(drop))
    }

    pub fn serialize_function_with_defaults(
        &mut self,
        function: &CompiledFunctionWithDefault,
    ) -> Result<Workspace, CodecError> {
        self.lower(|l| {
            l.lower_function(&function.function, Some(function.default_values.as_slice()))
                .map(drop)
        })
    }

    /// The chain of the first top-level root. Empty when there is none.
    pub fn deserialize_blocks(&self, workspace: &Workspace) -> Result<Vec<Block>, CodecError> {
        deserialize::raise_blocks(workspace, &self.options)
    }

    pub fn deserialize_script(&self, workspace: &Workspace) -> Result<Script, CodecError> {
        deserialize::raise_script(workspace, &self.options)
    }

    /// Every top-level root except procedure definitions.
    pub fn deserialize_all_scripts(
        &self,
        workspace: &Workspace,
    ) -> Result<Vec<Script>, CodecError> {
        deserialize::raise_all_scripts(workspace, &self.options)
    }

    pub fn deserialize_function(
        &self,
        workspace: &Workspace,
    ) -> Result<CompiledFunctionWithDefault, CodecError> {
        deserialize::raise_function(workspace, &self.options)
    }

    pub fn deserialize_all_functions(
        &self,
        workspace: &Workspace,
    ) -> Result<Vec<CompiledFunctionWithDefault>, CodecError> {
        deserialize::raise_all_functions(workspace, &self.options)
    }
}

pub fn serialize_blocks(blocks: &[Block]) -> Result<Workspace, CodecError> {
    Codec::new().serialize_blocks(blocks)
}

pub fn serialize_script(script: &Script) -> Result<Workspace, CodecError> {
    Codec::new().serialize_script(script)
}

pub fn serialize_function(function: &CompiledFunction) -> Result<Workspace, CodecError> {
    Codec::new().serialize_function(function)
}

pub fn serialize_function_with_defaults(
    function: &CompiledFunctionWithDefault,
) -> Result<Workspace, CodecError> {
    Codec::new().serialize_function_with_defaults(function)
}

pub fn deserialize_blocks(workspace: &Workspace) -> Result<Vec<Block>, CodecError> {
    Codec::new().deserialize_blocks(workspace)
}

pub fn deserialize_script(workspace: &Workspace) -> Result<Script, CodecError> {
    Codec::new().deserialize_script(workspace)
}

pub fn deserialize_all_scripts(workspace: &Workspace) -> Result<Vec<Script>, CodecError> {
    Codec::new().deserialize_all_scripts(workspace)
}

pub fn deserialize_function(
    workspace: &Workspace,
) -> Result<CompiledFunctionWithDefault, CodecError> {
    Codec::new().deserialize_function(workspace)
}

pub fn deserialize_all_functions(
    workspace: &Workspace,
) -> Result<Vec<CompiledFunctionWithDefault>, CodecError> {
    Codec::new().deserialize_all_functions(workspace)
}
