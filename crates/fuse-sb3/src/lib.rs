pub mod codec;
mod deserialize;
pub mod error;
pub mod ir;
pub mod options;
pub mod proccode;
mod serialize;
pub mod target;
pub mod uid;
pub mod validate;
pub mod wire;

pub use codec::{
    deserialize_all_functions, deserialize_all_scripts, deserialize_blocks, deserialize_function,
    deserialize_script, serialize_blocks, serialize_function, serialize_function_with_defaults,
    serialize_script, Codec,
};
pub use error::{CodecError, CodecErrorKind};
pub use options::CodecOptions;
pub use proccode::parse_proccode_argument_types;
pub use validate::{check_workspace, validate_workspace};
pub use wire::{merge_workspaces, Workspace};
