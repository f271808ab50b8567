//! Shared, version-pinned wire identifiers.
//!
//! These constants are the single source of truth for the opcode names, input
//! tags, and metadata keys that appear in a workspace document, plus the schema
//! strings of the machine-readable files the CLI reads and writes.

pub const FUSE_SB3_OPTIONS_SCHEMA_VERSION: &str = "fuse-sb3.options@0.1.0";
pub const FUSE_SB3_OPTIONS_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &[FUSE_SB3_OPTIONS_SCHEMA_VERSION];
pub const FUSE_SB3_REPORT_SCHEMA_VERSION: &str = "fuse-sb3.report@0.1.0";

// Input tuple tags.
pub const INPUT_SAME_BLOCK_SHADOW: u64 = 1;
pub const INPUT_BLOCK_NO_SHADOW: u64 = 2;
pub const INPUT_DIFF_BLOCK_SHADOW: u64 = 3;

// Primitive subtags carried inside an input tuple.
pub const PRIMITIVE_TEXT: u64 = 10;
pub const PRIMITIVE_VARIABLE: u64 = 12;

// Procedure opcodes.
pub const OPCODE_PROCEDURES_DEFINITION: &str = "procedures_definition";
pub const OPCODE_PROCEDURES_PROTOTYPE: &str = "procedures_prototype";
pub const OPCODE_ARGUMENT_REPORTER_BOOLEAN: &str = "argument_reporter_boolean";
pub const OPCODE_ARGUMENT_REPORTER_STRING_NUMBER: &str = "argument_reporter_string_number";
pub const OPCODE_DATA_VARIABLE: &str = "data_variable";
pub const OPCODE_CONTROL_START_AS_CLONE: &str = "control_start_as_clone";

// Slot and field names.
pub const INPUT_CUSTOM_BLOCK: &str = "custom_block";
pub const FIELD_ARGUMENT_VALUE: &str = "VALUE";
pub const FIELD_VARIABLE: &str = "VARIABLE";
pub const SUBSTACK_INPUT_PREFIX: &str = "SUBSTACK";

// Prototype mutation keys.
pub const MUTATION_TAG_NAME: &str = "tagName";
pub const MUTATION_TAG_NAME_VALUE: &str = "mutation";
pub const MUTATION_CHILDREN: &str = "children";
pub const MUTATION_PROCCODE: &str = "proccode";
pub const MUTATION_ARGUMENT_IDS: &str = "argumentids";
pub const MUTATION_ARGUMENT_NAMES: &str = "argumentnames";
pub const MUTATION_ARGUMENT_DEFAULTS: &str = "argumentdefaults";
pub const MUTATION_WARP: &str = "warp";

// Defaults written for parameters without an explicit default.
pub const DEFAULT_ANY_ARGUMENT: &str = "";
pub const DEFAULT_BOOL_ARGUMENT: &str = "false";

/// Identifier length and alphabet used for freshly allocated node ids.
///
/// 87 symbols ^ 20 characters is more than 128 bits, so ids are treated as
/// collision-free within a workspace.
pub const BLOCK_ID_LEN: usize = 20;
pub const BLOCK_ID_ALPHABET: &[u8; 87] =
    b"!#%()*+,-./:;=?@[]^_`{|}~ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
