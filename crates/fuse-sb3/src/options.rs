use serde::{Deserialize, Serialize};

use fuse_sb3_contracts::{
    FIELD_VARIABLE, OPCODE_CONTROL_START_AS_CLONE, OPCODE_DATA_VARIABLE, SUBSTACK_INPUT_PREFIX,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasOrigin {
    pub x: f64,
    pub y: f64,
}

impl Default for CanvasOrigin {
    fn default() -> Self {
        CanvasOrigin { x: 0.0, y: 0.0 }
    }
}

/// Knobs shared by both codec directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecOptions {
    /// A `[2, id]` slot whose key starts with this prefix is always read as a
    /// nested statement chain, even when the referenced block has no `next`.
    pub substack_prefix: String,
    /// Opcodes treated as script hats in addition to the built-in rule.
    pub extra_hat_opcodes: Vec<String>,
    /// Position given to every new top-level chain head.
    pub canvas_origin: CanvasOrigin,
    /// Opcode and field used when a `[12, name, id]` variable primitive is
    /// raised into a reporter.
    pub variable_opcode: String,
    pub variable_field: String,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            substack_prefix: SUBSTACK_INPUT_PREFIX.to_string(),
            extra_hat_opcodes: Vec::new(),
            canvas_origin: CanvasOrigin::default(),
            variable_opcode: OPCODE_DATA_VARIABLE.to_string(),
            variable_field: FIELD_VARIABLE.to_string(),
        }
    }
}

impl CodecOptions {
    /// Hats are event triggers: `<category>_when...` opcodes (for example
    /// `event_whenflagclicked` or `videoSensing_whenMotionGreaterThan`),
    /// `control_start_as_clone`, and any configured extra opcode.
    pub fn is_hat_opcode(&self, opcode: &str) -> bool {
        if opcode == OPCODE_CONTROL_START_AS_CLONE
            || self.extra_hat_opcodes.iter().any(|o| o == opcode)
        {
            return true;
        }
        match opcode.split_once('_') {
            Some((_, rest)) => rest.starts_with("when"),
            None => false,
        }
    }

    pub fn is_substack_key(&self, key: &str) -> bool {
        !self.substack_prefix.is_empty() && key.starts_with(&self.substack_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hat_detection() {
        let opts = CodecOptions::default();
        assert!(opts.is_hat_opcode("event_whenflagclicked"));
        assert!(opts.is_hat_opcode("event_whenbroadcastreceived"));
        assert!(opts.is_hat_opcode("control_start_as_clone"));
        assert!(opts.is_hat_opcode("makeymakey_whenMakeyKeyPressed"));
        assert!(!opts.is_hat_opcode("event_broadcast"));
        assert!(!opts.is_hat_opcode("motion_movesteps"));
        assert!(!opts.is_hat_opcode("procedures_definition"));

        let opts = CodecOptions {
            extra_hat_opcodes: vec!["custom_hat".to_string()],
            ..CodecOptions::default()
        };
        assert!(opts.is_hat_opcode("custom_hat"));
    }

    #[test]
    fn options_default_missing_fields() {
        let opts: CodecOptions =
            serde_json::from_str(r#"{"substack_prefix": "BODY"}"#).expect("options");
        assert_eq!(opts.substack_prefix, "BODY");
        assert_eq!(opts.variable_opcode, "data_variable");
        assert!(opts.is_substack_key("BODY2"));
        assert!(!opts.is_substack_key("SUBSTACK"));
    }
}
