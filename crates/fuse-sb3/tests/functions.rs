use fuse_sb3::ir::{
    Block, CompiledFunction, CompiledFunctionWithDefault, FunctionDeclaration, Input, ParamType,
    Parameter, Script,
};
use fuse_sb3::uid::SequentialIds;
use fuse_sb3::wire::{workspace_from_value, MutationValue};
use fuse_sb3::{
    deserialize_all_functions, deserialize_all_scripts, deserialize_function, merge_workspaces,
    parse_proccode_argument_types, serialize_function, serialize_function_with_defaults,
    serialize_script, validate_workspace, Codec, CodecErrorKind, CodecOptions,
};
use serde_json::json;

fn do_if() -> CompiledFunction {
    CompiledFunction {
        decl: FunctionDeclaration {
            name: String::new(),
            parameters: vec![
                Parameter::new("x", ParamType::Any),
                Parameter::new("flag", ParamType::Bool),
            ],
            atomic: true,
            return_type: String::new(),
        },
        proccode: "do %s if %b".to_string(),
        body: vec![Block::new("control_if")
            .with_input(
                "CONDITION",
                Input::boolean(Block::new("argument_reporter_boolean").with_field("VALUE", "flag")),
            )
            .with_input(
                "SUBSTACK",
                Input::substack(vec![Block::new("looks_say").with_input(
                    "MESSAGE",
                    Input::reporter(
                        Block::new("argument_reporter_string_number").with_field("VALUE", "x"),
                    ),
                )]),
            )],
    }
}

fn mutation_text<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value["mutation"][key].as_str().expect("mutation string")
}

#[test]
fn function_signature_round_trips() {
    let function = do_if();
    let workspace = serialize_function(&function).expect("serialize");
    validate_workspace(&workspace).expect("valid");

    let raised = deserialize_function(&workspace).expect("deserialize");
    assert_eq!(raised.function, function);
    assert_eq!(raised.default_values, vec!["".to_string(), "false".to_string()]);
    assert_eq!(
        parse_proccode_argument_types(&raised.function.proccode),
        vec![ParamType::Any, ParamType::Bool]
    );
}

#[test]
fn function_wire_layout() {
    let mut codec = Codec::with_ids(CodecOptions::default(), SequentialIds::default());
    let workspace = codec.serialize_function(&do_if()).expect("serialize");
    let v = serde_json::to_value(&workspace).expect("json");

    assert_eq!(v["b0"]["opcode"], json!("procedures_definition"));
    assert_eq!(v["b0"]["topLevel"], json!(true));
    assert_eq!(v["b0"]["inputs"]["custom_block"], json!([1, "b1"]));
    assert_eq!(v["b0"]["next"], json!("b4"));

    let proto = &v["b1"];
    assert_eq!(proto["opcode"], json!("procedures_prototype"));
    assert_eq!(proto["shadow"], json!(true));
    assert_eq!(proto["parent"], json!("b0"));
    assert_eq!(proto["inputs"], json!({"x": [1, "b2"], "flag": [2, "b3"]}));
    assert_eq!(proto["mutation"]["tagName"], json!("mutation"));
    assert_eq!(proto["mutation"]["children"], json!([]));
    assert_eq!(mutation_text(proto, "proccode"), "do %s if %b");
    assert_eq!(mutation_text(proto, "argumentids"), r#"["x","flag"]"#);
    assert_eq!(mutation_text(proto, "argumentnames"), r#"["x","flag"]"#);
    assert_eq!(mutation_text(proto, "argumentdefaults"), r#"["","false"]"#);
    assert_eq!(mutation_text(proto, "warp"), "true");

    assert_eq!(v["b2"]["opcode"], json!("argument_reporter_string_number"));
    assert_eq!(v["b2"]["fields"]["VALUE"], json!(["x", null]));
    assert_eq!(v["b3"]["opcode"], json!("argument_reporter_boolean"));
    assert_eq!(v["b3"]["parent"], json!("b1"));
    assert_eq!(v["b3"]["shadow"], json!(true));

    assert_eq!(v["b4"]["opcode"], json!("control_if"));
    assert_eq!(v["b4"]["parent"], json!("b0"));
}

#[test]
fn explicit_defaults_are_written_and_read_back() {
    let function = CompiledFunctionWithDefault {
        function: do_if(),
        default_values: vec!["7".to_string(), "true".to_string()],
    };
    let workspace = serialize_function_with_defaults(&function).expect("serialize");
    assert_eq!(deserialize_function(&workspace).expect("deserialize"), function);
}

#[test]
fn default_count_mismatch_is_unsupported() {
    let function = CompiledFunctionWithDefault {
        function: do_if(),
        default_values: vec!["only one".to_string()],
    };
    let err = serialize_function_with_defaults(&function).expect_err("mismatch");
    assert_eq!(err.kind, CodecErrorKind::UnsupportedValue);
}

#[test]
fn escaped_placeholders_are_not_parameters() {
    let function = CompiledFunction {
        decl: FunctionDeclaration {
            parameters: vec![Parameter::new("n", ParamType::Any)],
            ..FunctionDeclaration::default()
        },
        proccode: "100%% done, %s".to_string(),
        body: Vec::new(),
    };
    let workspace = serialize_function(&function).expect("serialize");
    let raised = deserialize_function(&workspace).expect("deserialize");
    assert_eq!(raised.function, function);
    assert_eq!(raised.default_values, vec![String::new()]);
}

#[test]
fn missing_defaults_and_boolean_warp_are_accepted() {
    let workspace = workspace_from_value(json!({
        "def": {"opcode": "procedures_definition", "next": null, "parent": null,
                "inputs": {"custom_block": [1, "proto"]}, "fields": {},
                "shadow": false, "topLevel": true, "x": 0, "y": 0},
        "proto": {"opcode": "procedures_prototype", "next": null, "parent": "def",
                  "inputs": {}, "fields": {}, "shadow": true, "topLevel": false,
                  "mutation": {"tagName": "mutation", "children": [],
                               "proccode": "jump %n %b", "argumentids": "[\"a\",\"b\",\"c\"]",
                               "argumentnames": "[\"height\",\"high\",\"extra\"]",
                               "warp": true}}
    }))
    .expect("workspace");

    let raised = deserialize_function(&workspace).expect("deserialize");
    let decl = &raised.function.decl;
    assert!(decl.atomic);
    assert_eq!(decl.name, "");
    // `%n` is not a placeholder; the single `%b` types the first name.
    let types: Vec<ParamType> = decl.parameters.iter().map(|p| p.ty).collect();
    assert_eq!(types, vec![ParamType::Bool, ParamType::Any, ParamType::Any]);
    assert_eq!(raised.default_values, vec!["false", "", ""]);
}

#[test]
fn broken_prototype_is_missing_structure() {
    let workspace = workspace_from_value(json!({
        "def": {"opcode": "procedures_definition", "next": null, "parent": null,
                "inputs": {"custom_block": [1, "proto"]}, "fields": {},
                "shadow": false, "topLevel": true},
        "proto": {"opcode": "procedures_prototype", "next": null, "parent": "def",
                  "inputs": {}, "fields": {}, "shadow": true, "topLevel": false}
    }))
    .expect("workspace");
    let err = deserialize_function(&workspace).expect_err("no mutation");
    assert_eq!(err.kind, CodecErrorKind::MissingStructure);
    assert_eq!(err.block_id.as_deref(), Some("proto"));
}

#[test]
fn all_functions_from_a_merged_workspace() {
    let greet = CompiledFunction {
        decl: FunctionDeclaration {
            parameters: vec![Parameter::new("who", ParamType::Any)],
            ..FunctionDeclaration::default()
        },
        proccode: "greet %s".to_string(),
        body: vec![Block::new("looks_say").with_input(
            "MESSAGE",
            Input::reporter(
                Block::new("argument_reporter_string_number").with_field("VALUE", "who"),
            ),
        )],
    };
    let script = Script {
        hat: Some(Block::new("event_whenflagclicked")),
        blocks: vec![Block::new("procedures_call").with_input("who", Input::literal("world"))],
    };

    let merged = merge_workspaces([
        serialize_function(&do_if()).expect("serialize"),
        serialize_script(&script).expect("serialize"),
        serialize_function(&greet).expect("serialize"),
    ]);
    validate_workspace(&merged).expect("valid");

    let functions = deserialize_all_functions(&merged).expect("functions");
    let raised: Vec<&CompiledFunction> = functions.iter().map(|f| &f.function).collect();
    assert_eq!(raised, vec![&do_if(), &greet]);

    assert_eq!(deserialize_all_scripts(&merged).expect("scripts"), vec![script]);
}

#[test]
fn warp_flag_is_written_as_a_string() {
    let mut function = do_if();
    function.decl.atomic = false;
    let workspace = serialize_function(&function).expect("serialize");
    let proto = workspace
        .values()
        .find(|b| b.opcode == "procedures_prototype")
        .expect("prototype");
    let warp = proto.mutation.as_ref().and_then(|m| m.get("warp"));
    assert_eq!(warp, Some(&MutationValue::Text("false".to_string())));
}
