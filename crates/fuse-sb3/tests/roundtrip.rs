use fuse_sb3::ir::{Block, Input, Script};
use fuse_sb3::uid::SequentialIds;
use fuse_sb3::wire::{top_level_roots, Mutation};
use fuse_sb3::{
    deserialize_blocks, deserialize_script, serialize_blocks, serialize_script,
    validate_workspace, Codec, CodecOptions,
};
use serde_json::json;

fn sample_chain() -> Vec<Block> {
    vec![
        Block::new("motion_movesteps").with_input("STEPS", Input::literal("10")),
        Block::new("control_if")
            .with_input(
                "CONDITION",
                Input::boolean(
                    Block::new("operator_gt")
                        .with_input(
                            "OPERAND1",
                            Input::reporter(
                                Block::new("data_variable").with_field("VARIABLE", "score"),
                            ),
                        )
                        .with_input("OPERAND2", Input::literal("50")),
                ),
            )
            .with_input(
                "SUBSTACK",
                Input::substack(vec![
                    Block::new("looks_say").with_input(
                        "MESSAGE",
                        Input::reporter(
                            Block::new("operator_join")
                                .with_input("STRING1", Input::literal("score: "))
                                .with_input(
                                    "STRING2",
                                    Input::reporter(
                                        Block::new("data_variable").with_field("VARIABLE", "score"),
                                    ),
                                ),
                        ),
                    ),
                    Block::new("sound_play").with_input(
                        "SOUND_MENU",
                        Input::reporter(
                            Block::new("sound_sounds_menu").with_field("SOUND_MENU", "pop"),
                        ),
                    ),
                ]),
            ),
        Block::new("data_setvariableto")
            .with_field("VARIABLE", "score")
            .with_input("VALUE", Input::literal("0")),
    ]
}

#[test]
fn block_chain_round_trips() {
    let blocks = sample_chain();
    let workspace = serialize_blocks(&blocks).expect("serialize");
    validate_workspace(&workspace).expect("valid");
    assert_eq!(top_level_roots(&workspace).len(), 1);
    assert_eq!(deserialize_blocks(&workspace).expect("deserialize"), blocks);
}

#[test]
fn round_trip_survives_json_text() {
    let blocks = sample_chain();
    let workspace = serialize_blocks(&blocks).expect("serialize");
    let text = serde_json::to_string(&workspace).expect("json");
    let reread = fuse_sb3::wire::parse_workspace_json(text.as_bytes()).expect("parse");
    assert_eq!(reread, workspace);
    assert_eq!(deserialize_blocks(&reread).expect("deserialize"), blocks);
}

#[test]
fn script_with_hat_round_trips() {
    let script = Script {
        hat: Some(Block::new("event_whenflagclicked")),
        blocks: sample_chain(),
    };
    let workspace = serialize_script(&script).expect("serialize");
    validate_workspace(&workspace).expect("valid");

    let roots = top_level_roots(&workspace);
    assert_eq!(roots.len(), 1);
    assert_eq!(workspace[roots[0]].opcode, "event_whenflagclicked");
    assert_eq!(deserialize_script(&workspace).expect("deserialize"), script);
}

#[test]
fn script_without_hat_round_trips() {
    let script = Script {
        hat: None,
        blocks: sample_chain(),
    };
    let workspace = serialize_script(&script).expect("serialize");
    assert_eq!(deserialize_script(&workspace).expect("deserialize"), script);
}

#[test]
fn hat_only_and_empty_scripts() {
    let hat_only = Script {
        hat: Some(
            Block::new("event_whenkeypressed").with_field("KEY_OPTION", "space"),
        ),
        blocks: Vec::new(),
    };
    let workspace = serialize_script(&hat_only).expect("serialize");
    assert_eq!(workspace.len(), 1);
    assert_eq!(deserialize_script(&workspace).expect("deserialize"), hat_only);

    let empty = serialize_script(&Script::default()).expect("serialize");
    assert!(empty.is_empty());
    assert_eq!(deserialize_script(&empty).expect("deserialize"), Script::default());
    assert!(deserialize_blocks(&empty).expect("deserialize").is_empty());
}

#[test]
fn broadcast_statement_is_not_a_hat() {
    let script = Script {
        hat: None,
        blocks: vec![
            Block::new("event_broadcast").with_input("BROADCAST_INPUT", Input::literal("go")),
            Block::new("motion_movesteps").with_input("STEPS", Input::literal("5")),
        ],
    };
    let workspace = serialize_script(&script).expect("serialize");
    assert_eq!(deserialize_script(&workspace).expect("deserialize"), script);
}

#[test]
fn call_mutation_is_carried_both_ways() {
    let mutation: Mutation = serde_json::from_value(json!({
        "tagName": "mutation",
        "children": [],
        "proccode": "jump %s",
        "argumentids": "[\"h\"]",
        "warp": "false"
    }))
    .expect("mutation");
    let blocks = vec![Block::new("procedures_call")
        .with_input("h", Input::literal("3"))
        .with_mutation(mutation.clone())];

    let workspace = serialize_blocks(&blocks).expect("serialize");
    let (_, node) = workspace.first().expect("one node");
    assert_eq!(node.mutation.as_ref(), Some(&mutation));
    assert_eq!(deserialize_blocks(&workspace).expect("deserialize"), blocks);
}

#[test]
fn empty_substack_omits_the_slot() {
    let blocks =
        vec![Block::new("control_forever").with_input("SUBSTACK", Input::substack(vec![]))];
    let workspace = serialize_blocks(&blocks).expect("serialize");
    let (_, node) = workspace.first().expect("one node");
    assert!(!node.inputs.contains_key("SUBSTACK"));
    assert_eq!(
        deserialize_blocks(&workspace).expect("deserialize"),
        vec![Block::new("control_forever")]
    );
}

#[test]
fn deterministic_ids_give_a_stable_document() {
    let mut codec = Codec::with_ids(CodecOptions::default(), SequentialIds::default());
    let workspace = codec
        .serialize_script(&Script {
            hat: Some(Block::new("event_whenflagclicked")),
            blocks: vec![Block::new("control_repeat")
                .with_input("TIMES", Input::literal("3"))
                .with_input(
                    "SUBSTACK",
                    Input::substack(vec![Block::new("motion_turnright")
                        .with_input("DEGREES", Input::literal("15"))]),
                )],
        })
        .expect("serialize");

    assert_eq!(
        serde_json::to_value(&workspace).expect("json"),
        json!({
            "b0": {
                "opcode": "event_whenflagclicked",
                "next": "b1",
                "parent": null,
                "inputs": {},
                "fields": {},
                "shadow": false,
                "topLevel": true,
                "x": 0,
                "y": 0
            },
            "b1": {
                "opcode": "control_repeat",
                "next": null,
                "parent": "b0",
                "inputs": {"TIMES": [1, [10, "3"]], "SUBSTACK": [2, "b2"]},
                "fields": {},
                "shadow": false,
                "topLevel": false
            },
            "b2": {
                "opcode": "motion_turnright",
                "next": null,
                "parent": "b1",
                "inputs": {"DEGREES": [1, [10, "15"]]},
                "fields": {},
                "shadow": false,
                "topLevel": false
            }
        })
    );
}

#[test]
fn canvas_origin_and_substack_prefix_are_configurable() {
    let options: CodecOptions = serde_json::from_value(json!({
        "substack_prefix": "BODY",
        "canvas_origin": {"x": 120, "y": -40.5}
    }))
    .expect("options");
    let mut codec = Codec::with_ids(options, SequentialIds::new("n"));

    let blocks = vec![Block::new("custom_loop").with_input(
        "BODY",
        Input::substack(vec![
            Block::new("motion_movesteps").with_input("STEPS", Input::literal("1"))
        ]),
    )];
    let workspace = codec.serialize_blocks(&blocks).expect("serialize");
    assert_eq!(workspace["n0"].x, Some(120.0));
    assert_eq!(workspace["n0"].y, Some(-40.5));
    assert_eq!(codec.deserialize_blocks(&workspace).expect("deserialize"), blocks);
}
