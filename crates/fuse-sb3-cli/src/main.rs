use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use fuse_sb3::ir::{Block, CompiledFunction, CompiledFunctionWithDefault, Script};
use fuse_sb3::target::Target;
use fuse_sb3::uid::{IdSource, RandomIds, SequentialIds};
use fuse_sb3::wire::{parse_workspace_json, Workspace};
use fuse_sb3::{
    check_workspace, merge_workspaces, Codec, CodecError, CodecErrorKind, CodecOptions,
};
use fuse_sb3_contracts::{
    FUSE_SB3_OPTIONS_SCHEMA_VERSIONS_SUPPORTED, FUSE_SB3_REPORT_SCHEMA_VERSION,
};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "fuse-sb3")]
#[command(about = "Convert between block IR trees and flat workspace JSON.", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Codec options file (schema_version fuse-sb3.options@0.1.0).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lower an IR document into a workspace.
    Encode {
        #[arg(long)]
        r#in: PathBuf,
        #[arg(long, value_enum)]
        kind: EncodeKind,
        /// Write the workspace into the `blocks` of this target object.
        #[arg(long)]
        target: Option<PathBuf>,
        /// Use `b0`, `b1`, ... ids instead of random ones.
        #[arg(long, default_value_t = false)]
        deterministic_ids: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Raise a workspace into IR.
    Decode {
        #[arg(long)]
        r#in: PathBuf,
        #[arg(long, value_enum)]
        kind: DecodeKind,
        /// The input is a target object; decode its `blocks`.
        #[arg(long, default_value_t = false)]
        target: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report every dangling reference and malformed input tuple. Exits 1 when
    /// any is found.
    Validate {
        #[arg(long)]
        r#in: PathBuf,
        /// The input is a target object; check its `blocks`.
        #[arg(long, default_value_t = false)]
        target: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Union workspaces; on id collisions later inputs win.
    Merge {
        #[arg(long = "in", required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodeKind {
    Blocks,
    Script,
    Function,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DecodeKind {
    Blocks,
    Script,
    Function,
    Scripts,
    Functions,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let env_level = std::env::var("FUSE_SB3_LOG").ok();
    logging::init(logging::level_from(cli.verbose, env_level.as_deref()));

    let options = load_options(cli.config.as_deref())?;
    match cli.command {
        Command::Encode {
            r#in,
            kind,
            target,
            deterministic_ids,
            out,
        } => {
            let input = read_json(&r#in)?;
            let workspace = if deterministic_ids {
                encode(&mut Codec::with_ids(options, SequentialIds::default()), kind, input)
            } else {
                encode(&mut Codec::with_ids(options, RandomIds), kind, input)
            }
            .with_context(|| format!("encode {}", r#in.display()))?;

            match target {
                Some(path) => {
                    let base = Target::from_value(read_json(&path)?)
                        .with_context(|| format!("parse target: {}", path.display()))?;
                    write_json(out.as_deref(), &base.with_blocks(workspace))?;
                }
                None => write_json(out.as_deref(), &workspace)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Decode {
            r#in,
            kind,
            target,
            out,
        } => {
            let workspace = read_workspace(&r#in, target)?;
            let codec = Codec::with_options(options);
            let doc = decode(&codec, kind, &workspace)
                .with_context(|| format!("decode {}", r#in.display()))?;
            write_json(out.as_deref(), &doc)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { r#in, target, out } => {
            let bytes = read_bytes(&r#in)?;
            let errors = match decode_workspace(&bytes, target) {
                Ok(workspace) => check_workspace(&workspace),
                Err(err) if err.kind == CodecErrorKind::MalformedInput => vec![err],
                Err(err) => {
                    return Err(err).with_context(|| format!("parse workspace: {}", r#in.display()))
                }
            };
            let report = Report::new(errors);
            write_json(out.as_deref(), &report)?;
            Ok(if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Merge { inputs, out } => {
            let mut workspaces = Vec::with_capacity(inputs.len());
            for path in &inputs {
                workspaces.push(read_workspace(path, false)?);
            }
            write_json(out.as_deref(), &merge_workspaces(workspaces))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn encode<I: IdSource>(codec: &mut Codec<I>, kind: EncodeKind, input: Value) -> Result<Workspace> {
    let workspace = match kind {
        EncodeKind::Blocks => {
            let blocks: Vec<Block> = serde_json::from_value(input).context("parse block list")?;
            codec.serialize_blocks(&blocks)?
        }
        EncodeKind::Script => {
            let script: Script = serde_json::from_value(input).context("parse script")?;
            codec.serialize_script(&script)?
        }
        EncodeKind::Function if input.get("defaultValues").is_some() => {
            let function: CompiledFunctionWithDefault =
                serde_json::from_value(input).context("parse function")?;
            codec.serialize_function_with_defaults(&function)?
        }
        EncodeKind::Function => {
            let function: CompiledFunction =
                serde_json::from_value(input).context("parse function")?;
            codec.serialize_function(&function)?
        }
    };
    Ok(workspace)
}

fn decode(codec: &Codec, kind: DecodeKind, workspace: &Workspace) -> Result<Value> {
    let doc = match kind {
        DecodeKind::Blocks => serde_json::to_value(codec.deserialize_blocks(workspace)?)?,
        DecodeKind::Script => serde_json::to_value(codec.deserialize_script(workspace)?)?,
        DecodeKind::Function => serde_json::to_value(codec.deserialize_function(workspace)?)?,
        DecodeKind::Scripts => serde_json::to_value(codec.deserialize_all_scripts(workspace)?)?,
        DecodeKind::Functions => {
            serde_json::to_value(codec.deserialize_all_functions(workspace)?)?
        }
    };
    Ok(doc)
}

#[derive(Debug, Serialize)]
struct Report {
    schema_version: &'static str,
    ok: bool,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct Diagnostic {
    code: &'static str,
    #[serde(flatten)]
    error: CodecError,
}

impl Report {
    fn new(errors: Vec<CodecError>) -> Self {
        Report {
            schema_version: FUSE_SB3_REPORT_SCHEMA_VERSION,
            ok: errors.is_empty(),
            diagnostics: errors
                .into_iter()
                .map(|error| Diagnostic {
                    code: error.code(),
                    error,
                })
                .collect(),
        }
    }
}

fn load_options(path: Option<&Path>) -> Result<CodecOptions> {
    let Some(path) = path else {
        return Ok(CodecOptions::default());
    };
    let mut doc = match read_json(path)? {
        Value::Object(map) => map,
        other => anyhow::bail!(
            "options file {} must be a JSON object, got {other}",
            path.display()
        ),
    };
    let schema_version = doc.remove("schema_version");
    let schema_version = schema_version.as_ref().and_then(Value::as_str).map(str::trim);
    if !schema_version.is_some_and(|v| FUSE_SB3_OPTIONS_SCHEMA_VERSIONS_SUPPORTED.contains(&v)) {
        anyhow::bail!(
            "options schema_version mismatch: expected one of {:?} got {:?}",
            FUSE_SB3_OPTIONS_SCHEMA_VERSIONS_SUPPORTED,
            schema_version
        );
    }
    serde_json::from_value(Value::Object(doc))
        .with_context(|| format!("parse options: {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse JSON: {}", path.display()))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read: {}", path.display()))
}

fn decode_workspace(bytes: &[u8], target: bool) -> Result<Workspace, CodecError> {
    if target {
        return Target::from_slice(bytes).map(|t| t.blocks);
    }
    parse_workspace_json(bytes)
}

fn read_workspace(path: &Path, target: bool) -> Result<Workspace> {
    let bytes = read_bytes(path)?;
    decode_workspace(&bytes, target)
        .with_context(|| format!("parse workspace: {}", path.display()))
}

fn write_json<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir: {}", parent.display()))?;
            }
            std::fs::write(path, text.as_bytes())
                .with_context(|| format!("write output: {}", path.display()))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
