use crate::error::CodecError;
use crate::wire::{InputPayload, WireInput, Workspace};

/// Every dangling reference in the workspace, in document order: `next`,
/// then `parent`, then each input's block ids. Whether `next` and `parent`
/// agree with each other is not checked.
pub fn check_workspace(workspace: &Workspace) -> Vec<CodecError> {
    let mut errors = Vec::new();
    let mut check = |from: &str, slot: &str, target: Option<&str>| {
        if let Some(target) = target {
            if !workspace.contains_key(target) {
                errors.push(CodecError::missing_reference(Some(from), slot, target));
            }
        }
    };

    for (id, block) in workspace {
        check(id, "next", block.next.as_deref());
        check(id, "parent", block.parent.as_deref());
        for (key, input) in &block.inputs {
            check(id, key, input.block_ref());
            if let WireInput::Shadowed(_, Some(InputPayload::Block(shadow))) = input {
                check(id, key, Some(shadow));
            }
        }
    }
    errors
}

/// Fail-fast form of [`check_workspace`].
pub fn validate_workspace(workspace: &Workspace) -> Result<(), CodecError> {
    match check_workspace(workspace).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
