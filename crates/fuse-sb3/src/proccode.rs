use crate::ir::ParamType;

/// Argument types of a procedure, in order, read from its proccode template.
///
/// `%s` is an `any` argument and `%b` a boolean one. A placeholder directly
/// preceded by `%` (`%%s`, `%%b`) is escaped text, not an argument.
pub fn parse_proccode_argument_types(proccode: &str) -> Vec<ParamType> {
    let bytes = proccode.as_bytes();
    let mut types = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' && (i == 0 || bytes[i - 1] != b'%') {
            let ty = match bytes[i + 1] {
                b's' => Some(ParamType::Any),
                b'b' => Some(ParamType::Bool),
                _ => None,
            };
            if let Some(ty) = ty {
                types.push(ty);
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    types
}
