use fuse_sb3_contracts::{BLOCK_ID_ALPHABET, BLOCK_ID_LEN};

use crate::error::{CodecError, CodecErrorKind};

/// Allocates node ids for the serializer.
pub trait IdSource {
    fn next_id(&mut self) -> Result<String, CodecError>;
}

/// Uniformly random 20-symbol ids over the 87-symbol alphabet, drawn from OS
/// entropy. Not a cryptographic primitive; ids only address nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl RandomIds {
    pub fn new() -> Self {
        RandomIds
    }
}

// Largest multiple of the alphabet size that fits in a byte; bytes at or above
// it are rejected so every symbol stays equally likely.
const REJECT_FROM: u8 = (256 / BLOCK_ID_ALPHABET.len() * BLOCK_ID_ALPHABET.len()) as u8;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> Result<String, CodecError> {
        let mut out = String::with_capacity(BLOCK_ID_LEN);
        let mut buf = [0u8; 32];
        while out.len() < BLOCK_ID_LEN {
            getrandom::getrandom(&mut buf).map_err(|e| {
                CodecError::new(CodecErrorKind::Entropy, format!("getrandom: {e}"))
            })?;
            for &b in buf.iter().filter(|&&b| b < REJECT_FROM) {
                if out.len() == BLOCK_ID_LEN {
                    break;
                }
                out.push(BLOCK_ID_ALPHABET[b as usize % BLOCK_ID_ALPHABET.len()] as char);
            }
        }
        Ok(out)
    }
}

/// Deterministic `<prefix><n>` ids for reproducible output.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIds {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds::new("b")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> Result<String, CodecError> {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        Ok(id)
    }
}

/// One fresh random id.
pub fn uid() -> Result<String, CodecError> {
    RandomIds.next_id()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn random_ids_use_the_alphabet_and_length() {
        let mut ids = RandomIds::new();
        for _ in 0..64 {
            let id = ids.next_id().expect("id");
            assert_eq!(id.len(), BLOCK_ID_LEN);
            assert!(id.bytes().all(|b| BLOCK_ID_ALPHABET.contains(&b)), "{id}");
        }
    }

    #[test]
    fn random_ids_do_not_repeat() {
        let mut ids = RandomIds::new();
        let seen: HashSet<String> = (0..1000).map(|_| ids.next_id().expect("id")).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.next_id().expect("id"), "n0");
        assert_eq!(ids.next_id().expect("id"), "n1");
    }
}
