/// Character set for generating short codes.
pub const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Shortest code length the generator may be configured for.
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest code length; matches the width of the `short_code` column.
pub const MAX_CODE_LENGTH: usize = 16;

/// Random fixed-length code source.
///
/// Candidates come from nanoid's OS-seeded generator, so instances never
/// coordinate. Uniqueness is decided by the mapping store.
#[derive(Debug, Clone, Copy)]
pub struct ShortCodeGenerator {
    length: usize,
}

impl ShortCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Draw a new candidate code.
    pub fn generate(&self) -> String {
        let length = self.length;
        nanoid::nanoid!(length, ALPHABET_CHARS)
    }

    /// Whether `code` could have been issued under any allowed length.
    ///
    /// Codes minted before a length change keep resolving, so this checks
    /// the configurable bounds rather than the current length.
    pub fn is_well_formed(&self, code: &str) -> bool {
        (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
            && code.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
