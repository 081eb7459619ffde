use affilink_core::ShortCode;
use nanoid::nanoid;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// collisions are detected by the store's unique index and retried by the
/// caller.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> ShortCode;
}

/// Random codes over the nanoid URL-safe alphabet (`A-Za-z0-9_-`).
#[derive(Debug, Clone, Copy)]
pub struct NanoidGenerator {
    length: usize,
}

impl NanoidGenerator {
    pub const DEFAULT_LENGTH: usize = 8;

    /// `length` is clamped to the valid short code range of 3..=32.
    pub fn with_length(length: usize) -> Self {
        Self {
            length: length.clamp(3, 32),
        }
    }
}

impl Default for NanoidGenerator {
    fn default() -> Self {
        Self::with_length(Self::DEFAULT_LENGTH)
    }
}

impl Generator for NanoidGenerator {
    fn generate(&self) -> ShortCode {
        let length = self.length;
        ShortCode::new_unchecked(nanoid!(length))
    }
}
