//! Error types for AppleDouble encoding

use thiserror::Error;

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an attribute set cannot be encoded.
///
/// All of these are detected before the output buffer is allocated.
#[derive(Error, Debug)]
pub enum Error {
    /// Attribute name is empty, contains a NUL byte, or does not fit the
    /// one-byte name length field.
    #[error("Invalid attribute name {name:?}: {reason}")]
    InvalidAttributeName { name: String, reason: &'static str },

    /// More attributes than the two-byte count field can represent.
    #[error("Too many attributes: {0}, at most {max} are supported", max = u16::MAX)]
    AttributeCountOverflow(usize),

    /// The same attribute name was supplied more than once.
    #[error("Duplicate attribute name: {0:?}")]
    DuplicateAttributeName(String),

    /// Encoded file would not be addressable with 32-bit offsets.
    #[error("Encoded file length {0} exceeds the 32-bit offset range")]
    FileTooLarge(u64),

    /// Fixed-layout structure could not be serialized.
    #[error("Packing error: {0}")]
    Pack(#[from] deku::DekuError),
}
