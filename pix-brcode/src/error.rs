//! Error types for Pix BR Code operations

use serde::Serialize;
use thiserror::Error;

/// Result type alias for BR Code operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// User-supplied key or amount rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Payload construction failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A pasted BR Code failed structural or checksum validation
    #[error(transparent)]
    BrCode(#[from] BrCodeError),

    /// Rendering the BR Code to an image failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Rejections of user input. Always recoverable by asking the user again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No amount was typed
    #[error("Empty amount")]
    EmptyAmount,

    /// Amount is not a positive finite number
    #[error("Invalid amount, use a number greater than zero (e.g. 10.50): {0}")]
    InvalidAmount(String),

    /// Amount carries sub-cent precision
    #[error("Amount has too many decimal places (max 2): {0}")]
    TooManyDecimalPlaces(String),

    /// No key was typed
    #[error("Empty Pix key")]
    EmptyKey,

    /// E-mail key does not look like local@domain.tld
    #[error("Invalid e-mail key: {0}")]
    InvalidEmail(String),

    /// Random key is not a UUID
    #[error("Invalid random key, expected a UUID: {0}")]
    InvalidRandomKey(String),

    /// CPF has the wrong length or fails its check digits
    #[error("Invalid CPF: {0}")]
    InvalidCpf(String),

    /// CNPJ has the wrong length or fails its check digits
    #[error("Invalid CNPJ: {0}")]
    InvalidCnpj(String),

    /// Phone key is not a Brazilian mobile number
    #[error("Invalid phone key, use +55 DDD 9XXXX-XXXX: {0}")]
    InvalidPhone(String),

    /// Declared as phone but the digits form a valid CPF
    #[error("{0} looks like a CPF, choose the CPF key type")]
    LooksLikeCpf(String),

    /// Auto-detection found more than one valid reading
    #[error("{0} is both a valid CPF and a mobile number, declare the key type")]
    AmbiguousKey(String),

    /// Auto-detection could not match any key type
    #[error("Unrecognized Pix key: {0}")]
    UnrecognizedKey(String),
    /// Transaction id does not fit the additional data template
    #[error("Transaction id too long (max 95 bytes): {0}")]
    TxidTooLong(String),
}

/// Invariant violations inside the encoder.
///
/// Inputs are validated upstream, so these indicate a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Key failed re-validation
    #[error("Invalid Pix key: {0}")]
    InvalidKey(String),

    /// Amount is not finite or not positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Formatted amount exceeds the 13 characters tag 54 allows
    #[error("Amount {0} is too large for a BR Code")]
    AmountTooLarge(String),

    /// A TLV value would need more than two length digits
    #[error("Field {tag} is {len} bytes long, maximum is 99")]
    FieldTooLong {
        /// EMV tag of the overflowing field
        tag: &'static str,
        /// Byte length that was computed
        len: usize,
    },
}

/// What went wrong while walking the TLV structure of a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralFault {
    /// Fewer than four bytes left for a tag and length
    TruncatedHeader,
    /// Length is not two decimal digits
    InvalidLength,
    /// Declared length runs past the end of the input
    ValueOverrun,
    /// CRC field length is not 04
    BadChecksumLength,
    /// Bytes follow the CRC field
    TrailingData,
    /// The input has no CRC field
    MissingChecksum,
}

impl std::fmt::Display for StructuralFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::TruncatedHeader => "truncated tag/length header",
            Self::InvalidLength => "length is not two decimal digits",
            Self::ValueOverrun => "declared length runs past the end",
            Self::BadChecksumLength => "CRC field length must be 04",
            Self::TrailingData => "data after the CRC field",
            Self::MissingChecksum => "no CRC field",
        };
        f.write_str(msg)
    }
}

/// Failures of a pasted BR Code. Never auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrCodeError {
    /// TLV walk failed
    #[error("Malformed BR Code at byte {position}: {fault}")]
    Structural {
        /// Kind of structural failure
        fault: StructuralFault,
        /// Byte offset where it was detected
        position: usize,
    },

    /// CRC field absent or too short to hold four hex digits
    #[error("BR Code has no CRC field (6304)")]
    MissingChecksum,

    /// Recomputed CRC differs from the one in the code
    #[error("Checksum mismatch: expected {expected}, got {got}")]
    Checksum {
        /// CRC recomputed over the payload
        expected: String,
        /// CRC found in the payload
        got: String,
    },

    /// Structurally valid but not a Pix merchant template
    #[error("Not a Pix BR Code: {0}")]
    NotPix(String),

    /// A required field is absent
    #[error("Missing required field: tag {0}")]
    MissingField(&'static str),
}

/// Rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Nothing to render
    #[error("Empty payload, nothing to render")]
    EmptyPayload,

    /// QR matrix could not be built
    #[error("QR generation failed: {0}")]
    Qr(String),

    /// Image could not be encoded
    #[error("Image encoding failed: {0}")]
    Image(String),
}
