//! Validation of pasted BR Codes
//!
//! Text copied out of banking apps and chat clients picks up invisible
//! characters and line breaks. Validation runs in three steps:
//!
//! 1. [`sanitize`] removes BOM, zero-width characters, CR/LF/TAB and outer
//!    whitespace. Inner spaces are payload bytes and are kept.
//! 2. [`check_structure`] walks the TLV fields once and requires a final
//!    `63` field of length `04`.
//! 3. [`check_crc`] recomputes the CRC up to the last `6304` and compares it
//!    with the four characters that follow.
//!
//! A failing code is reported, never repaired.

use serde::Serialize;

use crate::crc::crc16_hex;
use crate::tlv::TlvReader;
use crate::{BrCodeError, StructuralFault, CRC_FIELD_HEADER};

/// Outcome of [`check_crc`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrcCheck {
    /// Whether the recomputed CRC matches
    pub ok: bool,
    /// CRC recomputed over the payload, absent when no CRC field was found
    pub expected: Option<String>,
    /// CRC carried by the payload, uppercased
    pub got: Option<String>,
}

/// Outcome of [`validate_pasted_code`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Input after sanitization
    pub sanitized: String,
    /// Whether the TLV walk succeeded
    pub structurally_valid: bool,
    /// First structural problem and its byte offset
    pub structural_error: Option<(StructuralFault, usize)>,
    /// Whether the CRC matches
    pub checksum_valid: bool,
    /// CRC recomputed over the payload
    pub expected_checksum: Option<String>,
    /// CRC found in the payload
    pub got_checksum: Option<String>,
}

impl ValidationReport {
    /// Both checks passed
    pub fn is_valid(&self) -> bool {
        self.structurally_valid && self.checksum_valid
    }

    /// Turn the report into the sanitized code or the first failure.
    ///
    /// Structural failures take precedence over checksum failures.
    pub fn into_result(self) -> Result<String, BrCodeError> {
        if let Some((fault, position)) = self.structural_error {
            return Err(BrCodeError::Structural { fault, position });
        }
        if !self.checksum_valid {
            return match (self.expected_checksum, self.got_checksum) {
                (Some(expected), Some(got)) => Err(BrCodeError::Checksum { expected, got }),
                _ => Err(BrCodeError::MissingChecksum),
            };
        }
        Ok(self.sanitized)
    }
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\r' | '\n' | '\t'
    )
}

/// Remove characters that copy/paste introduces without touching inner spaces.
pub fn sanitize(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !is_invisible(*c)).collect();
    cleaned.trim().to_string()
}

/// Walk the TLV structure of an already sanitized code.
///
/// On failure returns the fault and the byte offset where it was detected.
pub fn check_structure(code: &str) -> Result<(), (StructuralFault, usize)> {
    let bytes = code.as_bytes();
    let mut reader = TlvReader::new(bytes);

    while let Some(field) = reader.next() {
        let field = field?;
        if field.is("63") {
            if field.value.len() != 4 {
                return Err((StructuralFault::BadChecksumLength, field.offset));
            }
            if reader.position() != bytes.len() {
                return Err((StructuralFault::TrailingData, reader.position()));
            }
            return Ok(());
        }
    }

    Err((StructuralFault::MissingChecksum, bytes.len()))
}

/// Recompute the CRC of an already sanitized code.
pub fn check_crc(code: &str) -> CrcCheck {
    let missing = CrcCheck {
        ok: false,
        expected: None,
        got: None,
    };

    let idx = match code.rfind(CRC_FIELD_HEADER) {
        Some(idx) => idx,
        None => return missing,
    };
    let covered_end = idx + CRC_FIELD_HEADER.len();
    if code.len() < covered_end + 4 {
        return missing;
    }

    let bytes = code.as_bytes();
    let expected = crc16_hex(&bytes[..covered_end]);
    let got = String::from_utf8_lossy(&bytes[covered_end..covered_end + 4]).to_uppercase();

    CrcCheck {
        ok: expected == got,
        expected: Some(expected),
        got: Some(got),
    }
}

/// Sanitize raw text and run both checks independently.
pub fn validate_pasted_code(raw: &str) -> ValidationReport {
    let sanitized = sanitize(raw);
    let structure = check_structure(&sanitized);
    let crc = check_crc(&sanitized);

    ValidationReport {
        structurally_valid: structure.is_ok(),
        structural_error: structure.err(),
        checksum_valid: crc.ok,
        expected_checksum: crc.expected,
        got_checksum: crc.got,
        sanitized,
    }
}
