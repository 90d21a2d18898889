//! # Pix BR Code
//!
//! This crate builds and checks the "copy and paste" codes used by Pix, the
//! Brazilian instant payment system. A BR Code is an EMV Merchant Presented
//! Mode payload: a flat run of TLV fields closed by a CRC-16 checksum.
//!
//! ## Overview
//!
//! - [`classify_and_normalize_key`] validates a receiver key (phone, CPF,
//!   CNPJ, e-mail or random key) and brings it to canonical form.
//! - [`generate_txid`] produces a short transaction id.
//! - [`encode_pix_payload`] turns a [`PayloadRequest`] into the final string.
//! - [`validate_pasted_code`] checks text pasted by a user, and
//!   [`decode_brcode`] reads the fields back out of a valid code.
//!
//! ## Payload Format
//!
//! ```text
//! 00 02 01                     payload format indicator
//! 01 02 11                     point of initiation (11 static, 12 dynamic)
//! 26 LL 00 14 br.gov.bcb.pix   merchant account: GUI, key, description
//!       01 LL <key>
//! 52 04 0000                   merchant category code
//! 53 03 986                    currency (BRL)
//! 54 LL <amount>               amount with two fraction digits
//! 58 02 BR                     country
//! 59 LL <name>                 merchant name
//! 60 LL <city>                 merchant city
//! 62 LL 05 LL <txid>           additional data, txid or ***
//! 63 04 <crc>                  CRC-16/CCITT-FALSE over everything before it
//! ```
//!
//! Lengths count UTF-8 bytes. Every function here is pure apart from the
//! clock and RNG reads in [`generate_txid`].

mod amount;
mod brcode;
mod crc;
mod decode;
mod error;
mod key;
mod payload;
mod qr;
mod request;
mod tlv;
mod txid;

pub use amount::{format_amount, format_brl, parse_amount, validate_amount};
pub use brcode::{
    check_crc, check_structure, sanitize, validate_pasted_code, CrcCheck, ValidationReport,
};
pub use crc::{crc16, crc16_hex};
pub use decode::{decode_brcode, DecodedBrCode};
pub use error::{
    BrCodeError, EncodeError, Error, RenderError, Result, StructuralFault, ValidationError,
};
pub use key::{
    classify, is_brazil_cellphone_digits_national, is_brazil_cellphone_digits_strict,
    is_valid_cnpj, is_valid_cpf, normalize_phone_if_needed, only_digits, KeyType, PixKey,
    MAX_EMAIL_LEN,
};
pub use payload::{encode, sanitize_city, sanitize_name};
pub use qr::{BrCodeRenderer, QrFormat, QrOptions};
#[cfg(feature = "qrcode")]
pub use qr::QrRenderer;
pub use request::{
    MerchantConfig, PayloadRequest, PayloadRequestBuilder, PixRequestInput,
    DEFAULT_DESCRIPTION, DEFAULT_MERCHANT_CITY, DEFAULT_MERCHANT_NAME,
};
pub use tlv::{encode_field, truncate_bytes, PixField, TlvReader, MAX_VALUE_LEN};
pub use txid::{generate_txid, generate_txid_with};

/// Globally unique identifier of the Pix arrangement (tag 26-00)
pub const PIX_GUI: &str = "br.gov.bcb.pix";

/// Payload format indicator (tag 00)
pub const PAYLOAD_FORMAT: &str = "01";

/// Point of initiation for reusable codes (tag 01)
pub const POI_STATIC: &str = "11";

/// Point of initiation for single-use codes (tag 01)
pub const POI_DYNAMIC: &str = "12";

/// Merchant category code (tag 52), not informed
pub const DEFAULT_CATEGORY_CODE: &str = "0000";

/// ISO 4217 numeric code for BRL (tag 53)
pub const CURRENCY_BRL: &str = "986";

/// Country code (tag 58)
pub const COUNTRY_CODE: &str = "BR";

/// Tag and length of the CRC field; the checksum covers these four bytes too
pub const CRC_FIELD_HEADER: &str = "6304";

/// Txid placeholder when no id is given
pub const NO_TXID: &str = "***";

/// Maximum merchant name length in bytes
pub const MAX_NAME_LEN: usize = 25;

/// Maximum merchant city length in bytes
pub const MAX_CITY_LEN: usize = 15;

/// Maximum description length in bytes
pub const MAX_DESCRIPTION_LEN: usize = 25;

/// Maximum txid length for static codes
pub const MAX_TXID_LEN: usize = 25;

/// Maximum txid length for dynamic codes, what template 62 can carry
pub const MAX_DYNAMIC_TXID_LEN: usize = 95;

/// Maximum amount length (tag 54)
pub const MAX_AMOUNT_LEN: usize = 13;

/// Encode a request into a checksummed BR Code.
pub fn encode_pix_payload(request: &PayloadRequest) -> Result<String> {
    Ok(payload::encode(request)?)
}

/// Validate and normalize a raw key, optionally constrained to one kind.
pub fn classify_and_normalize_key(raw: &str, declared: Option<KeyType>) -> Result<PixKey> {
    Ok(key::classify(raw, declared)?)
}
