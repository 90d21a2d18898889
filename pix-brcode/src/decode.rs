//! Reading the fields back out of a valid BR Code

use serde::Serialize;
use std::str::FromStr;

use crate::brcode::validate_pasted_code;
use crate::tlv::{PixField, TlvReader};
use crate::{key, BrCodeError, Error, KeyType, Result, PAYLOAD_FORMAT, PIX_GUI, POI_DYNAMIC, POI_STATIC};

/// Fields of a decoded Pix BR Code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedBrCode {
    /// `11` static, `12` dynamic
    pub is_static: bool,
    /// Pix key exactly as carried in the code
    pub key: String,
    /// Description sub-field, if any
    pub description: Option<String>,
    /// Amount, absent when the payer chooses it
    pub amount: Option<f64>,
    /// Receiver name
    pub merchant_name: String,
    /// Receiver city
    pub merchant_city: String,
    /// Transaction id, absent when the code carries the `***` placeholder or none
    pub txid: Option<String>,
    /// CRC field value
    pub crc: String,
}

impl DecodedBrCode {
    /// Kind of the embedded key, when it matches exactly one kind
    pub fn key_type(&self) -> Option<KeyType> {
        key::classify(&self.key, None).ok().map(|k| k.key_type())
    }
}

impl FromStr for DecodedBrCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        decode_brcode(s)
    }
}

fn text<'a>(field: &PixField<'a>) -> std::result::Result<&'a str, BrCodeError> {
    field.value_str().ok_or_else(|| {
        BrCodeError::NotPix(format!(
            "field {} is not valid UTF-8",
            String::from_utf8_lossy(&field.tag)
        ))
    })
}

/// Tags 26 to 51 hold merchant account templates
fn is_merchant_account_tag(tag: &[u8; 2]) -> bool {
    std::str::from_utf8(tag)
        .ok()
        .and_then(|t| t.parse::<u8>().ok())
        .is_some_and(|n| (26..=51).contains(&n))
}

struct MerchantAccount {
    key: String,
    description: Option<String>,
}

/// Read a merchant account template; `None` when it belongs to another scheme.
fn read_merchant_account(value: &str) -> std::result::Result<Option<MerchantAccount>, BrCodeError> {
    let mut gui = None;
    let mut key = None;
    let mut description = None;

    for sub in TlvReader::new(value.as_bytes()) {
        let sub = sub.map_err(|(fault, _)| {
            BrCodeError::NotPix(format!("malformed merchant account template: {}", fault))
        })?;
        match &sub.tag {
            b"00" => gui = Some(text(&sub)?),
            b"01" => key = Some(text(&sub)?.to_string()),
            b"02" => description = Some(text(&sub)?.to_string()),
            _ => {}
        }
    }

    match gui {
        Some(gui) if gui.eq_ignore_ascii_case(PIX_GUI) => {
            let key = key.ok_or(BrCodeError::MissingField("26-01"))?;
            Ok(Some(MerchantAccount { key, description }))
        }
        _ => Ok(None),
    }
}

fn read_txid(value: &str) -> std::result::Result<Option<String>, BrCodeError> {
    for sub in TlvReader::new(value.as_bytes()) {
        let sub = sub.map_err(|(fault, _)| {
            BrCodeError::NotPix(format!("malformed additional data template: {}", fault))
        })?;
        if sub.is("05") {
            let txid = text(&sub)?;
            return Ok((!txid.is_empty() && txid != crate::NO_TXID).then(|| txid.to_string()));
        }
    }
    Ok(None)
}

/// Amount in plain decimal notation: digits, then at most two fraction digits.
fn read_amount(value: &str) -> std::result::Result<f64, BrCodeError> {
    let invalid = || BrCodeError::NotPix(format!("invalid amount {}", value));

    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || !digits(frac) || frac.len() > 2 {
        return Err(invalid());
    }

    match value.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(invalid()),
    }
}

/// Validate a pasted code and read its fields.
///
/// Fails with the same structural or checksum error [`validate_pasted_code`]
/// reports, or when the code is not a Pix merchant code.
pub fn decode_brcode(raw: &str) -> Result<DecodedBrCode> {
    let code = validate_pasted_code(raw).into_result()?;

    let mut format = None;
    let mut is_static = true;
    let mut account = None;
    let mut amount = None;
    let mut name = None;
    let mut city = None;
    let mut txid = None;
    let mut crc = None;

    for field in TlvReader::new(code.as_bytes()) {
        let field = field.map_err(|(fault, position)| BrCodeError::Structural { fault, position })?;
        let value = text(&field)?;

        match &field.tag {
            b"00" => format = Some(value),
            b"01" => {
                is_static = match value {
                    POI_STATIC => true,
                    POI_DYNAMIC => false,
                    other => {
                        return Err(BrCodeError::NotPix(format!(
                            "unknown point of initiation {}",
                            other
                        ))
                        .into())
                    }
                }
            }
            b"54" => amount = Some(read_amount(value)?),
            b"59" => name = Some(value.to_string()),
            b"60" => city = Some(value.to_string()),
            b"62" => txid = read_txid(value)?,
            b"63" => crc = Some(value.to_string()),
            tag if account.is_none() && is_merchant_account_tag(tag) => {
                account = read_merchant_account(value)?;
            }
            _ => {}
        }
    }

    if format != Some(PAYLOAD_FORMAT) {
        return Err(BrCodeError::NotPix("payload format indicator must be 01".to_string()).into());
    }
    let account = account.ok_or(BrCodeError::MissingField("26"))?;

    Ok(DecodedBrCode {
        is_static,
        key: account.key,
        description: account.description,
        amount,
        merchant_name: name.ok_or(BrCodeError::MissingField("59"))?,
        merchant_city: city.ok_or(BrCodeError::MissingField("60"))?,
        txid,
        crc: crc.ok_or(BrCodeError::MissingField("63"))?,
    })
}
