//! BR Code payload encoding
//!
//! ## Field Order
//!
//! | Tag | Content                                   |
//! |-----|-------------------------------------------|
//! | 00  | Payload format indicator, `01`            |
//! | 01  | Point of initiation, `11` / `12`          |
//! | 26  | Merchant account: GUI, key, description   |
//! | 52  | Merchant category code, `0000`            |
//! | 53  | Currency, `986` (BRL)                     |
//! | 54  | Amount, two fraction digits               |
//! | 58  | Country, `BR`                             |
//! | 59  | Merchant name, at most 25 bytes           |
//! | 60  | Merchant city, uppercase, at most 15 bytes|
//! | 62  | Additional data: txid in sub-field 05     |
//! | 63  | CRC-16, four uppercase hex digits         |
//!
//! The CRC covers every byte before it, including the `6304` header of the
//! CRC field itself.

use crate::amount::format_amount;
use crate::crc::crc16_hex;
use crate::tlv::{encode_field, truncate_bytes, MAX_VALUE_LEN};
use crate::{
    EncodeError, PayloadRequest, COUNTRY_CODE, CRC_FIELD_HEADER, CURRENCY_BRL,
    DEFAULT_CATEGORY_CODE, MAX_AMOUNT_LEN, MAX_CITY_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN,
    MAX_TXID_LEN, NO_TXID, PAYLOAD_FORMAT, PIX_GUI, POI_DYNAMIC, POI_STATIC,
};

/// Fallback when the merchant name is blank
const FALLBACK_NAME: &str = "RECEBEDOR";

/// Fallback when the merchant city is blank
const FALLBACK_CITY: &str = "CIDADE";

/// Room left for the description once GUI and key sit in template 26.
fn description_budget(key: &str) -> usize {
    let used = 4 + PIX_GUI.len() + 4 + key.len() + 4;
    MAX_VALUE_LEN.saturating_sub(used).min(MAX_DESCRIPTION_LEN)
}

/// Merchant name limited to 25 UTF-8 bytes.
pub fn sanitize_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { FALLBACK_NAME } else { name };
    truncate_bytes(name, MAX_NAME_LEN).to_string()
}

/// Merchant city uppercased, then limited to 15 UTF-8 bytes.
pub fn sanitize_city(city: &str) -> String {
    let city = city.trim();
    let city = if city.is_empty() {
        FALLBACK_CITY.to_string()
    } else {
        city.to_uppercase()
    };
    truncate_bytes(&city, MAX_CITY_LEN).to_string()
}

/// Build the complete, checksummed BR Code for a request.
pub fn encode(request: &PayloadRequest) -> Result<String, EncodeError> {
    request
        .key
        .revalidate()
        .map_err(|e| EncodeError::InvalidKey(e.to_string()))?;

    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(EncodeError::InvalidAmount(request.amount.to_string()));
    }
    let amount = format_amount(request.amount);
    if amount.len() > MAX_AMOUNT_LEN {
        return Err(EncodeError::AmountTooLarge(amount));
    }

    let name = sanitize_name(&request.merchant_name);
    let city = sanitize_city(&request.merchant_city);

    let (poi, txid) = if request.is_static {
        (POI_STATIC, truncate_bytes(&request.txid, MAX_TXID_LEN))
    } else {
        (POI_DYNAMIC, request.txid.as_str())
    };
    let txid = if txid.is_empty() { NO_TXID } else { txid };

    let mut account = encode_field("00", PIX_GUI)?;
    account.push_str(&encode_field("01", request.key.as_str())?);
    // The key wins over the description when both do not fit
    let budget = description_budget(request.key.as_str());
    if let Some(desc) = request.description.as_deref() {
        let desc = truncate_bytes(desc, budget);
        if !desc.is_empty() {
            account.push_str(&encode_field("02", desc)?);
        }
    }

    let additional = encode_field("05", txid)?;

    let fields = [
        encode_field("00", PAYLOAD_FORMAT)?,
        encode_field("01", poi)?,
        encode_field("26", &account)?,
        encode_field("52", DEFAULT_CATEGORY_CODE)?,
        encode_field("53", CURRENCY_BRL)?,
        encode_field("54", &amount)?,
        encode_field("58", COUNTRY_CODE)?,
        encode_field("59", &name)?,
        encode_field("60", &city)?,
        encode_field("62", &additional)?,
    ];

    let mut payload: String = fields.concat();
    payload.push_str(CRC_FIELD_HEADER);
    let crc = crc16_hex(payload.as_bytes());
    payload.push_str(&crc);

    Ok(payload)
}

impl PayloadRequest {
    /// Encode this request, see [`encode`]
    pub fn encode(&self) -> Result<String, EncodeError> {
        encode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixKey;

    fn request() -> PayloadRequest {
        PayloadRequest::builder(PixKey::Email("test@example.com".to_string()), 10.0)
            .merchant_name("TEST")
            .merchant_city("BRASILIA")
            .txid("ABC123")
            .no_description()
            .build()
    }

    #[test]
    fn test_known_payload() {
        assert_eq!(
            encode(&request()).unwrap(),
            "00020101021126380014br.gov.bcb.pix0116test@example.com\
             520400005303986540510.005802BR5904TEST6008BRASILIA\
             62100506ABC12363040E66"
        );
    }

    #[test]
    fn test_description_and_placeholder_txid() {
        let request = PayloadRequest::builder(PixKey::Phone("+5511999998888".to_string()), 25.5)
            .merchant_name("LOJA DO ZE")
            .merchant_city("Sao Paulo")
            .description("Pagamento via Discord")
            .build();
        assert_eq!(
            encode(&request).unwrap(),
            "00020101021126610014br.gov.bcb.pix0114+55119999988880221Pagamento via Discord\
             520400005303986540525.505802BR5910LOJA DO ZE6009SAO PAULO\
             62070503***63045D30"
        );
    }

    #[test]
    fn test_dynamic_point_of_initiation() {
        let mut req = request();
        req.is_static = false;
        req.txid = "X".repeat(30);
        let payload = encode(&req).unwrap();
        assert!(payload.starts_with("000201010212"));
        assert!(payload.contains(&format!("0530{}", "X".repeat(30))));
    }

    #[test]
    fn test_static_txid_is_truncated() {
        let mut req = request();
        req.txid = "Y".repeat(30);
        let payload = encode(&req).unwrap();
        assert!(payload.contains(&format!("62290525{}6304", "Y".repeat(25))));
    }

    #[test]
    fn test_multibyte_name_and_city() {
        let mut req = request();
        req.merchant_name = "JOSÉ".to_string();
        req.merchant_city = "Brasília".to_string();
        let payload = encode(&req).unwrap();
        assert!(payload.contains("5905JOSÉ"));
        assert!(payload.contains("6009BRASÍLIA"));
        assert!(payload.ends_with("63043264"));
    }

    #[test]
    fn test_sanitizers() {
        assert_eq!(sanitize_name("  "), "RECEBEDOR");
        assert_eq!(sanitize_city(""), "CIDADE");
        assert_eq!(sanitize_city("rio de janeiro - rj"), "RIO DE JANEIRO ");
        // 12 x 'Ã' is 24 bytes, so only 12 fit with one ASCII byte
        assert_eq!(sanitize_name(&format!("A{}", "Ã".repeat(20))).len(), 25);
        assert_eq!(sanitize_city(&"ç".repeat(10)).len(), 14);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut req = request();
        req.amount = 0.0;
        assert!(matches!(encode(&req), Err(EncodeError::InvalidAmount(_))));

        req.amount = f64::NAN;
        assert!(matches!(encode(&req), Err(EncodeError::InvalidAmount(_))));

        req.amount = 1e13;
        assert!(matches!(encode(&req), Err(EncodeError::AmountTooLarge(_))));

        let mut req = request();
        req.key = PixKey::Cpf("123".to_string());
        assert!(matches!(encode(&req), Err(EncodeError::InvalidKey(_))));

        req.key = PixKey::Email(String::new());
        assert!(matches!(encode(&req), Err(EncodeError::InvalidKey(_))));
    }

    #[test]
    fn test_description_yields_to_long_key() {
        // 77 characters, the longest accepted e-mail
        let email = format!("{}@x.io", "a".repeat(72));
        let req = PayloadRequest::builder(PixKey::Email(email.clone()), 1.0)
            .description("Pagamento via Discord")
            .build();
        let payload = encode(&req).unwrap();
        assert!(payload.contains(&format!("26990014br.gov.bcb.pix0177{}5204", email)));

        // 60 characters leaves room for 13 description bytes
        let email = format!("{}@x.io", "b".repeat(55));
        let req = PayloadRequest::builder(PixKey::Email(email.clone()), 1.0)
            .description("Pagamento via Discord")
            .build();
        let payload = encode(&req).unwrap();
        assert!(payload.contains(&format!("0160{}0213Pagamento via5204", email)));
    }

    #[test]
    fn test_additional_data_overflow() {
        let mut req = request();
        req.is_static = false;
        req.txid = "Z".repeat(96);
        assert!(matches!(
            encode(&req),
            Err(EncodeError::FieldTooLong { tag: "62", len: 100 })
        ));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(encode(&request()).unwrap(), encode(&request()).unwrap());
    }
}
