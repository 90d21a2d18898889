//! Payment requests and the merchant parameters that accompany them

use serde::Serialize;

use crate::{amount, key, KeyType, PixKey, ValidationError, MAX_DYNAMIC_TXID_LEN};

/// Default merchant name when none is configured
pub const DEFAULT_MERCHANT_NAME: &str = "BOT PIX";

/// Default merchant city when none is configured
pub const DEFAULT_MERCHANT_CITY: &str = "IRECE";

/// Default description placed in tag 26-02
pub const DEFAULT_DESCRIPTION: &str = "Pagamento via Discord";

/// Merchant parameters shared by every payload a deployment generates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchantConfig {
    /// Receiver name (tag 59)
    pub merchant_name: String,
    /// Receiver city (tag 60)
    pub merchant_city: String,
    /// Optional description (tag 26-02)
    pub description: Option<String>,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            merchant_city: DEFAULT_MERCHANT_CITY.to_string(),
            description: Some(DEFAULT_DESCRIPTION.to_string()),
        }
    }
}

/// Everything the encoder needs to produce one BR Code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadRequest {
    /// Validated receiver key
    pub key: PixKey,
    /// Amount in BRL
    pub amount: f64,
    /// Receiver name, trimmed to 25 bytes on encode
    pub merchant_name: String,
    /// Receiver city, uppercased and trimmed to 15 bytes on encode
    pub merchant_city: String,
    /// Transaction id; empty means "no id"
    pub txid: String,
    /// Optional description, trimmed to 25 bytes on encode
    pub description: Option<String>,
    /// Static (`11`) or dynamic (`12`) point of initiation
    pub is_static: bool,
}

impl PayloadRequest {
    /// Start a builder with the two fields every request needs
    pub fn builder(key: PixKey, amount: f64) -> PayloadRequestBuilder {
        PayloadRequestBuilder::new(key, amount)
    }
}

/// Builder for [`PayloadRequest`]
#[derive(Debug, Clone)]
pub struct PayloadRequestBuilder {
    key: PixKey,
    amount: f64,
    merchant: MerchantConfig,
    txid: String,
    is_static: bool,
}

impl PayloadRequestBuilder {
    /// Static request with default merchant parameters and no txid
    pub fn new(key: PixKey, amount: f64) -> Self {
        Self {
            key,
            amount,
            merchant: MerchantConfig::default(),
            txid: String::new(),
            is_static: true,
        }
    }

    /// Take name, city and description from a merchant config
    pub fn merchant(mut self, merchant: &MerchantConfig) -> Self {
        self.merchant = merchant.clone();
        self
    }

    /// Set the receiver name
    pub fn merchant_name(mut self, name: impl Into<String>) -> Self {
        self.merchant.merchant_name = name.into();
        self
    }

    /// Set the receiver city
    pub fn merchant_city(mut self, city: impl Into<String>) -> Self {
        self.merchant.merchant_city = city.into();
        self
    }

    /// Set the transaction id
    pub fn txid(mut self, txid: impl Into<String>) -> Self {
        self.txid = txid.into();
        self
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.merchant.description = Some(desc.into());
        self
    }

    /// Drop the description
    pub fn no_description(mut self) -> Self {
        self.merchant.description = None;
        self
    }

    /// Mark the code as dynamic (`12`)
    pub fn dynamic(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Build the request
    pub fn build(self) -> PayloadRequest {
        PayloadRequest {
            key: self.key,
            amount: self.amount,
            merchant_name: self.merchant.merchant_name,
            merchant_city: self.merchant.merchant_city,
            txid: self.txid,
            description: self.merchant.description,
            is_static: self.is_static,
        }
    }
}

/// Raw user input, as collected by any front end (form, command, CLI).
///
/// Front ends fill this and hand it over; nothing downstream cares how it
/// was collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixRequestInput {
    /// Key type the user picked, `None` for auto-detection
    pub key_type_hint: Option<KeyType>,
    /// Amount as typed
    pub raw_amount: String,
    /// Key as typed
    pub raw_key: String,
}

impl PixRequestInput {
    /// Validate the raw fields and produce a static request.
    pub fn into_request(
        self,
        merchant: &MerchantConfig,
        txid: impl Into<String>,
    ) -> Result<PayloadRequest, ValidationError> {
        let amount = amount::parse_amount(&self.raw_amount)?;
        let key = key::classify(&self.raw_key, self.key_type_hint)?;

        Ok(PayloadRequest::builder(key, amount)
            .merchant(merchant)
            .txid(txid)
            .build())
    }

    /// Like [`into_request`](Self::into_request), for a single-use code.
    ///
    /// The txid is kept whole, so it must fit the additional data template.
    pub fn into_dynamic_request(
        self,
        merchant: &MerchantConfig,
        txid: impl Into<String>,
    ) -> Result<PayloadRequest, ValidationError> {
        let txid = txid.into();
        if txid.len() > MAX_DYNAMIC_TXID_LEN {
            return Err(ValidationError::TxidTooLong(txid));
        }

        let mut request = self.into_request(merchant, txid)?;
        request.is_static = false;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_key() -> PixKey {
        PixKey::Email("test@example.com".to_string())
    }

    #[test]
    fn test_builder_defaults() {
        let request = PayloadRequest::builder(email_key(), 10.0).build();
        assert_eq!(request.merchant_name, DEFAULT_MERCHANT_NAME);
        assert_eq!(request.merchant_city, DEFAULT_MERCHANT_CITY);
        assert_eq!(request.description.as_deref(), Some(DEFAULT_DESCRIPTION));
        assert!(request.txid.is_empty());
        assert!(request.is_static);
    }

    #[test]
    fn test_builder_overrides() {
        let request = PayloadRequest::builder(email_key(), 10.0)
            .merchant_name("LOJA")
            .merchant_city("Recife")
            .txid("ABC")
            .no_description()
            .dynamic()
            .build();
        assert_eq!(request.merchant_name, "LOJA");
        assert_eq!(request.merchant_city, "Recife");
        assert_eq!(request.txid, "ABC");
        assert_eq!(request.description, None);
        assert!(!request.is_static);
    }

    #[test]
    fn test_input_into_request() {
        let input = PixRequestInput {
            key_type_hint: None,
            raw_amount: "10,50".to_string(),
            raw_key: "(11) 99999-8888".to_string(),
        };
        let request = input
            .into_request(&MerchantConfig::default(), "TX1")
            .unwrap();
        assert_eq!(request.amount, 10.5);
        assert_eq!(request.key, PixKey::Phone("+5511999998888".to_string()));
        assert_eq!(request.txid, "TX1");
    }

    #[test]
    fn test_dynamic_request() {
        let input = PixRequestInput {
            key_type_hint: Some(KeyType::Email),
            raw_amount: "5".to_string(),
            raw_key: "a@b.co".to_string(),
        };

        let request = input
            .clone()
            .into_dynamic_request(&MerchantConfig::default(), "T".repeat(95))
            .unwrap();
        assert!(!request.is_static);
        assert!(request.encode().is_ok());

        assert!(matches!(
            input.into_dynamic_request(&MerchantConfig::default(), "T".repeat(96)),
            Err(ValidationError::TxidTooLong(_))
        ));
    }

    #[test]
    fn test_input_rejections() {
        let bad_amount = PixRequestInput {
            key_type_hint: Some(KeyType::Email),
            raw_amount: "10.555".to_string(),
            raw_key: "a@b.co".to_string(),
        };
        assert!(matches!(
            bad_amount.into_request(&MerchantConfig::default(), ""),
            Err(ValidationError::TooManyDecimalPlaces(_))
        ));

        let bad_key = PixRequestInput {
            key_type_hint: Some(KeyType::Cpf),
            raw_amount: "1".to_string(),
            raw_key: "52998224726".to_string(),
        };
        assert!(matches!(
            bad_key.into_request(&MerchantConfig::default(), ""),
            Err(ValidationError::InvalidCpf(_))
        ));
    }
}
