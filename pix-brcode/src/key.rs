//! Pix key classification and normalization
//!
//! A Pix key identifies the recipient. Five kinds exist, each with a
//! canonical form that goes into tag 26-01 of the payload:
//!
//! | Kind   | Canonical form                         |
//! |--------|----------------------------------------|
//! | Phone  | E.164, `+55` followed by 11 digits     |
//! | CPF    | 11 digits                              |
//! | CNPJ   | 14 digits                              |
//! | E-mail | lowercase, at most 77 characters       |
//! | Random | lowercase UUID (EVP key)               |

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest e-mail that still fits tag 26 next to the GUI sub-field
pub const MAX_EMAIL_LEN: usize = 77;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("valid regex")
});

/// The kind of a Pix key, as declared by the user or detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Brazilian mobile number
    Phone,
    /// Individual taxpayer number
    Cpf,
    /// Company taxpayer number
    Cnpj,
    /// E-mail address
    Email,
    /// Random key (EVP), UUID formatted
    Random,
}

impl KeyType {
    /// Label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Self::Phone => "Celular",
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
            Self::Email => "E-mail",
            Self::Random => "EVP",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated Pix key in canonical form.
///
/// Built by [`classify`]; invalid input never produces a `PixKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PixKey {
    /// `+55DDXXXXXXXXX`
    Phone(String),
    /// 11 digits
    Cpf(String),
    /// 14 digits
    Cnpj(String),
    /// lowercase address
    Email(String),
    /// lowercase UUID
    Random(String),
}

impl PixKey {
    /// Kind of this key
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Phone(_) => KeyType::Phone,
            Self::Cpf(_) => KeyType::Cpf,
            Self::Cnpj(_) => KeyType::Cnpj,
            Self::Email(_) => KeyType::Email,
            Self::Random(_) => KeyType::Random,
        }
    }

    /// Canonical string, as embedded in the payload
    pub fn as_str(&self) -> &str {
        match self {
            Self::Phone(s) | Self::Cpf(s) | Self::Cnpj(s) | Self::Email(s) | Self::Random(s) => s,
        }
    }

    /// Run the key back through classification and require it to come out unchanged.
    pub fn revalidate(&self) -> Result<(), ValidationError> {
        let again = classify(self.as_str(), Some(self.key_type()))?;
        if &again != self {
            return Err(ValidationError::UnrecognizedKey(self.as_str().to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Display for PixKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip everything that is not an ASCII digit.
pub fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digit_values(digits: &str) -> Option<Vec<u32>> {
    digits.chars().map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn mod11_check_digit(sum: u32) -> u32 {
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Validate the two CPF check digits.
pub fn is_valid_cpf(digits: &str) -> bool {
    let d = match digit_values(digits) {
        Some(d) if d.len() == 11 => d,
        _ => return false,
    };
    if all_same(&d) {
        return false;
    }

    let first: u32 = d[..9].iter().zip((2..=10).rev()).map(|(x, w)| x * w).sum();
    if mod11_check_digit(first) != d[9] {
        return false;
    }

    let second: u32 = d[..10].iter().zip((2..=11).rev()).map(|(x, w)| x * w).sum();
    mod11_check_digit(second) == d[10]
}

/// Weights run from `len - 7` down to 2, then wrap to 9.
fn cnpj_check_digit(digits: &[u32]) -> u32 {
    let mut weight = digits.len() as u32 - 7;
    let mut sum = 0;
    for d in digits {
        sum += d * weight;
        weight -= 1;
        if weight < 2 {
            weight = 9;
        }
    }
    mod11_check_digit(sum)
}

/// Validate the two CNPJ check digits.
pub fn is_valid_cnpj(digits: &str) -> bool {
    let d = match digit_values(digits) {
        Some(d) if d.len() == 14 => d,
        _ => return false,
    };
    if all_same(&d) {
        return false;
    }

    cnpj_check_digit(&d[..12]) == d[12] && cnpj_check_digit(&d[..13]) == d[13]
}

/// 13 digits with the `55` country code.
pub fn is_brazil_cellphone_digits_strict(digits: &str) -> bool {
    digits.len() == 13 && digits.starts_with("55") && digits.bytes().all(|b| b.is_ascii_digit())
}

/// 11 digits (area code + number) whose third digit is the mobile marker `9`.
pub fn is_brazil_cellphone_digits_national(digits: &str) -> bool {
    digits.len() == 11
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.as_bytes()[2] == b'9'
}

/// Bring a phone number to E.164 when its digits match a known pattern,
/// otherwise return the input unchanged.
pub fn normalize_phone_if_needed(raw: &str) -> String {
    let digits = only_digits(raw);
    if is_brazil_cellphone_digits_strict(&digits) {
        format!("+{}", digits)
    } else if is_brazil_cellphone_digits_national(&digits) {
        format!("+55{}", digits)
    } else {
        raw.to_string()
    }
}

/// Digits plus the punctuation people type around documents and phones.
fn is_numeric_text(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '.' | '-' | '/' | '(' | ')' | '+'))
}

/// Classify and normalize a raw key.
///
/// With `declared` set, only that kind is tried. With `None` the kind is
/// detected; readings that are valid as more than one kind are rejected
/// rather than guessed.
pub fn classify(raw: &str, declared: Option<KeyType>) -> Result<PixKey, ValidationError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }

    match declared {
        Some(KeyType::Email) => classify_email(key),
        Some(KeyType::Random) => classify_random(key),
        Some(KeyType::Cpf) => classify_cpf(key),
        Some(KeyType::Cnpj) => classify_cnpj(key),
        Some(KeyType::Phone) => classify_phone(key),
        None => detect(key),
    }
}

fn classify_email(key: &str) -> Result<PixKey, ValidationError> {
    if key.chars().count() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(key) {
        return Err(ValidationError::InvalidEmail(key.to_string()));
    }
    Ok(PixKey::Email(key.to_lowercase()))
}

fn classify_random(key: &str) -> Result<PixKey, ValidationError> {
    if !UUID_RE.is_match(key) {
        return Err(ValidationError::InvalidRandomKey(key.to_string()));
    }
    Ok(PixKey::Random(key.to_ascii_lowercase()))
}

fn classify_cpf(key: &str) -> Result<PixKey, ValidationError> {
    let digits = only_digits(key);
    if !is_numeric_text(key) || !is_valid_cpf(&digits) {
        return Err(ValidationError::InvalidCpf(key.to_string()));
    }
    Ok(PixKey::Cpf(digits))
}

fn classify_cnpj(key: &str) -> Result<PixKey, ValidationError> {
    let digits = only_digits(key);
    if !is_numeric_text(key) || !is_valid_cnpj(&digits) {
        return Err(ValidationError::InvalidCnpj(key.to_string()));
    }
    Ok(PixKey::Cnpj(digits))
}

fn classify_phone(key: &str) -> Result<PixKey, ValidationError> {
    if !is_numeric_text(key) {
        return Err(ValidationError::InvalidPhone(key.to_string()));
    }

    let digits = only_digits(key);
    if is_brazil_cellphone_digits_national(&digits) && is_valid_cpf(&digits) {
        return Err(ValidationError::LooksLikeCpf(digits));
    }
    if is_brazil_cellphone_digits_strict(&digits) || is_brazil_cellphone_digits_national(&digits) {
        return Ok(PixKey::Phone(normalize_phone_if_needed(&digits)));
    }

    Err(ValidationError::InvalidPhone(key.to_string()))
}

fn detect(key: &str) -> Result<PixKey, ValidationError> {
    if key.contains('@') {
        return classify_email(key);
    }
    if UUID_RE.is_match(key) {
        return classify_random(key);
    }
    if !is_numeric_text(key) {
        return Err(ValidationError::UnrecognizedKey(key.to_string()));
    }
    if key.starts_with('+') {
        return classify_phone(key);
    }

    let digits = only_digits(key);
    match digits.len() {
        11 => {
            let cpf = is_valid_cpf(&digits);
            let mobile = is_brazil_cellphone_digits_national(&digits);
            match (cpf, mobile) {
                (true, true) => Err(ValidationError::AmbiguousKey(digits)),
                (true, false) => Ok(PixKey::Cpf(digits)),
                (false, true) => classify_phone(&digits),
                (false, false) => Err(ValidationError::InvalidCpf(key.to_string())),
            }
        }
        13 if is_brazil_cellphone_digits_strict(&digits) => classify_phone(&digits),
        14 => classify_cnpj(key),
        _ => Err(ValidationError::UnrecognizedKey(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("529.982.247-25"), "52998224725");
        assert_eq!(only_digits("(11) 99999-8888"), "11999998888");
        assert_eq!(only_digits("abc"), "");
    }

    #[test]
    fn test_cpf_check_digits() {
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("52998224726"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("5299822472a"));
    }

    #[test]
    fn test_cnpj_check_digits() {
        assert!(is_valid_cnpj("11444777000161"));
        assert!(!is_valid_cnpj("11444777000162"));
        assert!(!is_valid_cnpj("00000000000000"));
        assert!(!is_valid_cnpj("1144477700016"));
    }

    #[test]
    fn test_phone_patterns() {
        assert!(is_brazil_cellphone_digits_strict("5511999998888"));
        assert!(!is_brazil_cellphone_digits_strict("4411999998888"));
        assert!(is_brazil_cellphone_digits_national("11999998888"));
        assert!(!is_brazil_cellphone_digits_national("11899998888"));
        assert!(!is_brazil_cellphone_digits_national("1199999888"));
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone_if_needed("11999998888"), "+5511999998888");
        assert_eq!(normalize_phone_if_needed("5511999998888"), "+5511999998888");
        assert_eq!(normalize_phone_if_needed("+55 (11) 99999-8888"), "+5511999998888");
        assert_eq!(normalize_phone_if_needed("119999888"), "119999888");
    }

    #[test]
    fn test_declared_types() {
        assert_eq!(
            classify("529.982.247-25", Some(KeyType::Cpf)),
            Ok(PixKey::Cpf("52998224725".to_string()))
        );
        assert_eq!(
            classify("11.444.777/0001-61", Some(KeyType::Cnpj)),
            Ok(PixKey::Cnpj("11444777000161".to_string()))
        );
        assert_eq!(
            classify(" Fulano@Example.COM ", Some(KeyType::Email)),
            Ok(PixKey::Email("fulano@example.com".to_string()))
        );
        assert_eq!(
            classify("(11) 99999-8888", Some(KeyType::Phone)),
            Ok(PixKey::Phone("+5511999998888".to_string()))
        );
        assert_eq!(
            classify("123E4567-E89B-42D3-A456-426614174000", Some(KeyType::Random)),
            Ok(PixKey::Random("123e4567-e89b-42d3-a456-426614174000".to_string()))
        );
    }

    #[test]
    fn test_declared_type_rejections() {
        assert!(matches!(
            classify("52998224726", Some(KeyType::Cpf)),
            Err(ValidationError::InvalidCpf(_))
        ));
        assert!(matches!(
            classify("not-an-email", Some(KeyType::Email)),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            classify("123e4567-e89b-12d3-a456-426614174000", Some(KeyType::Random)),
            Err(ValidationError::InvalidRandomKey(_))
        ));
        assert!(matches!(
            classify("119999888", Some(KeyType::Phone)),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            classify("11a99998888", Some(KeyType::Phone)),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert_eq!(classify("   ", None), Err(ValidationError::EmptyKey));
    }

    #[test]
    fn test_email_length_limit() {
        let local = "a".repeat(MAX_EMAIL_LEN - "@x.io".len());
        let fits = format!("{}@x.io", local);
        assert!(classify(&fits, Some(KeyType::Email)).is_ok());

        let too_long = format!("a{}", fits);
        assert!(matches!(
            classify(&too_long, Some(KeyType::Email)),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_phone_that_is_a_cpf() {
        // Third digit is 9 and the check digits match
        assert_eq!(
            classify("52998224725", Some(KeyType::Phone)),
            Err(ValidationError::LooksLikeCpf("52998224725".to_string()))
        );
        assert_eq!(
            classify("52998224725", None),
            Err(ValidationError::AmbiguousKey("52998224725".to_string()))
        );
        assert_eq!(
            classify("52998224725", Some(KeyType::Cpf)),
            Ok(PixKey::Cpf("52998224725".to_string()))
        );
    }

    #[test]
    fn test_auto_detection() {
        assert_eq!(classify("a@b.co", None).unwrap().key_type(), KeyType::Email);
        assert_eq!(
            classify("123e4567-e89b-42d3-a456-426614174000", None).unwrap().key_type(),
            KeyType::Random
        );
        assert_eq!(classify("11999998888", None).unwrap().key_type(), KeyType::Phone);
        assert_eq!(classify("+5511999998888", None).unwrap().key_type(), KeyType::Phone);
        assert_eq!(classify("5511999998888", None).unwrap().key_type(), KeyType::Phone);
        assert_eq!(classify("11444777000161", None).unwrap().key_type(), KeyType::Cnpj);
        assert_eq!(classify("111.444.777-35", None).unwrap().key_type(), KeyType::Cpf);
        assert!(matches!(classify("12345", None), Err(ValidationError::UnrecognizedKey(_))));
        assert!(matches!(classify("hello", None), Err(ValidationError::UnrecognizedKey(_))));
        assert!(matches!(classify("11811111111", None), Err(ValidationError::InvalidCpf(_))));
    }

    #[test]
    fn test_revalidate() {
        let key = classify("(11) 99999-8888", None).unwrap();
        assert!(key.revalidate().is_ok());

        let forged = PixKey::Cpf("52998224726".to_string());
        assert!(forged.revalidate().is_err());

        let empty = PixKey::Email(String::new());
        assert_eq!(empty.revalidate(), Err(ValidationError::EmptyKey));
    }

    #[test]
    fn test_labels() {
        assert_eq!(KeyType::Phone.label(), "Celular");
        assert_eq!(KeyType::Email.to_string(), "E-mail");
        assert_eq!(PixKey::Cpf("52998224725".into()).to_string(), "52998224725");
    }
}
