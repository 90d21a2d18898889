//! Transaction id generation
//!
//! A txid is the uppercased prefix, the current time in milliseconds and
//! eight random characters, all base 36, cut to 25 characters. It is short
//! enough for a static code and unlikely to repeat, but not unique.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::MAX_TXID_LEN;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random characters appended after the timestamp
const RANDOM_LEN: usize = 8;

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// Generate a txid from an explicit clock reading and random source.
pub fn generate_txid_with<R: Rng + ?Sized>(prefix: &str, millis: u64, rng: &mut R) -> String {
    let mut txid: String = prefix
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    txid.push_str(&to_base36(millis));
    txid.extend((0..RANDOM_LEN).map(|_| BASE36[rng.gen_range(0..36)] as char));
    txid.truncate(MAX_TXID_LEN);
    txid
}

/// Generate a txid from the system clock and the thread RNG.
pub fn generate_txid(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    generate_txid_with(prefix, millis, &mut rand::thread_rng())
}
