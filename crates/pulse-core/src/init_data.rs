//! Launch-payload integrity verification.
//!
//! A Telegram client hands its embedded web app a signed urlencoded blob
//! ("init data"). The signature is an HMAC chain: a per-bot secret key is
//! derived by signing the bot token with the literal key `"WebAppData"`, and
//! that secret then signs a canonical `key=value` rendering of every field
//! except `hash`. Verification recomputes the chain and compares in constant
//! time.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SECRET_KEY_LABEL: &[u8] = b"WebAppData";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed launch payload")]
    MalformedPayload,
    #[error("invalid signature")]
    InvalidSignature,
}

/// Launch fields that passed signature verification.
///
/// The `user` field, when present, is still the raw JSON string the client
/// carried; decoding it is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFields {
    fields: BTreeMap<String, String>,
}

impl VerifiedFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn user_json(&self) -> Option<&str> {
        self.get("user")
    }
}

/// Stateless payload verifier bound to one bot token.
///
/// The per-bot secret key is derived once at construction; `verify` is pure
/// after that, so identical inputs always yield identical results.
#[derive(Debug, Clone)]
pub struct Verifier {
    secret_key: [u8; 32],
}

impl Verifier {
    pub fn new(bot_token: &str) -> Self {
        Self {
            secret_key: derive_secret_key(bot_token),
        }
    }

    /// Parses and authenticates a raw launch payload.
    ///
    /// A missing `hash` field is treated as an empty signature and rejected
    /// the same way a wrong one is; callers never learn which it was.
    pub fn verify(&self, raw: &str) -> Result<VerifiedFields, VerifyError> {
        let mut fields = parse_launch_payload(raw)?;
        let received_hash = fields.remove("hash").unwrap_or_default();

        let received = hex::decode(received_hash.as_bytes())
            .map_err(|_| VerifyError::InvalidSignature)?;

        let mut mac = new_mac(&self.secret_key);
        mac.update(canonical_string(&fields).as_bytes());
        mac.verify_slice(&received)
            .map_err(|_| VerifyError::InvalidSignature)?;

        Ok(VerifiedFields { fields })
    }
}

/// Computes the lowercase hex signature a genuine client would carry for
/// `fields` (which must not contain `hash`). Used by tests and local tooling
/// to craft valid payloads.
pub fn sign(fields: &BTreeMap<String, String>, bot_token: &str) -> String {
    let mut mac = new_mac(&derive_secret_key(bot_token));
    mac.update(canonical_string(fields).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn derive_secret_key(bot_token: &str) -> [u8; 32] {
    let mut mac = new_mac(SECRET_KEY_LABEL);
    mac.update(bot_token.as_bytes());
    mac.finalize().into_bytes().into()
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    // Hmac accepts keys of any length, so this cannot fail.
    HmacSha256::new_from_slice(key).expect("hmac key")
}

fn parse_launch_payload(raw: &str) -> Result<BTreeMap<String, String>, VerifyError> {
    if raw.trim().is_empty() {
        return Err(VerifyError::MalformedPayload);
    }

    let mut fields = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if key.is_empty() {
            return Err(VerifyError::MalformedPayload);
        }
        // Last occurrence of a duplicate key wins.
        fields.insert(key.into_owned(), value.into_owned());
    }
    Ok(fields)
}

/// `key=value` lines sorted by raw key bytes, joined with `\n`, no trailing
/// newline. Values are used exactly as decoded.
fn canonical_string(fields: &BTreeMap<String, String>) -> String {
    let mut lines = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        lines.push(format!("{key}={value}"));
    }
    lines.join("\n")
}
