use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is missing a timestamp")]
    MissingTimestamp,
    #[error("signature header has no v1 signatures")]
    NoSignatures,
    #[error("signature timestamp is outside the {tolerance_secs}s tolerance")]
    OutsideTolerance { tolerance_secs: i64 },
    #[error("no signature matches the expected value")]
    Mismatch,
    #[error("invalid signing secret")]
    InvalidSecret,
}

/// Parsed form of a `stripe-signature` header: `t=<unix>,v1=<hex>[,v1=<hex>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let mut kv = part.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(value)) => timestamp = value.parse::<i64>().ok(),
                (Some("v1"), Some(value)) if !value.is_empty() => {
                    signatures.push(value.to_string())
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
        if signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

pub fn compute_signature(
    payload: &[u8],
    timestamp: i64,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds a header value the way the provider does. Used by local tooling and tests.
pub fn sign_payload(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, SignatureError> {
    let signature = compute_signature(payload, timestamp, secret)?;
    Ok(format!("t={},v1={}", timestamp, signature))
}

pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;

    let within = now
        .timestamp()
        .checked_sub(parsed.timestamp)
        .map(|skew| skew.unsigned_abs() <= tolerance_secs.unsigned_abs())
        .unwrap_or(false);
    if !within {
        return Err(SignatureError::OutsideTolerance { tolerance_secs });
    }

    let expected = compute_signature(payload, parsed.timestamp, secret)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
