//! Webhook signature verification.
//!
//! The processor signs every delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac>`, where the MAC is HMAC-SHA256 over
//! `"<t>.<raw body>"` keyed with the shared webhook secret.

use crate::error::{OrderError, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Processor-Signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Checks `header` against `body` at the current time.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<()> {
        self.verify_at(header, body, Utc::now().timestamp())
    }

    pub fn verify_at(&self, header: Option<&str>, body: &[u8], now: i64) -> Result<()> {
        let header = header.ok_or(OrderError::InvalidSignature)?;
        let (timestamp, candidates) = parse_header(header)?;
        if now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(OrderError::InvalidSignature);
        }

        for candidate in candidates {
            let Ok(expected) = hex::decode(candidate) else {
                continue;
            };
            if self.mac(timestamp, body)?.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }
        Err(OrderError::InvalidSignature)
    }

    fn mac(&self, timestamp: i64, body: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| OrderError::InternalError(e.to_string().into()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

/// Splits a signature header into its timestamp and `v1` signatures.
fn parse_header(header: &str) -> Result<(i64, Vec<&str>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    match timestamp {
        Some(t) if !signatures.is_empty() => Ok((t, signatures)),
        _ => Err(OrderError::InvalidSignature),
    }
}

/// Builds a header value the verifier accepts. Used by the processor
/// simulator in tests and by operators replaying deliveries.
pub fn signature_header(secret: &str, timestamp: i64, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| OrderError::InternalError(e.to_string().into()))?;
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(body);
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}
