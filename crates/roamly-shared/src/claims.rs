//! Local decoding of bearer credentials.
//!
//! A credential is three dot-separated base64url segments. Only the middle
//! (claim) segment is read; the signature is never checked here. The server
//! re-validates the credential on every mutating call, so the identity
//! derived locally only shapes the UI.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ClaimError;
use crate::types::UserId;

/// Claim keys that may carry the subject, in lookup order.
const SUBJECT_KEYS: [&str; 2] = ["user_id", "sub"];

/// Identity decoded from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaim {
    pub subject: UserId,
    /// Informational only; expiry is enforced by the server.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Decode the identity carried by `token`, failing closed.
///
/// Same token in, same identity out. Any structural problem yields `None`.
pub fn decode_identity(token: &str) -> Option<SessionClaim> {
    match parse_claim(token) {
        Ok(claim) => Some(claim),
        Err(e) => {
            debug!(error = %e, "Discarding malformed credential");
            None
        }
    }
}

/// Decode the claim segment of `token`, reporting why it failed.
pub fn parse_claim(token: &str) -> Result<SessionClaim, ClaimError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimError::SegmentCount(segments.len()));
    }

    let bytes = base64_segment_decode(segments[1])?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| ClaimError::InvalidJson(e.to_string()))?;
    let Value::Object(claims) = value else {
        return Err(ClaimError::NotAnObject);
    };

    let subject = extract_subject(&claims).ok_or(ClaimError::MissingSubject)?;
    let expires_at = claims
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Ok(SessionClaim {
        subject,
        expires_at,
    })
}

fn extract_subject(claims: &Map<String, Value>) -> Option<UserId> {
    SUBJECT_KEYS
        .iter()
        .filter_map(|key| claims.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(UserId::new(s)),
            Value::Number(n) => Some(UserId::new(n.to_string())),
            _ => None,
        })
}

fn base64_segment_decode(segment: &str) -> Result<Vec<u8>, ClaimError> {
    let segment = segment.trim_end_matches('=');
    if segment.is_empty() {
        return Err(ClaimError::Base64Decode);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| STANDARD_NO_PAD.decode(segment))
        .map_err(|_| ClaimError::Base64Decode)
}
