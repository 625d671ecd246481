use thiserror::Error;

/// Reasons a bearer credential could not be decoded into a claim.
///
/// These never escape [`crate::claims::decode_identity`]; they exist so the
/// reason can be logged before the failure collapses to "no identity".
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Expected 3 credential segments, found {0}")]
    SegmentCount(usize),

    #[error("Claim segment is not valid base64url")]
    Base64Decode,

    #[error("Claim segment is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Claim segment is not a JSON object")]
    NotAnObject,

    #[error("Claim has no usable subject")]
    MissingSubject,
}
