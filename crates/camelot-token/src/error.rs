//! Errors for the token service.

/// Errors that can occur verifying or minting a token.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token string isn't in the expected `<payload>.<tag>` shape, or
    /// the payload doesn't decode to valid canonical claims.
    #[error("malformed token")]
    Malformed,
    /// The tag didn't match, the claims don't match the expected variant
    /// (a user token presented where a room token is required, or vice
    /// versa), or no secret is configured (fail-closed per §4.1).
    #[error("invalid token")]
    Invalid,
    /// The tag matched but `exp` is in the past.
    #[error("token expired")]
    Expired,
    /// Minting requires a configured secret; this is a boot-time
    /// configuration error, not a per-request one.
    #[error("no signing secret configured")]
    MissingSecret,
}
