// Caller tokens for ledger transactions
// Each request to a remote ledger node is signed for the drone submitting it

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::drone::DroneId;

/// Lifetime of a caller token
pub const TOKEN_TTL_SECS: i64 = 300;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (the submitting drone)
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: DroneId,
    pub exp: usize,
}

/// Creates a JWT token asserting `drone` as the caller
///
/// # Token Properties
/// - Expires after [`TOKEN_TTL_SECS`]
/// - Signed with HS256 algorithm
///
/// # Example
/// ```
/// use swarm_formation::auth::jwt::{create_token, verify_token};
/// use swarm_formation::domain::drone::DroneId;
///
/// let token = create_token(DroneId(3), "swarm-secret").expect("valid token");
/// let claims = verify_token(&token, "swarm-secret").expect("valid token");
/// assert_eq!(claims.sub, DroneId(3));
/// ```
pub fn create_token(drone: DroneId, secret: &str) -> Result<String, String> {
    let expiry = Utc::now() + Duration::seconds(TOKEN_TTL_SECS);
    let claims = Claims {
        sub: drone,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT token
///
/// # Returns
/// * `Ok(Claims)` - The decoded claims if token is valid
/// * `Err(String)` - If token is invalid or expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
