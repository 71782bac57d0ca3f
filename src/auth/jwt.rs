use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn generate_access_token(
    professor_id: u64,
    code: String,
    name: String,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        professor_id,
        sub: code,
        name,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips_claims() {
        let token = generate_access_token(42, "PROF-001".into(), "Ada Lovelace".into(), "secret", 3600);
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.professor_id, 42);
        assert_eq!(claims.sub, "PROF-001");
        assert_eq!(claims.name, "Ada Lovelace");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_access_token(42, "PROF-001".into(), "Ada".into(), "secret", 3600);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_tampered_token() {
        let token = generate_access_token(42, "PROF-001".into(), "Ada".into(), "secret", 3600);
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(verify_token(&tampered, "secret").is_err());
    }
}
