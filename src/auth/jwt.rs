use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }

    fn sign_with_kind(&self, subject: &str, scopes: &[String], kind: TokenKind) -> anyhow::Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = OffsetDateTime::now_utc() + TimeDuration::seconds(ttl.as_secs() as i64);
        self.sign_until(subject, scopes, kind, exp)
    }

    pub(crate) fn sign_until(
        &self,
        subject: &str,
        scopes: &[String],
        kind: TokenKind,
        exp: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: subject.to_string(),
            scopes: scopes.to_vec(),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject, kind = ?kind, scopes = ?scopes, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, subject: &str, scopes: &[String]) -> anyhow::Result<String> {
        self.sign_with_kind(subject, scopes, TokenKind::Access)
    }

    pub fn sign_refresh(&self, subject: &str, scopes: &[String]) -> anyhow::Result<String> {
        self.sign_with_kind(subject, scopes, TokenKind::Refresh)
    }

    /// Signature, issuer, audience and expiry; any failure is `InvalidCredentials`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::InvalidCredentials
        })?;
        if data.claims.sub.trim().is_empty() {
            warn!("jwt without subject");
            return Err(AppError::InvalidCredentials);
        }
        debug!(subject = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access {
            warn!(subject = %claims.sub, "refresh token presented as access token");
            return Err(AppError::InvalidCredentials);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            warn!(subject = %claims.sub, "access token presented as refresh token");
            return Err(AppError::InvalidCredentials);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 10,
            refresh_ttl_minutes: 60 * 24 * 7,
        })
    }

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys
            .sign_access("alice", &scopes(&["items:read"]))
            .expect("sign access");
        let claims = keys.verify_access(&token).expect("verify token");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.scopes, vec!["items:read".to_string()]);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_tokens_live_longer_and_are_not_access_tokens() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let access = keys.sign_access("bob", &[]).unwrap();
        let refresh = keys.sign_refresh("bob", &[]).unwrap();

        let a = keys.verify_access(&access).unwrap();
        let r = keys.verify_refresh(&refresh).unwrap();
        assert!(r.exp > a.exp);

        assert!(matches!(keys.verify_access(&refresh), Err(AppError::InvalidCredentials)));
        assert!(matches!(keys.verify_refresh(&access), Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn expired_token_is_rejected_even_with_a_valid_signature() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::seconds(5);
        let token = keys
            .sign_until("alice", &scopes(&["items:read"]), TokenKind::Access, past)
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn verify_rejects_foreign_secret_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let token = good.sign_access("alice", &[]).unwrap();

        let other_secret = make_keys("other-secret", "good-iss", "good-aud");
        assert!(other_secret.verify(&token).is_err());

        let other_iss = make_keys("same-secret", "bad-iss", "good-aud");
        assert!(other_iss.verify(&token).is_err());

        let other_aud = make_keys("same-secret", "good-iss", "bad-aud");
        assert!(other_aud.verify(&token).is_err());
    }

    #[test]
    fn malformed_and_tampered_tokens_are_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not-a-jwt").is_err());

        // alice's signature over mallory's payload
        let alice = keys.sign_access("alice", &[]).unwrap();
        let mallory = keys.sign_access("mallory", &scopes(&["users:delete"])).unwrap();
        let alice_parts: Vec<&str> = alice.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let tampered = format!("{}.{}.{}", alice_parts[0], mallory_parts[1], alice_parts[2]);
        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign_access("  ", &[]).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::InvalidCredentials)));
    }
}
