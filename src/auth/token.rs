use chrono::{Duration, Utc};
use jsonwebtoken::{
	decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
	Validation,
};
use serde::{Deserialize, Serialize};

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
	#[error("malformed token")]
	Malformed,
	#[error("bad token signature")]
	BadSignature,
	#[error("token expired")]
	Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
	fn from(error: jsonwebtoken::errors::Error) -> Self {
		match error.kind() {
			ErrorKind::ExpiredSignature => Self::Expired,
			ErrorKind::InvalidSignature => Self::BadSignature,
			_ => Self::Malformed,
		}
	}
}

/// Claims embedded in every token: the username it asserts, when it was
/// minted and when it stops being valid.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	pub sub: String,
	pub iat: i64,
	pub exp: i64,
}

/// Signs and verifies bearer tokens with a server-held symmetric secret
/// (HS256). Tokens are stateless; there is no revocation list, they only
/// expire.
#[derive(Clone)]
pub struct TokenCodec {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
}

impl TokenCodec {
	pub fn new(secret: &str, ttl: Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			ttl,
		}
	}

	/// Mints a token asserting `subject`, valid for the configured TTL.
	pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
		let now = Utc::now();
		let claims = Claims {
			sub: subject.to_string(),
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		Ok(encode(&Header::default(), &claims, &self.encoding)?)
	}

	/// Returns the subject of a valid token.
	pub fn verify(&self, token: &str) -> Result<String, TokenError> {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;

		let data = decode::<Claims>(token, &self.decoding, &validation)?;

		Ok(data.claims.sub)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn codec(ttl: Duration) -> TokenCodec {
		TokenCodec::new("test-secret", ttl)
	}

	#[test]
	fn verify_returns_the_issued_subject() {
		let codec = codec(Duration::hours(24));
		let token = codec.issue("danmoop").unwrap();

		assert_eq!(codec.verify(&token).unwrap(), "danmoop");
	}

	#[test]
	fn elapsed_expiry_is_rejected() {
		let codec = codec(Duration::seconds(-60));
		let token = codec.issue("alice").unwrap();

		assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
	}

	#[test]
	fn foreign_secret_is_a_bad_signature() {
		let token = codec(Duration::hours(1)).issue("alice").unwrap();
		let other = TokenCodec::new("other-secret", Duration::hours(1));

		assert_eq!(other.verify(&token).unwrap_err(), TokenError::BadSignature);
	}

	#[test]
	fn garbage_is_malformed() {
		let codec = codec(Duration::hours(1));

		assert_eq!(
			codec.verify("not-a-token").unwrap_err(),
			TokenError::Malformed
		);
		assert_eq!(codec.verify("").unwrap_err(), TokenError::Malformed);
	}
}
