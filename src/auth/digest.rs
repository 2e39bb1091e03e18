use md5::{Digest as _, Md5};

/// One-way digest used to store and check the API credential.
///
/// The platform inherited a fast, weak digest; the trait isolates it so a
/// memory-hard scheme can replace it without touching call sites. The
/// observable contract stays: accept a matching secret, reject otherwise.
pub trait CredentialDigest: Send + Sync {
	/// Hex-encoded digest of the raw secret.
	fn digest(&self, raw: &str) -> String;

	fn matches(&self, raw: &str, stored: &str) -> bool {
		self.digest(raw) == stored
	}
}

/// MD5 over UTF-8 bytes, hex-encoded. Legacy scheme, kept for
/// compatibility with existing stored credentials.
pub struct Md5Credential;

impl CredentialDigest for Md5Credential {
	fn digest(&self, raw: &str) -> String {
		Md5::digest(raw.as_bytes())
			.iter()
			.map(|byte| format!("{byte:02x}"))
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn digest_matches_the_known_md5_vector() {
		// md5("password")
		assert_eq!(
			Md5Credential.digest("password"),
			"5f4dcc3b5aa765d61d8327deb882cf99"
		);
	}

	#[test]
	fn matches_accepts_only_the_same_secret() {
		let stored = Md5Credential.digest("hunter2");

		assert!(Md5Credential.matches("hunter2", &stored));
		assert!(!Md5Credential.matches("hunter3", &stored));
		assert!(!Md5Credential.matches("", &stored));
	}
}
