use std::collections::HashSet;

use chrono::Duration;

/// Platform administrator granted moderation and backup access when no
/// `ADMIN_USERS` variable is set.
pub const DEFAULT_ADMIN: &str = "danmoop";

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Runtime configuration, collected from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub port: u16,
	/// Symmetric secret the bearer-token codec signs with.
	pub token_secret: String,
	pub token_ttl: Duration,
	/// Usernames granted admin access. Membership is an exact string
	/// match against the identity's username, nothing on the user record
	/// influences it.
	pub admins: HashSet<String>,
}

impl Config {
	/// Reads configuration from the environment, falling back to
	/// development defaults for everything but the port format.
	pub fn from_env() -> Self {
		let port = std::env::var("PORT").map_or_else(
			|_| 3000,
			|port| port.parse().expect("PORT must be a number"),
		);

		let token_ttl = std::env::var("TOKEN_TTL_HOURS").map_or_else(
			|_| Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
			|hours| {
				Duration::hours(hours.parse().expect("TOKEN_TTL_HOURS must be a number"))
			},
		);

		let admins = std::env::var("ADMIN_USERS").map_or_else(
			|_| std::iter::once(DEFAULT_ADMIN.to_string()).collect(),
			|list| {
				list.split(',')
					.map(str::trim)
					.filter(|name| !name.is_empty())
					.map(ToString::to_string)
					.collect()
			},
		);

		Self {
			port,
			token_secret: std::env::var("TOKEN_SECRET")
				.unwrap_or_else(|_| "gitpals-dev-secret".to_string()),
			token_ttl,
			admins,
		}
	}
}

#[cfg(test)]
impl Default for Config {
	fn default() -> Self {
		Self {
			port: 0,
			token_secret: "test-secret".to_string(),
			token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
			admins: std::iter::once(DEFAULT_ADMIN.to_string()).collect(),
		}
	}
}
