use std::collections::HashSet;

use crate::model::User;

/// Access level an operation requires. Anonymous and plain
/// authenticated access are expressed by the extractors themselves;
/// the gate only decides the levels that depend on moderation state or
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
	/// An identity whose username is in the configured administrators
	/// set. Nothing on the user record itself grants this.
	Admin,
	/// Anonymous visitors or identities that are not banned. Bans only
	/// restrict writes; read-only browsing stays open.
	NotBanned,
}

/// Outcome of gating a request. Not persisted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Anonymous,
	Authenticated,
	AuthenticatedAdmin,
	DeniedBanned,
}

impl Decision {
	/// Whether this decision satisfies the role the operation asked for.
	pub fn permits(self, role: Role) -> bool {
		match role {
			Role::Admin => matches!(self, Self::AuthenticatedAdmin),
			Role::NotBanned => !matches!(self, Self::DeniedBanned),
		}
	}
}

/// Pure per-request authorization check.
///
/// Every mutating or listing handler runs this before touching the store;
/// a denial must short-circuit with no state mutation. Denied admin reads
/// return empty result sets rather than errors, so "forbidden" is not
/// distinguishable from "absent" for non-admin callers.
pub fn authorize(user: Option<&User>, role: Role, admins: &HashSet<String>) -> Decision {
	match user {
		Some(user) if role == Role::NotBanned && user.banned => Decision::DeniedBanned,
		Some(user) if admins.contains(&user.username) => Decision::AuthenticatedAdmin,
		Some(_) => Decision::Authenticated,
		None => Decision::Anonymous,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn admins() -> HashSet<String> {
		std::iter::once("danmoop".to_string()).collect()
	}

	#[test]
	fn admin_is_an_exact_username_match_and_nothing_else() {
		let admin = User::new("danmoop", None, None, None);
		let other = User::new("danmoop2", None, None, None);

		assert_eq!(
			authorize(Some(&admin), Role::Admin, &admins()),
			Decision::AuthenticatedAdmin
		);
		assert_eq!(
			authorize(Some(&other), Role::Admin, &admins()),
			Decision::Authenticated
		);
		assert!(!authorize(Some(&other), Role::Admin, &admins()).permits(Role::Admin));
		assert!(!authorize(None, Role::Admin, &admins()).permits(Role::Admin));
	}

	#[test]
	fn banned_identities_fail_every_not_banned_gate() {
		let mut banned = User::new("troll", None, None, None);
		banned.banned = true;

		assert_eq!(
			authorize(Some(&banned), Role::NotBanned, &admins()),
			Decision::DeniedBanned
		);

		// Even an admin username is rejected while banned.
		let mut banned_admin = User::new("danmoop", None, None, None);
		banned_admin.banned = true;

		assert_eq!(
			authorize(Some(&banned_admin), Role::NotBanned, &admins()),
			Decision::DeniedBanned
		);
	}

	#[test]
	fn anonymous_passes_the_not_banned_gate() {
		assert!(authorize(None, Role::NotBanned, &admins()).permits(Role::NotBanned));
	}

	#[test]
	fn unbanned_identities_pass_the_not_banned_gate() {
		let user = User::new("alice", None, None, None);

		assert!(authorize(Some(&user), Role::NotBanned, &admins())
			.permits(Role::NotBanned));
	}
}
