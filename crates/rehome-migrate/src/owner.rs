//! Target owner resolution.
//!
//! Precedence, first match wins:
//!
//! 1. explicit personal owner (`--owner`)
//! 2. explicit organization (`--organization`)
//! 3. environment personal owner (`GITHUB_REPOSITORY_OWNER`)
//! 4. environment organization (`GITHUB_ORGANIZATION`)
//! 5. the configured user
//!
//! Every candidate is trimmed; a candidate that trims to empty is treated as unset.

use crate::types::OwnershipConfig;

/// How the resolved owner should be described to the operator.
///
/// Display only; repository creation routes independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    /// A personal owner was configured somewhere.
    Personal,
    /// An organization was selected.
    Organization,
    /// Nothing was configured; the user's own account.
    DefaultUser,
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::Organization => write!(f, "organization"),
            Self::DefaultUser => write!(f, "user"),
        }
    }
}

/// The account repositories are moved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOwner {
    name: String,
    kind: OwnerKind,
}

impl ResolvedOwner {
    /// The account name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Display classification.
    pub fn kind(&self) -> OwnerKind {
        self.kind
    }
}

impl std::fmt::Display for ResolvedOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl OwnershipConfig {
    /// Whether a personal owner was configured, explicitly or through the environment.
    pub fn has_personal_owner(&self) -> bool {
        non_empty(self.explicit_owner.as_deref()).is_some()
            || non_empty(self.env_repository_owner.as_deref()).is_some()
    }

    /// Resolve the target owner.
    pub fn resolve(&self) -> ResolvedOwner {
        let candidates = [
            (self.explicit_owner.as_deref(), OwnerKind::Personal),
            (self.explicit_organization.as_deref(), OwnerKind::Organization),
            (self.env_repository_owner.as_deref(), OwnerKind::Personal),
            (self.env_organization.as_deref(), OwnerKind::Organization),
        ];

        let (name, kind) = candidates
            .into_iter()
            .find_map(|(value, kind)| non_empty(value).map(|v| (v, kind)))
            .unwrap_or((self.authenticated_user.trim(), OwnerKind::DefaultUser));

        let kind = if self.has_personal_owner() {
            OwnerKind::Personal
        } else {
            kind
        };

        ResolvedOwner {
            name: name.to_string(),
            kind,
        }
    }
}

/// Resolve the owner from the configured user and explicit flags alone.
pub fn resolve_owner(
    default_user: &str,
    explicit_owner: Option<&str>,
    explicit_organization: Option<&str>,
) -> ResolvedOwner {
    OwnershipConfig {
        explicit_owner: explicit_owner.map(str::to_string),
        explicit_organization: explicit_organization.map(str::to_string),
        authenticated_user: default_user.to_string(),
        env_repository_owner: None,
        env_organization: None,
    }
    .resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full() -> OwnershipConfig {
        OwnershipConfig::new("u")
            .with_owner("o")
            .with_organization("g")
            .with_env_owner("e1")
            .with_env_organization("e2")
    }

    #[test]
    fn test_precedence_chain() {
        let mut config = full();
        assert_eq!(config.resolve().as_str(), "o");

        config.explicit_owner = None;
        assert_eq!(config.resolve().as_str(), "g");

        config.explicit_organization = None;
        assert_eq!(config.resolve().as_str(), "e1");

        config.env_repository_owner = None;
        assert_eq!(config.resolve().as_str(), "e2");

        config.env_organization = None;
        assert_eq!(config.resolve().as_str(), "u");
    }

    #[test]
    fn test_whitespace_is_trimmed_and_blank_ignored() {
        let config = OwnershipConfig::new("  alice ")
            .with_owner("   ")
            .with_organization("  acme  ");
        let owner = config.resolve();
        assert_eq!(owner.as_str(), "acme");
        assert_eq!(owner.kind(), OwnerKind::Organization);

        let config = OwnershipConfig::new("  alice ");
        assert_eq!(config.resolve().as_str(), "alice");
        assert_eq!(config.resolve().kind(), OwnerKind::DefaultUser);
    }

    #[test]
    fn test_env_owner_marks_personal_even_when_org_wins() {
        let config = OwnershipConfig::new("u")
            .with_organization("g")
            .with_env_owner("e1");
        let owner = config.resolve();
        assert_eq!(owner.as_str(), "g");
        assert_eq!(owner.kind(), OwnerKind::Personal);
        assert!(config.has_personal_owner());
    }

    #[test]
    fn test_resolve_owner_helper() {
        assert_eq!(resolve_owner("u", Some("o"), Some("g")).as_str(), "o");
        assert_eq!(resolve_owner("u", None, Some("g")).as_str(), "g");
        assert_eq!(resolve_owner("u", Some(""), None).as_str(), "u");
    }

    proptest! {
        #[test]
        fn resolution_is_idempotent_and_non_empty(
            user in "[a-z]{1,12}",
            owner in proptest::option::of("[ a-z]{0,8}"),
            org in proptest::option::of("[ a-z]{0,8}"),
            env_owner in proptest::option::of("[ a-z]{0,8}"),
            env_org in proptest::option::of("[ a-z]{0,8}"),
        ) {
            let config = OwnershipConfig {
                explicit_owner: owner,
                explicit_organization: org,
                authenticated_user: user,
                env_repository_owner: env_owner,
                env_organization: env_org,
            };
            let first = config.resolve();
            let second = config.resolve();
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.as_str().is_empty());
            prop_assert_eq!(first.as_str(), first.as_str().trim());
        }
    }
}
