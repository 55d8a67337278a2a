//! Permission evaluation for root credentials
//!
//! A pure decision over a credential's scope set and one required
//! capability. No I/O; the same inputs always produce the same decision.

mod pattern;

pub use pattern::{Capability, PermissionPattern, Segment, GLOBAL_SCOPE};

/// Outcome of evaluating a scope set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
}

impl PermissionDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Decide whether any scope grants the required capability.
///
/// Deny is the default: an empty scope set and a set with no matching
/// pattern are indistinguishable to the caller.
pub fn evaluate<S: AsRef<str>>(scopes: &[S], required: &Capability) -> PermissionDecision {
    let granted = scopes.iter().any(|scope| {
        let scope = scope.as_ref();
        scope == GLOBAL_SCOPE || PermissionPattern::parse(scope).matches(required)
    });

    if granted {
        PermissionDecision::Granted
    } else {
        PermissionDecision::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(raw: &str) -> Capability {
        Capability::parse(raw)
    }

    #[test]
    fn test_wildcard_scope_grants_any_key() {
        let scopes = ["api.*.update_key"];

        for key_id in ["key_1", "key_abc", "x"] {
            let capability = required(&format!("api.{}.update_key", key_id));
            assert!(evaluate(&scopes, &capability).is_granted());
        }
    }

    #[test]
    fn test_wildcard_scope_denies_other_verb() {
        let scopes = ["api.*.update_key"];
        assert_eq!(
            evaluate(&scopes, &required("api.key_1.delete_key")),
            PermissionDecision::Denied
        );
    }

    #[test]
    fn test_segment_count_must_match() {
        let scopes = ["api.*.update_key"];
        assert!(!evaluate(&scopes, &required("api.update_key")).is_granted());
        assert!(!evaluate(&scopes, &required("api.a.b.update_key")).is_granted());
    }

    #[test]
    fn test_exact_scope() {
        let scopes = ["api.key_1.update_key"];
        assert!(evaluate(&scopes, &required("api.key_1.update_key")).is_granted());
        assert!(!evaluate(&scopes, &required("api.key_2.update_key")).is_granted());
    }

    #[test]
    fn test_any_scope_may_grant() {
        let scopes = vec![
            "api.*.read_key".to_string(),
            "api.key_7.update_key".to_string(),
        ];
        assert!(evaluate(&scopes, &required("api.key_7.update_key")).is_granted());
    }

    #[test]
    fn test_global_scope_grants_everything() {
        let scopes = [GLOBAL_SCOPE];
        assert!(evaluate(&scopes, &required("api.key_1.update_key")).is_granted());
        assert!(evaluate(&scopes, &required("workspace.read")).is_granted());
    }

    #[test]
    fn test_empty_scope_set_denies() {
        let scopes: [&str; 0] = [];
        assert_eq!(
            evaluate(&scopes, &required("api.key_1.update_key")),
            PermissionDecision::Denied
        );
    }
}
