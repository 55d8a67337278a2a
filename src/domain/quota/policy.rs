//! Policy for counter operations on keys with unlimited usage

use serde::Deserialize;

/// What `increment`/`decrement` do when a key has no remaining counter.
///
/// `set` always materialises the given value regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnlimitedPolicy {
    /// Fail with `UnlimitedQuota`
    #[default]
    Reject,
    /// Leave the key unlimited and report `remaining: null`
    Preserve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reject() {
        assert_eq!(UnlimitedPolicy::default(), UnlimitedPolicy::Reject);
    }

    #[test]
    fn test_deserialize() {
        let preserve: UnlimitedPolicy = serde_json::from_str("\"preserve\"").unwrap();
        assert_eq!(preserve, UnlimitedPolicy::Preserve);

        let unknown: Result<UnlimitedPolicy, _> = serde_json::from_str("\"materialize\"");
        assert!(unknown.is_err());
    }
}
