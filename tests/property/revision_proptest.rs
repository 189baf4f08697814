//! Property-based tests for revision key canonicalization

use docbridge::shared::generate_revision_id;
use docbridge::shared::revision::MAX_REVISION_KEY_LEN;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_key_is_short_and_safe(input in ".*") {
        let key = generate_revision_id(&input);
        prop_assert!(key.len() <= MAX_REVISION_KEY_LEN);
        prop_assert!(key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '=')));
    }

    #[test]
    fn test_canonical_key_maps_to_itself(input in ".*") {
        let key = generate_revision_id(&input);
        prop_assert_eq!(generate_revision_id(&key), key);
    }

    #[test]
    fn test_safe_short_keys_unchanged(input in "[0-9A-Za-z_=.-]{0,20}") {
        prop_assert_eq!(generate_revision_id(&input), input);
    }

    #[test]
    fn test_long_keys_are_checksums(input in "[a-z]{21,80}") {
        let key = generate_revision_id(&input);
        prop_assert!(!key.is_empty());
        prop_assert!(key.chars().all(|c| c.is_ascii_digit()));
    }
}
