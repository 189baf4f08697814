//! Property-based tests for track status codes

use docbridge::shared::TrackStatus;
use proptest::prelude::*;

const KNOWN: [i64; 6] = [1, 2, 3, 4, 6, 7];

proptest! {
    #[test]
    fn test_only_known_codes_decode(code in any::<i64>()) {
        let decoded = TrackStatus::try_from(code);
        prop_assert_eq!(decoded.is_ok(), KNOWN.contains(&code));
        if let Ok(status) = decoded {
            prop_assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_forcesave_statuses_save_and_stay_locked(index in 0usize..KNOWN.len()) {
        let status = TrackStatus::try_from(KNOWN[index]).unwrap();
        if status.is_forcesave() {
            prop_assert!(status.triggers_save());
            prop_assert!(status.leaves_locked());
        }
        if status.leaves_locked() && !status.is_forcesave() {
            prop_assert_eq!(status, TrackStatus::Editing);
        }
    }
}
