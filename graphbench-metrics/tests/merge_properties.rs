use std::time::{Duration, SystemTime};

use graphbench_metrics::{FailureGroups, LatencyHistogram};
use proptest::prelude::*;

fn histogram(samples: &[u64]) -> LatencyHistogram {
    let mut h = LatencyHistogram::new();
    for &us in samples {
        h.record_us(us);
    }
    h
}

fn merge(a: &LatencyHistogram, b: &LatencyHistogram) -> LatencyHistogram {
    LatencyHistogram::merged([a, b]).unwrap_or_else(|e| panic!("{e}"))
}

fn failures(entries: &[(u8, u32)]) -> FailureGroups {
    let mut groups = FailureGroups::new();
    for &(sig, secs) in entries {
        groups.record(
            &format!("error {}", sig % 4),
            SystemTime::UNIX_EPOCH + Duration::from_secs(u64::from(secs)),
        );
    }
    groups
}

proptest! {
    #[test]
    fn histogram_merge_is_associative(
        a in prop::collection::vec(1u64..5_000_000, 0..50),
        b in prop::collection::vec(1u64..5_000_000, 0..50),
        c in prop::collection::vec(1u64..5_000_000, 0..50),
    ) {
        let (ha, hb, hc) = (histogram(&a), histogram(&b), histogram(&c));
        let left = merge(&merge(&ha, &hb), &hc);
        let right = merge(&ha, &merge(&hb, &hc));
        prop_assert_eq!(left.summary(), right.summary());
        prop_assert_eq!(left, right);
    }

    #[test]
    fn histogram_merge_is_commutative_and_matches_direct_recording(
        a in prop::collection::vec(1u64..5_000_000, 0..80),
        b in prop::collection::vec(1u64..5_000_000, 0..80),
    ) {
        let (ha, hb) = (histogram(&a), histogram(&b));
        let ab = merge(&ha, &hb);
        let ba = merge(&hb, &ha);
        prop_assert_eq!(ab.summary(), ba.summary());

        let all: Vec<u64> = a.iter().chain(b.iter()).copied().collect();
        prop_assert_eq!(ab.summary(), histogram(&all).summary());
    }

    #[test]
    fn failure_merge_is_order_independent(
        a in prop::collection::vec((any::<u8>(), 0u32..10_000), 0..20),
        b in prop::collection::vec((any::<u8>(), 0u32..10_000), 0..20),
    ) {
        let mut ab = failures(&a);
        ab.merge(&failures(&b));
        let mut ba = failures(&b);
        ba.merge(&failures(&a));
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(ab.total(), (a.len() + b.len()) as u64);
    }
}
