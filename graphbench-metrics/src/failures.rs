use std::time::SystemTime;

use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureGroup {
    pub count: u64,
    pub first_failure: SystemTime,
}

/// Failed transactions bucketed by normalized error signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureGroups {
    groups: AHashMap<String, FailureGroup>,
}

impl FailureGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one failure. Returns `true` the first time `signature` is seen.
    pub fn record(&mut self, signature: &str, at: SystemTime) -> bool {
        if let Some(group) = self.groups.get_mut(signature) {
            group.count += 1;
            if at < group.first_failure {
                group.first_failure = at;
            }
            return false;
        }
        self.groups.insert(
            signature.to_string(),
            FailureGroup {
                count: 1,
                first_failure: at,
            },
        );
        true
    }

    /// Sums counts per signature and keeps the earliest first failure.
    pub fn merge(&mut self, other: &Self) {
        for (signature, group) in &other.groups {
            self.groups
                .entry(signature.clone())
                .and_modify(|existing| {
                    existing.count += group.count;
                    existing.first_failure = existing.first_failure.min(group.first_failure);
                })
                .or_insert(*group);
        }
    }

    #[must_use]
    pub fn get(&self, signature: &str) -> Option<&FailureGroup> {
        self.groups.get(signature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.groups.values().map(|g| g.count).sum()
    }

    /// Groups ordered by descending count, then signature.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &FailureGroup)> {
        let mut out: Vec<(&str, &FailureGroup)> =
            self.groups.iter().map(|(k, v)| (k.as_str(), v)).collect();
        out.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        out
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn record_counts_and_keeps_first_time() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let mut groups = FailureGroups::new();
        assert!(groups.record("boom", t0));
        for i in 1..10 {
            assert!(!groups.record("boom", t0 + Duration::from_secs(i)));
        }
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.get("boom"),
            Some(&FailureGroup {
                count: 10,
                first_failure: t0
            })
        );
    }

    #[test]
    fn merge_sums_and_takes_earliest() {
        let t = |s| SystemTime::UNIX_EPOCH + Duration::from_secs(s);
        let mut a = FailureGroups::new();
        a.record("x", t(20));
        a.record("y", t(5));
        let mut b = FailureGroups::new();
        b.record("x", t(10));
        b.record("x", t(30));

        a.merge(&b);
        assert_eq!(a.get("x").map(|g| (g.count, g.first_failure)), Some((3, t(10))));
        assert_eq!(a.get("y").map(|g| g.count), Some(1));
        assert_eq!(a.total(), 4);
        assert_eq!(a.sorted()[0].0, "x");
    }
}
