use chrono::Utc;
use model::core::identifiers::Version;
use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out version tokens for fresh sync attempts.
pub trait VersionGenerator: Send + Sync {
    fn next_version(&self) -> Version;
}

/// Wall-clock versions in epoch milliseconds, strictly increasing within
/// this generator even if the clock stalls or steps back.
#[derive(Debug, Default)]
pub struct EpochMillisVersions {
    last: AtomicI64,
}

impl EpochMillisVersions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionGenerator for EpochMillisVersions {
    fn next_version(&self) -> Version {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return Version::new(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Deterministic counter, for tests and replays.
#[derive(Debug)]
pub struct SequentialVersions {
    next: AtomicI64,
}

impl SequentialVersions {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl VersionGenerator for SequentialVersions {
    fn next_version(&self) -> Version {
        Version::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_versions_never_repeat() {
        let generator = EpochMillisVersions::new();
        let versions: Vec<_> = (0..50).map(|_| generator.next_version()).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert!(versions[0].get() > 1_600_000_000_000);
    }

    #[test]
    fn sequential_versions_count_up() {
        let generator = SequentialVersions::starting_at(10);
        assert_eq!(generator.next_version(), Version::new(10));
        assert_eq!(generator.next_version(), Version::new(11));
    }
}
