use crate::error::SyncError;
use model::core::identifiers::StreamId;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Tuning for a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Rows per keyset page (`LIMIT`). Must be non-zero.
    pub batch_size: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SyncSettings {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn validate(&self, stream: &StreamId) -> Result<(), SyncError> {
        if self.batch_size == 0 {
            return Err(SyncError::configuration(stream, "batch_size must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected() {
        let stream = StreamId::new("s");
        assert!(SyncSettings::default().validate(&stream).is_ok());
        assert!(matches!(
            SyncSettings::default().with_batch_size(0).validate(&stream),
            Err(SyncError::Configuration { .. })
        ));
    }
}
