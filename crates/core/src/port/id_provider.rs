// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique id suffix; callers add the entity prefix (`job-`, `candidate-`, ...)
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Prefix an id suffix with its entity kind.
pub fn prefixed(ids: &dyn IdProvider, prefix: &str) -> String {
    format!("{}-{}", prefix, ids.generate_id())
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Yields "1", "2", "3", ...
    #[derive(Default)]
    pub struct SequentialIdProvider {
        next: AtomicU64,
    }

    impl SequentialIdProvider {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> String {
            (self.next.fetch_add(1, Ordering::SeqCst) + 1).to_string()
        }
    }
}
