//! Workflow configuration.
//!
//! # Environment variables
//!
//! | variable | default | meaning |
//! |----------|---------|---------|
//! | `RENTPOINT_ID_STRATEGY` | `sequential` | `sequential` or `random` |
//! | `RENTPOINT_ID_START` | `1000` | first sequential id |
//! | `RENTPOINT_EVENT_QUEUE_CAPACITY` | `1024` | bounded publisher queue |
//! | `RENTPOINT_EXPIRY_POLICY` | `lazy` | `lazy` or `disabled` |
//! | `RENTPOINT_SEED_DEMO` | `true` | load the demo catalogue at startup |
//!
//! Unset or unparsable values fall back to the default.

use crate::availability::ExpiryPolicy;
use crate::id_allocator::IdStrategy;

pub const DEFAULT_ID_START: u64 = 1000;
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub id_strategy: IdStrategy,
    pub id_start: u64,
    pub event_queue_capacity: usize,
    pub expiry_policy: ExpiryPolicy,
    pub seed_demo: bool,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self {
            id_strategy: env_parse("RENTPOINT_ID_STRATEGY").unwrap_or_default(),
            id_start: env_parse("RENTPOINT_ID_START").unwrap_or(DEFAULT_ID_START),
            event_queue_capacity: env_parse("RENTPOINT_EVENT_QUEUE_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or(DEFAULT_EVENT_QUEUE_CAPACITY),
            expiry_policy: env_parse("RENTPOINT_EXPIRY_POLICY").unwrap_or_default(),
            seed_demo: env_parse("RENTPOINT_SEED_DEMO").unwrap_or(true),
        }
    }

    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    pub fn with_id_start(mut self, start: u64) -> Self {
        self.id_start = start;
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity.max(1);
        self
    }

    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    pub fn with_seed_demo(mut self, seed: bool) -> Self {
        self.seed_demo = seed;
        self
    }
}

impl Default for WorkflowConfig {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Sequential,
            id_start: DEFAULT_ID_START,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            expiry_policy: ExpiryPolicy::Lazy,
            seed_demo: true,
        }
    }
}
