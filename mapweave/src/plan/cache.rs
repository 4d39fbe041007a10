//! Plan storage shared across mapping calls.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use super::TypePlan;
use crate::value::TypeKey;

/// Storage for built plans.
///
/// Entries are written once; a later `put_if_absent` for the same key keeps
/// the stored plan and returns it.
pub trait PlanCache: Send + Sync {
    /// Plan stored for `key`.
    fn get(&self, key: &TypeKey) -> Option<Arc<TypePlan>>;

    /// Stores `plan` unless an entry exists, returning the stored plan.
    fn put_if_absent(&self, key: TypeKey, plan: Arc<TypePlan>) -> Arc<TypePlan>;
}

/// In-process plan cache.
#[derive(Debug, Default)]
pub struct MemoryPlanCache {
    plans: RwLock<HashMap<TypeKey, Arc<TypePlan>>>,
}

impl MemoryPlanCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }
}

impl PlanCache for MemoryPlanCache {
    fn get(&self, key: &TypeKey) -> Option<Arc<TypePlan>> {
        self.plans.read().get(key).cloned()
    }

    fn put_if_absent(&self, key: TypeKey, plan: Arc<TypePlan>) -> Arc<TypePlan> {
        Arc::clone(self.plans.write().entry(key).or_insert(plan))
    }
}
