use dashmap::DashMap;

use crate::models::PlanDocument;

/// Completed plans keyed by plan id. Each id is written once.
#[derive(Debug, Default)]
pub struct PlanStore {
    plans: DashMap<String, PlanDocument>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, id: impl Into<String>, plan: PlanDocument) {
        self.plans.insert(id.into(), plan);
    }

    pub fn get(&self, id: &str) -> Option<PlanDocument> {
        self.plans.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
