//! Shape-keyed schema cache.
//!
//! Two slots: one pinned to the default shape (the initial page load) and one
//! for the most recent non-default shape. A non-default store replaces only
//! the shaped slot; the default slot changes only when the default shape is
//! fetched again.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::schema::{FormSchema, ShapeParams};

/// A cached schema with the key it was fetched under.
#[derive(Debug, Clone)]
pub struct CachedSchema {
    pub params: ShapeParams,
    pub schema: Arc<FormSchema>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    default_slot: Option<CachedSchema>,
    shaped_slot: Option<CachedSchema>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, params: &ShapeParams) -> Option<&CachedSchema> {
        let slot = if params.is_default() {
            self.default_slot.as_ref()
        } else {
            self.shaped_slot.as_ref()
        };
        slot.filter(|c| c.params == *params)
    }

    /// Schema cached under exactly `params`.
    pub fn get(&self, params: &ShapeParams) -> Option<Arc<FormSchema>> {
        self.slot(params).map(|c| Arc::clone(&c.schema))
    }

    pub fn entry(&self, params: &ShapeParams) -> Option<&CachedSchema> {
        self.slot(params)
    }

    /// Whether a load with `params` needs a network fetch.
    pub fn requires_fetch(&self, params: &ShapeParams) -> bool {
        self.slot(params).is_none()
    }

    pub fn put(&mut self, params: ShapeParams, schema: Arc<FormSchema>) {
        let entry = CachedSchema {
            params,
            schema,
            fetched_at: Utc::now(),
        };
        if params.is_default() {
            self.default_slot = Some(entry);
        } else {
            self.shaped_slot = Some(entry);
        }
    }

    /// Drop both slots.
    pub fn invalidate(&mut self) {
        self.default_slot = None;
        self.shaped_slot = None;
    }

    /// Keys currently cached.
    pub fn keys(&self) -> Vec<ShapeParams> {
        [&self.default_slot, &self.shaped_slot]
            .into_iter()
            .flatten()
            .map(|c| c.params)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.default_slot.is_none() && self.shaped_slot.is_none()
    }
}
