//! Snowflake-keyed entity cache
//!
//! Uses `DashMap` for concurrent access. A cache can be wired to an
//! [`EventCache`] so that inserting an entity replays the events that were
//! waiting for it.

use crate::events::EventCache;
use chat_core::{DomainError, DomainResult, EntityCategory, Snowflake};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent map of entities by ID
pub struct SnowflakeCache<T> {
    elements: DashMap<Snowflake, Arc<T>>,
    name_mapper: Option<fn(&T) -> &str>,
    replay: Option<(EntityCategory, Arc<EventCache>)>,
}

impl<T> SnowflakeCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: DashMap::new(),
            name_mapper: None,
            replay: None,
        }
    }

    /// Enable [`elements_by_name`](Self::elements_by_name)
    #[must_use]
    pub fn with_name_mapper(mut self, mapper: fn(&T) -> &str) -> Self {
        self.name_mapper = Some(mapper);
        self
    }

    /// Replay events deferred under `category` whenever an entity is inserted
    #[must_use]
    pub fn with_replay(mut self, category: EntityCategory, events: Arc<EventCache>) -> Self {
        self.replay = Some((category, events));
        self
    }

    pub fn get(&self, id: Snowflake) -> Option<Arc<T>> {
        self.elements.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Like [`get`](Self::get) but fails with a not-found error
    pub fn require(&self, category: EntityCategory, id: Snowflake) -> DomainResult<Arc<T>> {
        self.get(id)
            .ok_or(DomainError::EntityNotFound { category, id })
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.elements.contains_key(&id)
    }

    /// Insert or replace an entity, then replay events waiting for it
    ///
    /// Returns the previous entity with that ID, if any.
    pub fn insert(&self, id: Snowflake, entity: T) -> Option<Arc<T>> {
        let previous = self.elements.insert(id, Arc::new(entity));

        if let Some((category, events)) = &self.replay {
            events.play(*category, id);
        }

        previous
    }

    pub fn remove(&self, id: Snowflake) -> Option<Arc<T>> {
        self.elements.remove(&id).map(|(_, entity)| entity)
    }

    /// Remove an entity that will not come back, dropping events that were
    /// still waiting for it
    pub fn discard(&self, id: Snowflake) -> Option<Arc<T>> {
        let removed = self.remove(id);

        if let Some((category, events)) = &self.replay {
            events.clear(*category, id);
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> Vec<Snowflake> {
        self.elements.iter().map(|entry| *entry.key()).collect()
    }

    /// Entities whose name equals `name`
    ///
    /// Fails with [`DomainError::UnsupportedOperation`] if the cache has no
    /// name mapper.
    pub fn elements_by_name(&self, name: &str, ignore_case: bool) -> DomainResult<Vec<Arc<T>>> {
        let mapper = self
            .name_mapper
            .ok_or(DomainError::UnsupportedOperation("name lookup on unnamed cache"))?;

        let wanted = if ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        };

        Ok(self
            .elements
            .iter()
            .filter(|entry| {
                let candidate = mapper(entry.value());
                if ignore_case {
                    candidate.to_lowercase() == wanted
                } else {
                    candidate == wanted
                }
            })
            .map(|entry| Arc::clone(entry.value()))
            .collect())
    }
}

impl<T> Default for SnowflakeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SnowflakeCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeCache")
            .field("len", &self.elements.len())
            .field("named", &self.name_mapper.is_some())
            .field("replay", &self.replay.as_ref().map(|(category, _)| *category))
            .finish()
    }
}
