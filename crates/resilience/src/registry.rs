//! Named strategies shared across an application.

use crate::circuit::CircuitBreakerStats;
use crate::strategy::ResilienceStrategy;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use tripwire_core::CircuitState;

/// Concurrent map of strategies keyed by name.
///
/// The registry is an ordinary value; create one and pass it to whoever
/// needs it.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: DashMap<String, Arc<ResilienceStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `strategy` under its own name, replacing any previous entry
    pub fn register(&self, strategy: ResilienceStrategy) -> Arc<ResilienceStrategy> {
        let strategy = Arc::new(strategy);
        self.strategies
            .insert(strategy.name().to_string(), Arc::clone(&strategy));
        strategy
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResilienceStrategy>> {
        self.strategies.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the strategy named `name`, creating it with `factory` if absent.
    ///
    /// `factory` runs while the entry is locked and must not call back into
    /// the registry.
    pub fn get_or_insert_with(
        &self,
        name: &str,
        factory: impl FnOnce() -> ResilienceStrategy,
    ) -> Arc<ResilienceStrategy> {
        let entry = self
            .strategies
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(factory()));
        Arc::clone(entry.value())
    }

    pub fn remove(&self, name: &str) -> Option<Arc<ResilienceStrategy>> {
        self.strategies.remove(name).map(|(_, strategy)| strategy)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .strategies
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Breaker statistics for every registered strategy, sorted by name
    pub fn snapshot(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<(String, CircuitBreakerStats)> = self
            .all()
            .into_iter()
            .map(|strategy| (strategy.name().to_string(), strategy.breaker().stats()))
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats.into_iter().map(|(_, stats)| stats).collect()
    }

    /// Reset every breaker, returning how many were not closed beforehand
    pub fn reset_all(&self) -> usize {
        let mut reset = 0;
        for strategy in self.all() {
            if strategy.breaker().state() != CircuitState::Closed {
                reset += 1;
            }
            strategy.reset();
        }
        info!(strategies = self.len(), reset, "Reset all circuit breakers");
        reset
    }

    // Snapshot the values so no shard lock is held while breakers notify listeners
    fn all(&self) -> Vec<Arc<ResilienceStrategy>> {
        self.strategies
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::OperationCategory;

    #[test]
    fn test_register_and_get() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());

        let registered =
            registry.register(ResilienceStrategy::for_category("gsx", OperationCategory::Gsx));
        let fetched = registry.get("gsx").unwrap();

        assert!(Arc::ptr_eq(&registered, &fetched));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("prosim").is_none());
    }

    #[test]
    fn test_register_replaces_existing_entry() {
        let registry = StrategyRegistry::new();
        let first =
            registry.register(ResilienceStrategy::for_category("net", OperationCategory::Network));
        let second =
            registry.register(ResilienceStrategy::for_category("net", OperationCategory::Default));

        assert_eq!(registry.len(), 1);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &registry.get("net").unwrap()));
    }

    #[test]
    fn test_get_or_insert_with_runs_factory_once() {
        let registry = StrategyRegistry::new();
        let mut built = 0;

        let a = registry.get_or_insert_with("sim", || {
            built += 1;
            ResilienceStrategy::for_category("sim", OperationCategory::Simulator)
        });
        let b = registry.get_or_insert_with("sim", || {
            built += 1;
            ResilienceStrategy::for_category("sim", OperationCategory::Simulator)
        });

        assert_eq!(built, 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_remove_and_names() {
        let registry = StrategyRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(ResilienceStrategy::for_category(name, OperationCategory::Default));
        }

        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
        assert!(registry.remove("mid").is_some());
        assert!(registry.remove("mid").is_none());
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_snapshot_and_reset_all() {
        let registry = StrategyRegistry::new();
        let b = registry.register(ResilienceStrategy::for_category("b", OperationCategory::Gsx));
        registry.register(ResilienceStrategy::for_category("a", OperationCategory::ProSim));
        let c = registry.register(ResilienceStrategy::for_category("c", OperationCategory::Network));

        b.breaker().trip();
        c.breaker().trip();

        let snapshot = registry.snapshot();
        let names: Vec<&str> = snapshot.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(snapshot[1].state, CircuitState::Open);

        assert_eq!(registry.reset_all(), 2);
        assert!(registry
            .snapshot()
            .iter()
            .all(|s| s.state == CircuitState::Closed));
        assert_eq!(registry.reset_all(), 0);
    }
}
