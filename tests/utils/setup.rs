#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use gamification::{
    catalog::Catalog, clock::ManualClock, config::EngineConfig, engine::GamificationEngine,
};

use super::mocks::MockStorage;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub engine: Arc<GamificationEngine>,
    pub storage: Arc<MockStorage>,
    pub clock: Arc<ManualClock>,
}

pub struct TestSetupBuilder {
    catalog: Catalog,
    config: EngineConfig,
}

impl TestSetupBuilder {
    /// Starts from an empty catalog: no points, achievements, rewards or triggers
    pub fn new() -> Self {
        Self {
            catalog: Catalog::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_catalog_json(mut self, json: &str) -> Self {
        self.catalog = Catalog::from_json(json).unwrap();
        self
    }

    pub fn with_builtin_catalog(mut self) -> Self {
        self.catalog = Catalog::builtin().unwrap();
        self
    }

    /// 50 points per project application and nothing else
    pub fn with_application_points(self) -> Self {
        self.with_catalog_json(r#"{"point_table": {"project_application_submitted": 50}}"#)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestSetup {
        let storage = Arc::new(MockStorage::new());
        let clock = Arc::new(ManualClock::default());

        let engine = GamificationEngine::builder(storage.clone())
            .with_catalog(self.catalog)
            .with_config(self.config)
            .with_clock(clock.clone())
            .build()
            .unwrap();

        TestSetup {
            engine: Arc::new(engine),
            storage,
            clock,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
