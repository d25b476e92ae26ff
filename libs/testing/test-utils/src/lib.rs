//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with a per-test database (feature: "mongo")
//! - `TestNats`: NATS container with JetStream enabled (feature: "nats")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! Container-backed tests need Docker; the workspace marks them `#[ignore]`
//! and runs them with `cargo test -- --ignored`.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["mongo"] }
//! ```
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let db = mongo.database();
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!
//!     let vehicle = builder.object_id_hex(0);
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "nats")]
mod nats;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

#[cfg(feature = "nats")]
pub use nats::TestNats;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_track_vehicle");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// A 24-digit hex string that parses as a MongoDB ObjectId.
    ///
    /// Different `index` values give different ids for the same seed.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let id = TestDataBuilder::new(7).object_id_hex(1);
    /// assert_eq!(id.len(), 24);
    /// ```
    pub fn object_id_hex(&self, index: u32) -> String {
        format!("{:016x}{:08x}", self.seed, index)
    }

    /// Generate a unique name for testing
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(12345);
    /// assert_eq!(builder.name("queue", "in"), "test-queue-12345-in");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that `id` is a 24-digit lowercase hex identifier
    pub fn assert_hex_id(id: &str, context: &str) {
        assert!(
            id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit()),
            "{}: expected a 24-digit hex id, got {:?}",
            context,
            id
        );
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.object_id_hex(0), builder2.object_id_hex(0));
        assert_eq!(builder1.name("queue", "in"), builder2.name("queue", "in"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.object_id_hex(0), builder2.object_id_hex(0));
    }

    #[test]
    fn object_ids_are_hex_and_distinct_per_index() {
        let builder = TestDataBuilder::from_test_name("ids");
        let a = builder.object_id_hex(0);
        let b = builder.object_id_hex(1);

        assertions::assert_hex_id(&a, "first id");
        assertions::assert_hex_id(&b, "second id");
        assert_ne!(a, b);
    }
}
