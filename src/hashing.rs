//! Deterministic `HashMap` and `HashSet` variants. The hashing data structures in the standard
//! library are randomly seeded per process; everything iterated by the engine must not depend on
//! that, so the crate uses `rustc-hash`'s `FxHasher` throughout.
//!
//! `HashMap<K, V, S>` does not have a `new` method for a custom hasher. Use `HashMap::default()`.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
