//! # foundry-state
//!
//! Whole-document persistence for pipeline state.
//!
//! A [`StateStore`] loads and saves the entire [`StateDocument`] in one
//! operation; no field-level merge is ever attempted. Correctness of the
//! read-then-overwrite cycle depends on the pipeline lock, not on the store.
//! Variants: local file, HTTP object store, in-memory.

pub mod error;
pub mod http;
pub mod store;

pub use error::StateError;
pub use http::HttpStateStore;
pub use store::{
    state_from_config, LocalStateStore, MemoryStateStore, StateConfig, StateStore,
    DEFAULT_STATE_KEY, DEFAULT_STATE_PATH,
};
