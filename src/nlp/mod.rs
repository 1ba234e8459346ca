//! Deterministic text analysis ahead of generation
//!
//! Query text -> normalize -> classify intent + extract entities.
//! Nothing here touches the network.

pub mod extractor;
pub mod normalizer;

pub use extractor::{analyze, classify_intent, extract_entities, numbers_in};
pub use normalizer::normalize;
