//! # signet-kernel: The signature state engine
//!
//! The engine is the pure, deterministic heart of the tracker. It consumes
//! audit events and maintains the forest of signature obligations; sink
//! writes are returned as effects for the caller to execute.
//!
//! ## Key Principles
//!
//! - **No IO**: the engine never touches disk; the SQLite write points of
//!   a signing transaction come back as [`Effect`]s
//! - **Deterministic**: same events, same configuration order, same forest
//! - **Ordered state**: nodes, covered plates and field changes live in
//!   ordered maps, so iteration order is the report order
//!
//! ## Architecture
//!
//! - [`node`]: the tracked objects (`SigNode`, `CoveredPlate`, `FieldChange`)
//! - [`engine`]: configuration matching and event dispatch
//! - [`effects`]: sink rows produced by signing transactions
//! - [`evaluate`]: the end-of-run status propagation pass

pub mod effects;
pub mod engine;
pub mod evaluate;
pub mod node;


pub use effects::{Effect, SigningRow, ValueRow};
pub use engine::Engine;
pub use evaluate::{EvaluatePolicies, evaluate};
pub use node::{CoveredPlate, FieldChange, NodeKey, SigField, SigNode, StatusVocabulary};
