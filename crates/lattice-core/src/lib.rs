//! Core types for the Lattice document database.
//!
//! This crate contains the backend-agnostic domain model: identifiers,
//! collections, documents, schemas, field constraints, the JSON flattener,
//! schema fingerprinting, the constraint validator, and the search and
//! enumeration query/result types.

pub mod collection;
pub mod constraint;
pub mod document;
pub mod enums;
pub mod envelope;
pub mod fingerprint;
pub mod flatten;
pub mod ids;
pub mod indexing;
pub mod query;
pub mod schema;
pub mod validation;
