//! Contact domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every contact is identified by its natural key `(first_name, last_name)`.
//! - Deletion is immediate; there are no tombstones.

pub mod contact;
