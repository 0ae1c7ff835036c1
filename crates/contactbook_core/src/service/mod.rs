//! Core use-case services.
//!
//! # Responsibility
//! - Own the storage engine instance that callers share.
//! - Keep boundary layers decoupled from connection handling.

pub mod contact_book;
