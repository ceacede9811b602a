//! Core business logic - framework-agnostic ledger operations
//!
//! Everything here takes a database connection and plain inputs, so the web
//! layer and the command-line tasks share the same rules.

/// Record form binding and field messages
pub mod form;
/// Record listing filters and pagination
pub mod filter;
/// Type → category → subcategory consistency rule
pub mod hierarchy;
/// Dependent choice lists for cascading selectors
pub mod lookup;
/// Cash-flow record operations
pub mod record;
/// Status, type, category and subcategory management
pub mod reference;
/// Reference data seeding and subcategory backfill
pub mod seed;
