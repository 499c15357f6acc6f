//! Catalog search for tendero.
//!
//! A deterministic query builder maps extracted attribute records to
//! search strings, and a thin Storefront GraphQL client runs them against
//! the shop.

pub mod query;
pub mod storefront;

pub use query::build_query;
pub use storefront::StorefrontClient;
