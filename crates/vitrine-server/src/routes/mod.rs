//! REST routes for the product catalog and session administration.
//!
//! Every response uses the `{success, count?, message?, data?}` envelope;
//! failures go through [`crate::error::ApiError`] with the same shape.

pub mod products;
pub mod sessions;
