//! Building blocks the report queries are assembled from.
//!
//! - [`filter()`] / [`DescriptionFilter`]: streaming record predicates
//! - [`GroupedReducer`]: per-key running totals in first-seen order
//! - [`top_n`] / [`bottom_n`]: stable ranking
//!
//! ## Example: grouped sum → top-N
//!
//! ```rust
//! use prescribing_store::processing::{top_n, GroupedReducer, ReduceOp};
//!
//! let mut by_postcode = GroupedReducer::new();
//! by_postcode.push("N1".to_string(), 12.0);
//! by_postcode.push("S1".to_string(), 9.0);
//! by_postcode.push("N1".to_string(), 1.0);
//!
//! let ranked = top_n(by_postcode.into_groups(), 1, |g| g.sum);
//! assert_eq!(ranked[0].key, "N1");
//! assert_eq!(ranked[0].reduce(ReduceOp::Sum), Some(13.0));
//! ```

pub mod filter;
pub mod reduce;

pub use filter::{filter, DescriptionFilter};
pub use reduce::{bottom_n, mean, top_n, Group, GroupedReducer, ReduceOp};
