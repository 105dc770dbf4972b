//! Common utilities shared across macro modules.
//!
//! `syn` type-shape helpers. `option_inner` backs the `Model` derive's
//! type-inference fallback (unwrapping `Option<T>` before inferring a
//! `FieldKind` from `T`).

pub mod syn_types;
