//! `ck-core` — foundational types shared by every `ck-*` crate.
//!
//! This crate is a dependency of every other crate in the workspace. It
//! intentionally has no `ck-*` dependencies, mirroring `dt-core`'s role in
//! `rust_dt`.
//!
//! # What lives here
//!
//! | Module   | Contents                                              |
//! |----------|---------------------------------------------------------|
//! | [`ids`]  | `EntityId`, `EntityAllocator`                          |
//! | [`value`]| `Value` (the dynamic structured tree), JSON interop     |
//! | [`time`] | `Turn`                                                 |

pub mod ids;
pub mod time;
pub mod value;

#[cfg(test)]
mod tests;

pub use ids::{EntityAllocator, EntityId};
pub use time::Turn;
pub use value::{format_path, value_from_json, value_to_json, PathSegment, Value};
