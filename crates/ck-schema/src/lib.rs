//! `ck-schema` — component schema loading and validation.
//!
//! | Module      | Contents                                         |
//! |-------------|---------------------------------------------------|
//! | [`node`]    | `SchemaNode`: the schema grammar and validator     |
//! | [`registry`]| `SchemaRegistry`: loads/holds schemas by kind       |
//! | [`error`]   | `SchemaError`, `SchemaResult`                      |

pub mod error;
pub mod node;
pub mod registry;

#[cfg(test)]
mod tests;

pub use error::{SchemaError, SchemaResult};
pub use node::SchemaNode;
pub use registry::SchemaRegistry;
