//! `ck-map` — cell adjacency, per-cell metadata, reverse position index,
//! and shortest-path search.
//!
//! | Module       | Contents                                    |
//! |---------------|----------------------------------------------|
//! | [`index`]     | `MapIndex`, `CellKey`, `Topology`           |
//! | [`pathfind`]  | `find_path`, `PathResult`                   |
//! | [`error`]     | `MapError`, `MapResult`                     |

pub mod error;
pub mod index;
pub mod pathfind;


pub use error::{MapError, MapResult};
pub use index::{CellKey, MapIndex, Topology};
pub use pathfind::{find_path, PathResult};
