//! lumen-api-core
//!
//! Shared value model for the Lumen runtime: the [`Value`] enum used by node
//! scripts, keyframes and layer properties, best-effort [`coercion`] helpers,
//! and the dotted [`DataPath`] addressing scheme for plugin data-model lookups.

pub mod coercion;
pub mod data_path;
pub mod value;

pub use data_path::DataPath;
pub use value::{Value, ValueKind};
