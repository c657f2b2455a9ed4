//! Card system: attributes, definitions and registry.
//!
//! ## Key Types
//!
//! - `Stat` / `Keyword`: buffable attributes every entity carries
//! - `CardId`: Identifier for card definitions
//! - `CardDefinition`: Static card data (cost, kind, keywords, abilities)
//! - `CardRegistry`: Card definition lookup

pub mod attributes;
pub mod definition;
pub mod registry;

pub use attributes::{Keyword, Stat};
pub use definition::{CardDefinition, CardId, CardKind, ChosenTarget};
pub use registry::CardRegistry;
