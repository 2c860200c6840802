//! Team to club mapping
//!
//! [`MappingTable`] holds the configured rules, [`ReferenceData`] the clubs,
//! teams and leagues read from the store, and [`MappingResolver`] combines
//! both to resolve one record.

pub mod reference;
pub mod resolver;
pub mod table;

pub use reference::ReferenceData;
pub use resolver::{MappingResolver, ResolvedClub};
pub use table::MappingTable;
