//! Pipeline module - loading, recoding, classification and weighted aggregation

pub mod analysis;
pub mod attitudes;
pub mod binning;
pub mod cell;
pub mod cohorts;
pub mod config;
pub mod endorsement;
pub mod error;
pub mod generation;
pub mod index;
pub mod items;
pub mod loader;
pub mod regime;
pub mod respondent;
pub mod stats;
pub mod weights;

pub use analysis::*;
pub use attitudes::*;
pub use binning::*;
pub use cell::*;
pub use cohorts::*;
pub use config::*;
pub use endorsement::*;
pub use error::*;
pub use generation::*;
pub use index::*;
pub use items::*;
pub use loader::*;
pub use regime::*;
pub use respondent::*;
pub use stats::*;
pub use weights::*;
