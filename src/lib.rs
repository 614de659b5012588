#![doc = "Administrative-unit boundary matching against a reference boundary network and landmask"]
pub mod cli;
pub mod commands;
pub mod error;
pub mod geom;
pub mod io;
pub mod matching;
pub mod network;
pub mod params;
pub mod reference;
pub mod shapelog;
pub mod store;

#[doc(inline)]
pub use error::{MatchingError, ResultDefect};

#[doc(inline)]
pub use matching::{AuMatcher, AuOutcome, References, RingMatcher, RingOutcome, Summary};

#[doc(inline)]
pub use network::{BoundaryNetwork, LineNetwork};

#[doc(inline)]
pub use params::{Config, Tolerances};

#[doc(inline)]
pub use reference::ReferenceData;

#[doc(inline)]
pub use store::{Feature, FeatureFilter, FeatureStore, GeoJsonStore, MemoryStore, Predicate};
