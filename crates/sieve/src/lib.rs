//! Sieve - Challenge-Set Filtering Engine
//!
//! Keeps several independent filter predicates over one challenge set of
//! translation samples, intersects them into the visible sample list, and
//! derives every chart's counts, the highlighted sentence list and the export
//! from that list.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod intersection;
pub mod keywords;
pub mod lookup;
pub mod plots;
pub mod predicates;
pub mod store;
pub mod view;

pub use catalog::{ChallengeSet, ChallengeSetMeta, ChallengeSetType, HeaderKey};
pub use config::ViewConfig;
pub use error::{Result, SieveError};
pub use export::ExportPayload;
pub use filters::{FilterRegistry, FilterTag, FilterType, GroupSet};
pub use intersection::visible_indexes;
pub use lookup::{IntersectionData, SourceIdMap, REDACTED_LABEL};
pub use plots::{plot_handlers, ChartData, PlotHandlers, PlotType};
pub use predicates::Region;
pub use store::{ChallengeData, RecordStore};
pub use view::{ScoreMetric, SetView, SharedSetView, ViewSnapshot};
