//! Core model, paragraph addressing and rewriting for slide presentations.
//!
//! Extraction linearizes each slide into reading order, picks its title and
//! numbers every significant paragraph three ways. Modification maps change
//! requests back onto live paragraphs through the same numbering, falling
//! back to text search, and finishes with a presentation-wide style pass.

pub mod apply;
pub mod change;
pub mod error;
pub mod extract;
pub mod index;
pub mod locate;
pub mod model;
pub mod modify;
pub mod normalize;
pub mod order;
pub mod settings;
pub mod style;
pub mod suggest;
pub mod title;
pub mod types;
pub mod units;
pub mod xml;

#[cfg(test)]
mod testing;

pub use apply::{ChangeApplier, ChangeOutcome};
pub use change::{Change, ModificationRequest, SlideModification, TargetType};
pub use error::{Error, ErrorKind, Result};
pub use extract::{ExtractionPayload, ParagraphExtractor, SlideRecord};
pub use locate::{LocatorResolver, SkipReason};
pub use modify::{apply_modifications, ModificationReport};
pub use normalize::MatchMode;
pub use settings::{StyleOverrides, StyleSettings};
pub use style::StyleNormalizer;
pub use suggest::{
    merge_refined, plan_modifications, refine_view, suggestions_from_value, Suggestion,
};
pub use types::{Document, Slide, SlideSize};
pub use xml::XmlDocument;
