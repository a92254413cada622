//! Profile classification
//!
//! Decides whether a fetched GitHub profile becomes a resume record, and
//! derives the record's skills, proficiency tier, experience level, and top
//! repositories. Nothing here performs I/O.

mod classifier;
mod record;
pub mod scoring;
pub mod skills;

pub use classifier::{Classification, Classifier, FetchedProfile, RejectReason};
pub use record::{ExperienceLevel, ProficiencyTier, ProfileRecord, TopRepo};
