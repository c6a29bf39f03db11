//! Track acquisition.
//!
//! A track moves through three stages: the [`selector`] decides how it can be
//! retrieved, the [`segments`] assembler or the [`direct`] downloader puts
//! the audio on disk, and the [`acquire`] orchestrator names, tags and
//! finalizes the file. External tools sit behind the [`Remuxer`] and
//! [`Tagger`] traits so they can be swapped out in tests.

pub mod acquire;
pub mod direct;
pub mod remux;
pub mod segments;
pub mod selector;
pub mod tags;

pub use acquire::{
    AcquisitionOptions, AcquisitionOrchestrator, AcquisitionResult, BatchReport,
    CollectionContext, SkipReason,
};
pub use direct::DirectDownloader;
pub use remux::{FfmpegRemuxer, Remuxer};
pub use segments::{SegmentAssembler, SegmentManifest};
pub use selector::{Entitlement, QualityTier, RetrievalPlan};
pub use tags::{ContainerTagger, TagWriter, Tagger};
