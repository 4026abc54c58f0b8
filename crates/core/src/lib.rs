//! EcoSort domain core.
//!
//! Pure classification, aggregation, scoring and ranking logic plus the
//! trait seams ([`detection::Detector`], [`frames::FrameSource`]) that the
//! API layer wires to real backends.

pub mod aggregation;
pub mod analytics;
pub mod classification;
pub mod detection;
pub mod error;
pub mod ffmpeg;
pub mod frames;
pub mod leaderboard;
pub mod media;
pub mod scoring;
pub mod types;
