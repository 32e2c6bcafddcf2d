//! survey-stitch library - cross-client report aggregation
//!
//! Reads a tag's manifest, every result file it references and the field
//! schema export, and publishes one report in four formats: JSON, CSV, HTML
//! and a `.tar.gz` bundle of the other three.

pub mod admin;
pub mod error;
pub mod publish;
pub mod report;
pub mod stitch;

pub use admin::{bundle, Artifact, BundleOutput, BundleRequest};
pub use error::{Result, StitchError};
pub use publish::OutputPaths;
pub use stitch::{Inputs, LabelStyle, Report, Response, StitchObject, StitchResult, NO_RESPONSE};
