//! PPTX (Office Open XML) package backend.
//!
//! A .pptx file is a ZIP archive of XML parts. This crate loads the slide
//! parts (with their notes and layout geometry) into the core object model
//! and writes the mutated parts back into an otherwise untouched archive.

pub mod package;
pub mod rels;

pub use package::PptxPackage;

use deckpatch_core::{
    apply_modifications, ExtractionPayload, ModificationReport, ModificationRequest,
    ParagraphExtractor, Result,
};
use std::path::Path;

/// Extract the paragraph payload of a .pptx file.
pub fn extract_path(path: impl AsRef<Path>) -> Result<ExtractionPayload> {
    let package = PptxPackage::open_path(path)?;
    Ok(ParagraphExtractor::extract(package.document()))
}

/// Apply a modification payload to `input` and save the result to `output`.
///
/// Nothing is written when opening or payload validation fails.
pub fn modify_path(
    input: impl AsRef<Path>,
    request: &ModificationRequest,
    output: impl AsRef<Path>,
) -> Result<ModificationReport> {
    let mut package = PptxPackage::open_path(input)?;
    let report = apply_modifications(package.document_mut(), request)?;
    package.save_path(output)?;
    Ok(report)
}
