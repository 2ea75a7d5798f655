//! Opening and saving `.pptx` packages.

use crate::rels::{
    extract_slide_number, parse_relationships, rels_part_for, Relationship, NOTES_SLIDE_REL,
    SLIDE_LAYOUT_REL, SLIDE_MASTER_REL, SLIDE_REL,
};
use deckpatch_core::model::{InheritedPlaceholder, LayoutPlaceholders, PlaceholderRole, Shape};
use deckpatch_core::xml::XmlElement;
use deckpatch_core::{Document, Error, Result, Slide, SlideSize, XmlDocument};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// One archive entry, kept in its original position.
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An opened `.pptx` package: every entry in memory plus the slide model.
#[derive(Debug)]
pub struct PptxPackage {
    entries: Vec<PackageEntry>,
    document: Document,
}

impl PptxPackage {
    /// Read a package. `name` is reported as the document's source.
    pub fn open<R: Read + Seek>(reader: R, name: &str) -> Result<Self> {
        let entries = read_entries(reader)?;
        let mut loader = Loader {
            entries: &entries,
            layouts: HashMap::new(),
        };
        let document = loader.document(name)?;
        log::debug!(
            "Opened {} with {} slides ({} package entries)",
            name,
            document.slides.len(),
            entries.len()
        );
        Ok(Self { entries, document })
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::open(file, &name)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Write the package, re-serializing slide parts and copying every other
    /// entry verbatim.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let zip_err = |e: zip::result::ZipError| Error::ZipError(format!("Failed to write ZIP: {}", e));

        let slides: HashMap<&str, &Slide> = self
            .document
            .slides
            .iter()
            .map(|slide| (slide.part_name.as_str(), slide))
            .collect();

        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            let options = FileOptions::default().compression_method(match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            });
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options).map_err(zip_err)?;
                continue;
            }

            zip.start_file(entry.name.as_str(), options).map_err(zip_err)?;
            match slides.get(entry.name.as_str()) {
                Some(slide) => zip.write_all(slide.to_xml()?.as_bytes())?,
                None => zip.write_all(&entry.data)?,
            }
        }
        zip.finish().map_err(zip_err)
    }

    /// Save to a file. The archive is rendered in memory first, so a failure
    /// leaves any existing file untouched.
    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let buffer = self.write(Cursor::new(Vec::new()))?.into_inner();
        std::fs::write(path.as_ref(), buffer)?;
        log::debug!("Saved {}", path.as_ref().display());
        Ok(())
    }
}

fn read_entries<R: Read + Seek>(reader: R) -> Result<Vec<PackageEntry>> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;
        entries.push(PackageEntry {
            name: file.name().to_string(),
            data,
            compression: file.compression(),
            is_dir: file.is_dir(),
        });
    }
    Ok(entries)
}

/// Builds the slide model from package entries.
struct Loader<'a> {
    entries: &'a [PackageEntry],
    layouts: HashMap<String, LayoutPlaceholders>,
}

impl<'a> Loader<'a> {
    fn text(&self, part: &str) -> Option<Result<&'a str>> {
        self.entries
            .iter()
            .find(|entry| entry.name == part)
            .map(|entry| {
                std::str::from_utf8(&entry.data)
                    .map_err(|e| Error::DocumentOpen(format!("{} is not UTF-8: {}", part, e)))
            })
    }

    fn required_text(&self, part: &str) -> Result<&'a str> {
        self.text(part)
            .unwrap_or_else(|| Err(Error::DocumentOpen(format!("missing part {}", part))))
    }

    fn xml(&self, part: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.required_text(part)?)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", part, e)))
    }

    /// Relationships of a part; a part without a rels part has none.
    fn relationships(&self, part: &str) -> Result<Vec<Relationship>> {
        match self.text(&rels_part_for(part)) {
            Some(text) => parse_relationships(text?, part),
            None => Ok(Vec::new()),
        }
    }

    fn document(&mut self, name: &str) -> Result<Document> {
        let presentation = self.xml(PRESENTATION_PART)?;
        let rels = self.relationships(PRESENTATION_PART)?;
        let slide_size = slide_size(&presentation.root);

        let mut document = Document::new(name).with_slide_size(slide_size);
        for (i, (part, id)) in slide_order(&presentation.root, &rels)?.into_iter().enumerate() {
            let slide = self.slide(i + 1, &part)?.with_id(id);
            document.add_slide(slide);
        }
        Ok(document)
    }

    fn slide(&mut self, number: usize, part: &str) -> Result<Slide> {
        let slide = Slide::from_xml(number, part, self.required_text(part)?)?;
        let rels = self.relationships(part)?;

        let notes = match rels.iter().find(|r| r.is(NOTES_SLIDE_REL)) {
            Some(rel) => self.notes(&rel.target)?,
            None => None,
        };
        let layout = match rels.iter().find(|r| r.is(SLIDE_LAYOUT_REL)) {
            Some(rel) => self.layout(&rel.target)?,
            None => LayoutPlaceholders::default(),
        };
        Ok(slide.with_notes(notes).with_layout(layout))
    }

    /// Text of the notes body placeholder.
    fn notes(&self, part: &str) -> Result<Option<String>> {
        if self.text(part).is_none() {
            log::warn!("Notes part {} is missing", part);
            return Ok(None);
        }
        let xml = self.xml(part)?;
        let empty = LayoutPlaceholders::default();
        let text = placeholder_shapes(&xml.root, &empty)
            .into_iter()
            .find(|shape| {
                shape
                    .placeholder()
                    .is_some_and(|ph| ph.role == PlaceholderRole::Body)
            })
            .and_then(|shape| shape.text_frame())
            .map(|frame| frame.text().trim().to_string());
        Ok(text)
    }

    /// Placeholder geometry of a layout, completed from its master.
    fn layout(&mut self, part: &str) -> Result<LayoutPlaceholders> {
        if let Some(cached) = self.layouts.get(part) {
            return Ok(cached.clone());
        }
        if self.text(part).is_none() {
            log::warn!("Slide layout {} is missing", part);
            return Ok(LayoutPlaceholders::default());
        }

        let master = match self
            .relationships(part)?
            .into_iter()
            .find(|r| r.is(SLIDE_MASTER_REL))
        {
            Some(rel) if self.text(&rel.target).is_some() => {
                let xml = self.xml(&rel.target)?;
                inherited_placeholders(&xml.root, &LayoutPlaceholders::default())
            }
            _ => LayoutPlaceholders::default(),
        };

        let xml = self.xml(part)?;
        let layout = inherited_placeholders(&xml.root, &master);
        self.layouts.insert(part.to_string(), layout.clone());
        Ok(layout)
    }
}

fn slide_size(presentation: &XmlElement) -> SlideSize {
    let Some(size) = presentation.child("sldSz") else {
        return SlideSize::default();
    };
    let dimension = |key: &str| size.attr(key).and_then(|v| v.parse::<i64>().ok());
    match (dimension("cx"), dimension("cy")) {
        (Some(cx), Some(cy)) if cx > 0 && cy > 0 => SlideSize { cx, cy },
        _ => SlideSize::default(),
    }
}

/// Slide parts in presentation order with their ids.
///
/// The slide id list is authoritative. Without one, slide relationships
/// are ordered by the number in their id or target.
fn slide_order(presentation: &XmlElement, rels: &[Relationship]) -> Result<Vec<(String, Option<u32>)>> {
    let listed: Vec<&XmlElement> = presentation
        .child("sldIdLst")
        .map(|list| list.children_named("sldId").collect())
        .unwrap_or_default();

    if !listed.is_empty() {
        return listed
            .into_iter()
            .map(|entry| {
                // the relationship id is namespaced, usually `r:id`
                let rel_id = entry
                    .attributes
                    .iter()
                    .find(|(key, _)| key.ends_with(":id"))
                    .map(|(_, value)| value.as_str())
                    .unwrap_or_default();
                let rel = rels
                    .iter()
                    .find(|r| r.id == rel_id)
                    .ok_or_else(|| {
                        Error::DocumentOpen(format!("slide relationship {} not found", rel_id))
                    })?;
                let id = entry.attr("id").and_then(|v| v.parse().ok());
                Ok((rel.target.clone(), id))
            })
            .collect();
    }

    log::debug!("No slide id list; ordering slides by relationship number");
    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|r| r.is(SLIDE_REL))
        .map(|r| {
            let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            (r.target.clone(), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| (path, None)).collect())
}

/// Top-level placeholder shapes of a slide, layout, master or notes part.
fn placeholder_shapes<'a>(root: &'a XmlElement, inherited: &'a LayoutPlaceholders) -> Vec<Shape<'a>> {
    root.find(&["cSld", "spTree"])
        .map(|tree| {
            tree.elements()
                .map(|el| Shape::new(el, inherited))
                .filter(|shape| shape.placeholder().is_some())
                .collect()
        })
        .unwrap_or_default()
}

fn inherited_placeholders(root: &XmlElement, inherited: &LayoutPlaceholders) -> LayoutPlaceholders {
    let entries = placeholder_shapes(root, inherited)
        .into_iter()
        .filter_map(|shape| {
            Some(InheritedPlaceholder {
                placeholder: shape.placeholder()?,
                geometry: shape.geometry(),
            })
        })
        .collect();
    LayoutPlaceholders::new(entries)
}
