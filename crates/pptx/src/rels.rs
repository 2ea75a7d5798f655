//! Package relationship parts (`_rels/*.rels`) and part-name arithmetic.

use deckpatch_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

pub const SLIDE_REL: &str = "/slide";
pub const SLIDE_LAYOUT_REL: &str = "/slideLayout";
pub const SLIDE_MASTER_REL: &str = "/slideMaster";
pub const NOTES_SLIDE_REL: &str = "/notesSlide";

/// One `Relationship` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Target resolved to a package part name.
    pub target: String,
}

impl Relationship {
    /// Whether the relationship type ends with the given suffix, e.g. `/slide`.
    pub fn is(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Parse a relationships part belonging to `source_part`.
///
/// Targets are resolved against the source part's directory; external
/// targets (hyperlinks) are dropped.
pub fn parse_relationships(xml: &str, source_part: &str) -> Result<Vec<Relationship>> {
    let base = part_directory(source_part);
    let mut relationships = Vec::new();

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();
                let mut external = false;

                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                    match attr.key.as_ref() {
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"Id" => id = value,
                        b"TargetMode" => external = value == "External",
                        _ => {}
                    }
                }

                if !external {
                    relationships.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(base, &target),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships of {}: {}",
                    source_part, e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// The relationships part describing `part`'s outgoing links.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target into an absolute part name without a
/// leading slash, collapsing `.` and `..` segments.
pub fn resolve_target(base: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base.is_empty() => target.to_string(),
        None => format!("{}/{}", base, target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
pub fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
