//! Paragraph-level extraction payload.

use crate::index::SlideIndex;
use crate::model::{Alignment, Geometry, Paragraph, Shape, ShapeKind, ShapeType, Table};
use crate::order::OrderedShape;
use crate::types::{Document, Slide, SlideSize};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Fraction of the slide height treated as header or footer band.
const HEADER_FOOTER_BAND: f64 = 0.1;

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    pub file: String,
    pub total_slides: usize,
    pub slides: Vec<SlideRecord>,
}

impl ExtractionPayload {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Extracted content of one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    pub slide_number: usize,
    pub slide_id: Option<u32>,
    /// The title's significant paragraphs, `None` when there is no title.
    pub title: Option<Vec<ParagraphRecord>>,
    pub title_meta: Option<ShapeMeta>,
    pub content: Vec<ContentEntry>,
    pub content_shapes: Vec<ContentShape>,
    pub tables: Vec<TableRecord>,
    pub notes: String,
    pub has_header_footer: bool,
}

/// Where a shape sits in the ordered sequence and its slide-local id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeMeta {
    pub shape_index: Option<usize>,
    pub shape_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub font_size: Option<f64>,
    pub font_name: Option<String>,
}

/// A significant paragraph of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// Raw position in the shape.
    pub index: usize,
    pub text: String,
    pub level: u8,
    pub alignment: Option<Alignment>,
    pub runs: Vec<RunRecord>,
}

/// One addressable content paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub paragraph_index: usize,
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub paragraph_index_in_shape: usize,
    pub nonempty_index_in_shape: usize,
    pub text: String,
    pub level: u8,
    pub alignment: Option<Alignment>,
    pub runs: Vec<RunRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub rows: usize,
    pub cols: usize,
    /// Cells not covered by a merge.
    pub cells: Vec<CellRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    #[serde(flatten)]
    pub data: TableData,
}

/// Per-shape metadata for every non-title ordered shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentShape {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    #[serde(rename = "type")]
    pub shape_type: ShapeType,
    pub position: Geometry,
    pub paragraphs: Vec<ParagraphRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
}

/// Builds extraction records from slides.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphExtractor {
    slide_size: SlideSize,
}

impl ParagraphExtractor {
    pub fn new(slide_size: SlideSize) -> Self {
        Self { slide_size }
    }

    /// Extract every slide of a document.
    pub fn extract(document: &Document) -> ExtractionPayload {
        let extractor = Self::new(document.slide_size);
        let slides: Vec<SlideRecord> = document
            .slides
            .iter()
            .map(|slide| extractor.extract_slide(slide))
            .collect();
        log::debug!("Extracted {} slides from {}", slides.len(), document.source);
        ExtractionPayload {
            file: document.source.clone(),
            total_slides: slides.len(),
            slides,
        }
    }

    pub fn extract_slide(&self, slide: &Slide) -> SlideRecord {
        let index = SlideIndex::build(slide);
        let meta = |shape_index: usize| ShapeMeta {
            shape_index: Some(shape_index),
            shape_id: index.shapes[shape_index].shape.id(),
        };

        let content = index
            .content
            .iter()
            .map(|p| {
                let record = paragraph_record(p.paragraph_index_in_shape, &p.paragraph);
                ContentEntry {
                    paragraph_index: p.content_index,
                    meta: meta(p.shape_index),
                    paragraph_index_in_shape: p.paragraph_index_in_shape,
                    nonempty_index_in_shape: p.nonempty_index_in_shape,
                    text: record.text,
                    level: record.level,
                    alignment: record.alignment,
                    runs: record.runs,
                }
            })
            .collect();

        let mut content_shapes = Vec::new();
        let mut tables = Vec::new();
        for (shape_index, ordered) in index.content_shapes() {
            let table_data = ordered.shape.table().map(|t| table_data(&t));
            if let Some(data) = &table_data {
                tables.push(TableRecord {
                    meta: meta(shape_index),
                    data: data.clone(),
                });
            }
            content_shapes.push(ContentShape {
                meta: meta(shape_index),
                shape_type: ordered.shape.shape_type(),
                position: ordered.geometry,
                paragraphs: paragraph_records(&ordered.shape),
                table_data,
            });
        }

        SlideRecord {
            slide_number: slide.number,
            slide_id: slide.id,
            title: index.title_shape().map(|t| paragraph_records(&t.shape)),
            title_meta: index.title.map(meta),
            content,
            content_shapes,
            tables,
            notes: slide
                .notes
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_default(),
            has_header_footer: self.has_header_footer(&index.shapes),
        }
    }

    /// A shape in the bottom band, or a short shape in the top band.
    fn has_header_footer(&self, shapes: &[OrderedShape]) -> bool {
        let height = self.slide_size.cy as f64;
        let band = height * HEADER_FOOTER_BAND;
        shapes.iter().any(|s| {
            let top = s.geometry.top as f64;
            top > height - band || (top < band && (s.geometry.height as f64) < band)
        })
    }
}

fn paragraph_record(index: usize, paragraph: &Paragraph) -> ParagraphRecord {
    let runs = paragraph
        .runs()
        .into_iter()
        .filter_map(|run| {
            let text = run.text();
            if text.trim().is_empty() {
                return None;
            }
            let font = run.font();
            Some(RunRecord {
                text,
                bold: font.bold,
                italic: font.italic,
                font_size: font.size,
                font_name: font.name,
            })
        })
        .collect();
    ParagraphRecord {
        index,
        text: paragraph.text().trim().to_string(),
        level: paragraph.level(),
        alignment: paragraph.alignment(),
        runs,
    }
}

fn paragraph_records(shape: &Shape) -> Vec<ParagraphRecord> {
    if shape.kind() != ShapeKind::Text {
        return Vec::new();
    }
    shape
        .text_frame()
        .map(|frame| {
            frame
                .significant_paragraphs()
                .iter()
                .map(|(i, p)| paragraph_record(*i, p))
                .collect()
        })
        .unwrap_or_default()
}

fn table_data(table: &Table) -> TableData {
    TableData {
        rows: table.row_count(),
        cols: table.column_count(),
        cells: table
            .cells()
            .into_iter()
            .filter(|(_, _, cell)| !cell.is_spanned())
            .map(|(row, col, cell)| CellRecord {
                row,
                col,
                text: cell.text().trim().to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{document, framed_text_box, sized_text_box, table, text_box};

    fn sample() -> Document {
        let mut doc = document(&[vec![
            sized_text_box(2, 0, 0, 32.0, &["Quarterly Review"]),
            text_box(3, 1_000_000, 0, &["first point", "", "second point"]),
            table(4, 3_000_000, 0, &[&["Region", "Sales"], &["North", " 10 "]]),
            text_box(5, 4_000_000, 0, &["closing"]),
        ]]);
        doc.slides[0].notes = Some("  speak slowly \n".to_string());
        doc
    }

    #[test]
    fn test_slide_record() {
        let payload = ParagraphExtractor::extract(&sample());
        assert_eq!(payload.file, "deck.pptx");
        assert_eq!(payload.total_slides, 1);

        let slide = &payload.slides[0];
        assert_eq!(slide.slide_number, 1);
        assert_eq!(slide.slide_id, Some(256));
        assert_eq!(slide.notes, "speak slowly");
        let title = slide.title.as_ref().unwrap();
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].text, "Quarterly Review");
        assert_eq!(title[0].runs[0].font_size, Some(32.0));
        assert_eq!(
            slide.title_meta,
            Some(ShapeMeta {
                shape_index: Some(0),
                shape_id: Some(2),
            })
        );

        let content: Vec<_> = slide
            .content
            .iter()
            .map(|c| {
                (
                    c.paragraph_index,
                    c.meta.shape_index,
                    c.paragraph_index_in_shape,
                    c.nonempty_index_in_shape,
                    c.text.as_str(),
                )
            })
            .collect();
        assert_eq!(
            content,
            vec![
                (0, Some(1), 0, 0, "first point"),
                (1, Some(1), 2, 1, "second point"),
                (2, Some(3), 0, 0, "closing"),
            ]
        );

        assert_eq!(slide.content_shapes.len(), 3);
        assert_eq!(slide.content_shapes[1].shape_type, ShapeType::Table);
        assert!(slide.content_shapes[1].table_data.is_some());
        assert_eq!(slide.content_shapes[0].shape_type, ShapeType::Textbox);

        assert_eq!(slide.tables.len(), 1);
        let table = &slide.tables[0];
        assert_eq!((table.data.rows, table.data.cols), (2, 2));
        assert_eq!(table.meta.shape_index, Some(2));
        assert_eq!(table.data.cells[3].text, "10");
        assert!(!slide.has_header_footer);
    }

    #[test]
    fn test_payload_json_shape() {
        let json = ParagraphExtractor::extract(&sample()).to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let slide = &value["slides"][0];
        let entry = &slide["content"][1];
        assert_eq!(entry["shape_index"], 1);
        assert_eq!(entry["shape_id"], 3);
        assert_eq!(entry["paragraph_index_in_shape"], 2);
        assert_eq!(entry["runs"][0]["text"], "second point");
        assert!(entry["alignment"].is_null());
        assert_eq!(slide["tables"][0]["rows"], 2);
        assert_eq!(slide["tables"][0]["cells"][0]["text"], "Region");
        assert_eq!(slide["content_shapes"][1]["type"], "table");
        assert_eq!(slide["content_shapes"][0]["position"]["top"], 1_000_000);
        assert!(slide["content_shapes"][0].get("table_data").is_none());
    }

    #[test]
    fn test_header_footer_detection() {
        let footer = framed_text_box(
            6,
            Geometry {
                top: 6_400_000,
                left: 0,
                width: 1_000_000,
                height: 300_000,
            },
            None,
            &["page 1"],
        );
        let doc = document(&[vec![text_box(2, 1_000_000, 0, &["body"]), footer]]);
        let payload = ParagraphExtractor::extract(&doc);
        assert!(payload.slides[0].has_header_footer);

        let short_header = framed_text_box(
            7,
            Geometry {
                top: 100_000,
                left: 0,
                width: 1_000_000,
                height: 200_000,
            },
            None,
            &["header"],
        );
        let doc = document(&[vec![short_header]]);
        assert!(ParagraphExtractor::extract(&doc).slides[0].has_header_footer);
    }

    #[test]
    fn test_untitled_slide() {
        let doc = document(&[vec![table(2, 0, 0, &[&["a"]])]]);
        let slide = &ParagraphExtractor::extract(&doc).slides[0];
        assert!(slide.title.is_none());
        assert!(slide.title_meta.is_none());
        assert!(slide.content.is_empty());
        assert_eq!(slide.tables.len(), 1);
    }
}
