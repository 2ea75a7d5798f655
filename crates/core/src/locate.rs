//! Resolving change locators to live paragraphs.
//!
//! Every locator kind is a chain: the index-based lookup first, then a
//! slide-wide search for a paragraph whose text equals the change's old
//! text. Nothing here mutates; the resolver hands back where to write.

use crate::change::{ReplaceByIndex, ReplaceByShapeParagraph};
use crate::index::SlideIndex;
use crate::model::{Paragraph, ShapeKind, ShapePath};
use crate::normalize::{normalize_text, text_matches};
use crate::order::OrderedShape;
use crate::types::Slide;
use serde::Serialize;

/// Why a change was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No locator or text search found the paragraph.
    NotFound,
    /// A title change on a slide without a title.
    TitleMissing,
    /// A substring change or deletion matched nothing.
    NoMatch,
    /// The change kind does not apply to the entry's target type.
    UnsupportedTarget,
    UnknownChangeType,
}

/// The strategy that found a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    TitleParagraph,
    ContentIndex,
    ShapeParagraph,
    NonemptyInShape,
    TextSearch,
}

/// A paragraph to rewrite: its shape and raw position in that shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphTarget {
    pub path: ShapePath,
    pub paragraph: usize,
    pub strategy: Strategy,
}

/// Outcome of resolving one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ParagraphTarget),
    Missed(SkipReason),
}

/// Resolves change locators against one slide's current state.
#[derive(Debug)]
pub struct LocatorResolver<'a> {
    index: SlideIndex<'a>,
}

impl<'a> LocatorResolver<'a> {
    pub fn new(slide: &'a Slide) -> Self {
        Self {
            index: SlideIndex::build(slide),
        }
    }

    /// Title change: the title's first significant paragraph.
    pub fn resolve_title(&self, change: &ReplaceByIndex) -> Resolution {
        let Some(title) = self.index.title else {
            log::debug!("No title shape, searching slide text");
            return self.search_or(&change.old_text, &change.new_text, None, SkipReason::TitleMissing);
        };

        let found = self
            .significant_paragraph(&self.index.shapes[title], 0)
            .filter(|(_, p)| text_matches(&p.text(), &change.old_text, change.match_mode))
            .map(|(raw, _)| target(&self.index.shapes[title], raw, Strategy::TitleParagraph));
        match found {
            Some(target) => Resolution::Found(target),
            None => self.search_or(&change.old_text, &change.new_text, Some(title), SkipReason::NotFound),
        }
    }

    /// Content change addressed by global content index.
    pub fn resolve_content_index(&self, change: &ReplaceByIndex) -> Resolution {
        let paragraph_index = change.paragraph_index.unwrap_or(0);
        let found = usize::try_from(paragraph_index)
            .ok()
            .and_then(|i| self.index.paragraph(i))
            .filter(|p| text_matches(&p.paragraph.text(), &change.old_text, change.match_mode))
            .map(|p| {
                target(
                    &self.index.shapes[p.shape_index],
                    p.paragraph_index_in_shape,
                    Strategy::ContentIndex,
                )
            });
        match found {
            Some(target) => Resolution::Found(target),
            None => {
                log::debug!("Content index {} missed, searching slide text", paragraph_index);
                self.search_or(&change.old_text, &change.new_text, None, SkipReason::NotFound)
            }
        }
    }

    /// Content change addressed by shape index and in-shape position.
    pub fn resolve_shape_paragraph(&self, change: &ReplaceByShapeParagraph) -> Resolution {
        let shape_index = change
            .shape_index
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < self.index.shapes.len());
        let Some(shape_index) = shape_index else {
            log::debug!("Shape index {:?} out of range", change.shape_index);
            return self.search_or(&change.old_text, &change.new_text, None, SkipReason::NotFound);
        };

        let shape = &self.index.shapes[shape_index];
        if shape.shape.kind() != ShapeKind::Text {
            return self.search_or(&change.old_text, &change.new_text, None, SkipReason::NotFound);
        }

        let paragraphs = shape
            .shape
            .text_frame()
            .map(|f| f.paragraphs())
            .unwrap_or_default();
        let raw = change
            .paragraph_index_in_shape
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < paragraphs.len());

        let found = match raw {
            Some(raw) => Some((raw, paragraphs[raw], Strategy::ShapeParagraph)),
            None => change
                .nonempty_index_in_shape
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| self.significant_paragraph(shape, i))
                .map(|(raw, p)| (raw, p, Strategy::NonemptyInShape)),
        };
        let found = found
            .filter(|(_, p, _)| text_matches(&p.text(), &change.old_text, change.match_mode))
            .map(|(raw, _, strategy)| target(shape, raw, strategy));

        match found {
            Some(target) => Resolution::Found(target),
            None => self.search_or(
                &change.old_text,
                &change.new_text,
                Some(shape_index),
                SkipReason::NotFound,
            ),
        }
    }

    fn significant_paragraph(
        &self,
        shape: &OrderedShape<'a>,
        nonempty_index: usize,
    ) -> Option<(usize, Paragraph<'a>)> {
        shape
            .shape
            .text_frame()?
            .significant_paragraphs()
            .into_iter()
            .nth(nonempty_index)
    }

    fn search_or(
        &self,
        old_text: &str,
        new_text: &str,
        preferred: Option<usize>,
        reason: SkipReason,
    ) -> Resolution {
        match self.search_text(old_text, new_text, preferred) {
            Some(target) => Resolution::Found(target),
            None => Resolution::Missed(reason),
        }
    }

    /// Find a paragraph whose text equals `old_text` and is not already
    /// `new_text`, looking in the preferred shape before the rest.
    pub fn search_text(
        &self,
        old_text: &str,
        new_text: &str,
        preferred: Option<usize>,
    ) -> Option<ParagraphTarget> {
        let expected = normalize_text(old_text);
        if expected.is_empty() {
            return None;
        }
        let replacement = normalize_text(new_text);

        let candidates = preferred
            .and_then(|i| self.index.shapes.get(i))
            .into_iter()
            .chain(self.index.shapes.iter());
        for shape in candidates {
            let Some(frame) = shape.shape.text_frame() else {
                continue;
            };
            for (raw, paragraph) in frame.paragraphs().iter().enumerate() {
                let current = normalize_text(&paragraph.text());
                if current == expected && current != replacement {
                    log::debug!("Text search matched shape {:?} paragraph {}", shape.path, raw);
                    return Some(target(shape, raw, Strategy::TextSearch));
                }
            }
        }
        None
    }
}

fn target(shape: &OrderedShape, paragraph: usize, strategy: Strategy) -> ParagraphTarget {
    ParagraphTarget {
        path: shape.path.clone(),
        paragraph,
        strategy,
    }
}
