//! The paragraph cross-reference shared by extraction and modification.
//!
//! One linear pass over the ordered shapes assigns every significant
//! paragraph outside the title its global content index, its raw position in
//! the owning shape and its position among that shape's significant
//! paragraphs.

use crate::model::{Paragraph, ShapeKind};
use crate::order::{ordered_shapes, OrderedShape};
use crate::title::classify_title;
use crate::types::Slide;

/// A significant content paragraph with all three of its indices.
#[derive(Debug, Clone)]
pub struct IndexedParagraph<'a> {
    /// Counter over the slide's non-title significant paragraphs.
    pub content_index: usize,
    /// Owning shape's position in the ordered sequence.
    pub shape_index: usize,
    /// Raw position among all of the shape's paragraphs.
    pub paragraph_index_in_shape: usize,
    /// Position among the shape's significant paragraphs.
    pub nonempty_index_in_shape: usize,
    pub paragraph: Paragraph<'a>,
}

/// Ordered shapes, the title and the content paragraph index of one slide.
#[derive(Debug, Clone)]
pub struct SlideIndex<'a> {
    pub shapes: Vec<OrderedShape<'a>>,
    pub title: Option<usize>,
    pub content: Vec<IndexedParagraph<'a>>,
}

impl<'a> SlideIndex<'a> {
    pub fn build(slide: &'a Slide) -> Self {
        let shapes = ordered_shapes(slide);
        let title = classify_title(&shapes);

        let mut content = Vec::new();
        for (shape_index, ordered) in shapes.iter().enumerate() {
            if Some(shape_index) == title || ordered.shape.kind() != ShapeKind::Text {
                continue;
            }
            let Some(frame) = ordered.shape.text_frame() else {
                continue;
            };
            for (nonempty_index_in_shape, (paragraph_index_in_shape, paragraph)) in
                frame.significant_paragraphs().into_iter().enumerate()
            {
                content.push(IndexedParagraph {
                    content_index: content.len(),
                    shape_index,
                    paragraph_index_in_shape,
                    nonempty_index_in_shape,
                    paragraph,
                });
            }
        }

        Self {
            shapes,
            title,
            content,
        }
    }

    pub fn title_shape(&self) -> Option<&OrderedShape<'a>> {
        self.title.and_then(|i| self.shapes.get(i))
    }

    /// Ordered shapes other than the title, with their shape index.
    pub fn content_shapes(&self) -> impl Iterator<Item = (usize, &OrderedShape<'a>)> + '_ {
        self.shapes
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != self.title)
    }

    pub fn paragraph(&self, content_index: usize) -> Option<&IndexedParagraph<'a>> {
        self.content.get(content_index)
    }
}
