//! Title classification over an ordered shape sequence.

use crate::model::ShapeKind;
use crate::normalize::is_blank;
use crate::order::OrderedShape;

/// Shapes above this offset (EMU) are candidates for a heading.
pub const TITLE_TOP_THRESHOLD: i64 = 350_000;

/// A heading's first run must be strictly larger than this (points).
pub const TITLE_MIN_FONT_SIZE: f64 = 20.0;

type TitleStrategy = fn(&[OrderedShape]) -> Option<usize>;

/// Tried in order; the first strategy with an answer wins.
const STRATEGIES: &[TitleStrategy] = &[largest_top_heading, title_placeholder, first_text_shape];

/// Position of the title within `shapes`, if the slide has one.
pub fn classify_title(shapes: &[OrderedShape]) -> Option<usize> {
    STRATEGIES.iter().find_map(|strategy| strategy(shapes))
}

fn is_text_shape(shape: &OrderedShape) -> bool {
    shape.shape.kind() == ShapeKind::Text && !is_blank(&shape.shape.text())
}

/// Size of the first run of the first paragraph, if declared.
fn leading_font_size(shape: &OrderedShape) -> Option<f64> {
    let frame = shape.shape.text_frame()?;
    let paragraph = frame.paragraphs().into_iter().next()?;
    let run = paragraph.runs().into_iter().next()?;
    run.font().size
}

/// Near-top text shape with the largest leading font; earlier shapes win ties.
fn largest_top_heading(shapes: &[OrderedShape]) -> Option<usize> {
    shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| is_text_shape(s) && s.geometry.top < TITLE_TOP_THRESHOLD)
        .filter_map(|(i, s)| {
            leading_font_size(s)
                .filter(|size| *size > TITLE_MIN_FONT_SIZE)
                .map(|size| (i, size))
        })
        .fold(None, |best: Option<(usize, f64)>, (i, size)| match best {
            Some((_, best_size)) if best_size >= size => best,
            _ => Some((i, size)),
        })
        .map(|(i, _)| i)
}

fn title_placeholder(shapes: &[OrderedShape]) -> Option<usize> {
    shapes.iter().position(|s| {
        s.shape
            .placeholder()
            .is_some_and(|ph| ph.role.is_title())
    })
}

fn first_text_shape(shapes: &[OrderedShape]) -> Option<usize> {
    shapes.iter().position(is_text_shape)
}
