//! Reading-order linearization of a slide's shapes.
//!
//! Groups are flattened depth-first, shapes that carry nothing addressable
//! are dropped, and the rest are stably sorted top-to-bottom, then
//! left-to-right. Extraction and modification both go through
//! [`ordered_shapes`], so a shape index means the same shape on both sides.

use crate::model::{Geometry, Shape, ShapeKind, ShapePath};
use crate::types::Slide;

/// Deepest group nesting a slide may have.
pub const MAX_GROUP_DEPTH: usize = 32;

/// An addressable shape and where it lives in the shape tree.
#[derive(Debug, Clone)]
pub struct OrderedShape<'a> {
    pub path: ShapePath,
    pub shape: Shape<'a>,
    pub geometry: Geometry,
}

/// The slide's addressable shapes in reading order.
pub fn ordered_shapes(slide: &Slide) -> Vec<OrderedShape<'_>> {
    let mut flattened = Vec::new();
    for (path, shape) in slide.top_level_shapes() {
        flatten(path, shape, 0, &mut flattened);
    }
    flattened.sort_by_key(|s| (s.geometry.top, s.geometry.left));
    flattened
}

fn flatten<'a>(path: ShapePath, shape: Shape<'a>, depth: usize, out: &mut Vec<OrderedShape<'a>>) {
    if shape.kind() == ShapeKind::Group {
        // Slide construction already rejects deeper trees
        if depth >= MAX_GROUP_DEPTH {
            return;
        }
        for (position, child) in shape.children() {
            let mut child_path = path.clone();
            child_path.push(position);
            flatten(child_path, child, depth + 1, out);
        }
        return;
    }

    if shape.is_addressable() {
        out.push(OrderedShape {
            path,
            geometry: shape.geometry(),
            shape,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{group, picture, slide, table, text_box};

    fn texts(ordered: &[OrderedShape]) -> Vec<String> {
        ordered.iter().map(|s| s.shape.text()).collect()
    }

    #[test]
    fn test_sorted_top_then_left() {
        let slide = slide(&[
            text_box(2, 500, 900, &["bottom right"]),
            text_box(3, 100, 0, &["top"]),
            text_box(4, 500, 100, &["bottom left"]),
        ]);
        assert_eq!(
            texts(&ordered_shapes(&slide)),
            vec!["top", "bottom left", "bottom right"]
        );
    }

    #[test]
    fn test_ties_keep_flatten_order() {
        let slide = slide(&[
            text_box(2, 100, 100, &["first"]),
            text_box(3, 100, 100, &["second"]),
        ]);
        assert_eq!(texts(&ordered_shapes(&slide)), vec!["first", "second"]);
    }

    #[test]
    fn test_groups_flattened_and_non_text_dropped() {
        let slide = slide(&[
            picture(2, 0, 0),
            text_box(3, 0, 0, &["", "  "]),
            group(
                4,
                &[text_box(5, 300, 0, &["grouped b"]), text_box(6, 200, 0, &["grouped a"])],
            ),
            table(7, 400, 0, &[&["cell"]]),
        ]);
        let ordered = ordered_shapes(&slide);
        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0].shape.text(), "grouped a");
        assert_eq!(ordered[1].shape.text(), "grouped b");
        assert_eq!(ordered[2].shape.kind(), ShapeKind::Table);
        // group children are addressed by their own path
        assert_eq!(ordered[0].path.len(), 2);
        assert_eq!(slide.shape(&ordered[0].path).map(|s| s.id()), Some(Some(6)));
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let slide = slide(&[
            text_box(2, 10, 10, &["a"]),
            group(3, &[text_box(4, 10, 10, &["b"])]),
            text_box(5, 0, 50, &["c"]),
        ]);
        let first: Vec<_> = ordered_shapes(&slide).into_iter().map(|s| s.path).collect();
        let second: Vec<_> = ordered_shapes(&slide).into_iter().map(|s| s.path).collect();
        assert_eq!(first, second);
    }
}
