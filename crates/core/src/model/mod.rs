//! Read and write views over slide XML.
//!
//! Views borrow elements of a slide's owned XML tree; nothing is copied out,
//! so any markup a view does not understand is left exactly as it was.

pub mod shape;
pub mod table;
pub mod text;

pub use shape::{
    is_shape_element, Geometry, InheritedPlaceholder, LayoutPlaceholders, Placeholder,
    PlaceholderRole, Shape, ShapeKind, ShapeMut, ShapePath, ShapeType,
};
pub use table::{Cell, Table, TableMut};
pub use text::{
    Alignment, Font, Paragraph, ParagraphMut, Rgb, Run, RunMut, TextFrame, TextFrameMut,
};
