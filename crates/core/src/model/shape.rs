//! Shapes on a slide's shape tree.

use super::table::{Table, TableMut};
use super::text::{TextFrame, TextFrameMut};
use crate::normalize::is_blank;
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// Raw child positions leading from the shape tree to a shape element.
pub type ShapePath = Vec<usize>;

/// Element names that denote a shape inside `p:spTree` or `p:grpSp`.
const SHAPE_ELEMENTS: &[&str] = &["sp", "grpSp", "graphicFrame", "pic", "cxnSp", "contentPart"];

pub fn is_shape_element(element: &XmlElement) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

/// Structural kind of a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `p:sp`, may carry a text body.
    Text,
    /// `p:grpSp`, owns child shapes.
    Group,
    /// `p:graphicFrame` holding an `a:tbl`.
    Table,
    /// Pictures, connectors, charts and anything else without text.
    Graphic,
}

fn classify(element: &XmlElement) -> ShapeKind {
    match element.local_name() {
        "sp" => ShapeKind::Text,
        "grpSp" => ShapeKind::Group,
        "graphicFrame" if table_element(element).is_some() => ShapeKind::Table,
        _ => ShapeKind::Graphic,
    }
}

fn table_element(element: &XmlElement) -> Option<&XmlElement> {
    element.find(&["graphic", "graphicData", "tbl"])
}

/// Shape type tag reported in the extraction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Table,
    Chart,
    Group,
    Placeholder,
    Textbox,
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub top: i64,
    pub left: i64,
    pub width: i64,
    pub height: i64,
}

impl Geometry {
    /// Read `a:off`/`a:ext` from an `a:xfrm` or `p:xfrm` element.
    pub fn from_xfrm(xfrm: &XmlElement) -> Option<Self> {
        let coord = |el: Option<&XmlElement>, key: &str| {
            el.and_then(|e| e.attr(key))
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0)
        };
        let off = xfrm.child("off");
        let ext = xfrm.child("ext");
        if off.is_none() && ext.is_none() {
            return None;
        }
        Some(Self {
            top: coord(off, "y"),
            left: coord(off, "x"),
            width: coord(ext, "cx"),
            height: coord(ext, "cy"),
        })
    }
}

/// Placeholder role codes (`p:ph@type`), numbered as the container format
/// numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderRole {
    Title,
    Body,
    CenterTitle,
    Subtitle,
    Object,
    Chart,
    Bitmap,
    MediaClip,
    OrgChart,
    Table,
    SlideNumber,
    Header,
    Footer,
    Date,
    Picture,
    SlideImage,
}

impl PlaceholderRole {
    /// Role for a `type` attribute; a missing or unknown type is `Object`.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("title") => Self::Title,
            Some("body") => Self::Body,
            Some("ctrTitle") => Self::CenterTitle,
            Some("subTitle") => Self::Subtitle,
            Some("chart") => Self::Chart,
            Some("clipArt") => Self::Bitmap,
            Some("media") => Self::MediaClip,
            Some("dgm") => Self::OrgChart,
            Some("tbl") => Self::Table,
            Some("sldNum") => Self::SlideNumber,
            Some("hdr") => Self::Header,
            Some("ftr") => Self::Footer,
            Some("dt") => Self::Date,
            Some("pic") => Self::Picture,
            Some("sldImg") => Self::SlideImage,
            _ => Self::Object,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Title => 1,
            Self::Body => 2,
            Self::CenterTitle => 3,
            Self::Subtitle => 4,
            Self::Object => 7,
            Self::Chart => 8,
            Self::Bitmap => 9,
            Self::MediaClip => 10,
            Self::OrgChart => 11,
            Self::Table => 12,
            Self::SlideNumber => 13,
            Self::Header => 14,
            Self::Footer => 15,
            Self::Date => 16,
            Self::Picture => 18,
            Self::SlideImage => 101,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle)
    }
}

/// Placeholder semantics of a shape (`p:nvPr/p:ph`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub role: PlaceholderRole,
    pub idx: u32,
}

impl Placeholder {
    pub fn from_element(ph: &XmlElement) -> Self {
        Self {
            role: PlaceholderRole::from_attr(ph.attr("type")),
            idx: ph.attr("idx").and_then(|v| v.parse().ok()).unwrap_or(0),
        }
    }
}

/// A layout placeholder whose geometry slide placeholders inherit.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritedPlaceholder {
    pub placeholder: Placeholder,
    pub geometry: Geometry,
}

/// Geometry that placeholders without their own transform inherit from the
/// slide layout (and through it, the master).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPlaceholders {
    entries: Vec<InheritedPlaceholder>,
}

impl LayoutPlaceholders {
    pub fn new(entries: Vec<InheritedPlaceholder>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Geometry for a slide placeholder: matched on `idx`, then on role.
    pub fn geometry_for(&self, placeholder: &Placeholder) -> Option<Geometry> {
        let title = placeholder.role.is_title();
        self.entries
            .iter()
            .find(|e| e.placeholder.idx == placeholder.idx && e.placeholder.role.is_title() == title)
            .or_else(|| {
                self.entries.iter().find(|e| {
                    if title {
                        e.placeholder.role.is_title()
                    } else {
                        e.placeholder.role == placeholder.role
                    }
                })
            })
            .map(|e| e.geometry)
    }
}

fn non_visual(element: &XmlElement) -> Option<&XmlElement> {
    element.elements().find(|el| el.local_name().starts_with("nv"))
}

fn own_transform(element: &XmlElement) -> Option<&XmlElement> {
    element
        .child("xfrm")
        .or_else(|| element.find(&["spPr", "xfrm"]))
        .or_else(|| element.find(&["grpSpPr", "xfrm"]))
}

/// Read-only view of a shape element.
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    element: &'a XmlElement,
    layout: &'a LayoutPlaceholders,
}

impl<'a> Shape<'a> {
    pub fn new(element: &'a XmlElement, layout: &'a LayoutPlaceholders) -> Self {
        Self { element, layout }
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    pub fn kind(&self) -> ShapeKind {
        classify(self.element)
    }

    /// Numeric id, unique within the slide for the lifetime of the document.
    pub fn id(&self) -> Option<u32> {
        non_visual(self.element)?
            .child("cNvPr")?
            .attr("id")?
            .parse()
            .ok()
    }

    pub fn name(&self) -> Option<&'a str> {
        non_visual(self.element)?.child("cNvPr")?.attr("name")
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        non_visual(self.element)?
            .find(&["nvPr", "ph"])
            .map(Placeholder::from_element)
    }

    /// Own transform, else inherited placeholder geometry, else the origin.
    pub fn geometry(&self) -> Geometry {
        own_transform(self.element)
            .and_then(Geometry::from_xfrm)
            .or_else(|| {
                self.placeholder()
                    .and_then(|ph| self.layout.geometry_for(&ph))
            })
            .unwrap_or_default()
    }

    pub fn has_text_frame(&self) -> bool {
        self.kind() == ShapeKind::Text
    }

    pub fn text_frame(&self) -> Option<TextFrame<'a>> {
        if !self.has_text_frame() {
            return None;
        }
        self.element.child("txBody").map(TextFrame::new)
    }

    /// Paragraph texts joined by `\n`; empty for shapes without text.
    pub fn text(&self) -> String {
        self.text_frame().map(|f| f.text()).unwrap_or_default()
    }

    pub fn table(&self) -> Option<Table<'a>> {
        if self.kind() != ShapeKind::Table {
            return None;
        }
        table_element(self.element).map(Table::new)
    }

    /// A table, or a text shape with non-blank text.
    pub fn is_addressable(&self) -> bool {
        match self.kind() {
            ShapeKind::Table => true,
            ShapeKind::Text => !is_blank(&self.text()),
            ShapeKind::Group | ShapeKind::Graphic => false,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self.kind() {
            ShapeKind::Table => ShapeType::Table,
            ShapeKind::Group => ShapeType::Group,
            ShapeKind::Graphic
                if self
                    .element
                    .find(&["graphic", "graphicData"])
                    .and_then(|data| data.attr("uri"))
                    .is_some_and(|uri| uri.contains("/chart")) =>
            {
                ShapeType::Chart
            }
            _ if self.placeholder().is_some() => ShapeType::Placeholder,
            _ => ShapeType::Textbox,
        }
    }

    /// Child shapes of a group with their raw positions.
    pub fn children(&self) -> Vec<(usize, Shape<'a>)> {
        if self.kind() != ShapeKind::Group {
            return Vec::new();
        }
        self.element
            .indexed_elements()
            .filter(|(_, el)| is_shape_element(el))
            .map(|(i, el)| (i, Shape::new(el, self.layout)))
            .collect()
    }
}

/// Mutable view of a shape element.
#[derive(Debug)]
pub struct ShapeMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> ShapeMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn kind(&self) -> ShapeKind {
        classify(self.element)
    }

    pub fn text_frame_mut(&mut self) -> Option<TextFrameMut<'_>> {
        if self.kind() != ShapeKind::Text {
            return None;
        }
        self.element.child_mut("txBody").map(TextFrameMut::new)
    }

    pub fn table_mut(&mut self) -> Option<TableMut<'_>> {
        if self.kind() != ShapeKind::Table {
            return None;
        }
        self.element
            .find_mut(&["graphic", "graphicData", "tbl"])
            .map(TableMut::new)
    }

    pub fn children_mut(&mut self) -> Vec<ShapeMut<'_>> {
        if self.kind() != ShapeKind::Group {
            return Vec::new();
        }
        self.element
            .elements_mut()
            .filter(|el| is_shape_element(el))
            .map(ShapeMut::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{group, picture, placeholder, table, text_box};
    use crate::xml::XmlDocument;

    fn parse(xml: &str) -> XmlElement {
        XmlDocument::parse(&crate::testing::wrap_fragment(xml)).unwrap().root
    }

    #[test]
    fn test_text_shape_attributes() {
        let root = parse(&text_box(7, 100, 200, &["Hello", "", "World"]));
        let layout = LayoutPlaceholders::default();
        let shape = Shape::new(root.child("sp").unwrap(), &layout);
        assert_eq!(shape.kind(), ShapeKind::Text);
        assert_eq!(shape.id(), Some(7));
        assert_eq!(shape.geometry().top, 100);
        assert_eq!(shape.geometry().left, 200);
        assert_eq!(shape.text(), "Hello\n\nWorld");
        assert_eq!(shape.shape_type(), ShapeType::Textbox);
        assert!(shape.placeholder().is_none());
        assert!(shape.is_addressable());
    }

    #[test]
    fn test_placeholder_inherits_layout_geometry() {
        let root = parse(&placeholder(2, "title", None, "Agenda"));
        let layout = LayoutPlaceholders::new(vec![InheritedPlaceholder {
            placeholder: Placeholder {
                role: PlaceholderRole::Title,
                idx: 0,
            },
            geometry: Geometry {
                top: 300,
                left: 400,
                width: 10,
                height: 20,
            },
        }]);
        let shape = Shape::new(root.child("sp").unwrap(), &layout);
        let ph = shape.placeholder().unwrap();
        assert_eq!(ph.role, PlaceholderRole::Title);
        assert_eq!(ph.role.code(), 1);
        assert_eq!(shape.geometry().top, 300);
        assert_eq!(shape.shape_type(), ShapeType::Placeholder);
    }

    #[test]
    fn test_table_group_and_graphic_kinds() {
        let root = parse(&format!(
            "{}{}{}",
            table(9, 0, 0, &[&["a", "b"]]),
            group(10, &[text_box(11, 0, 0, &["child"])]),
            picture(12, 0, 0)
        ));
        let layout = LayoutPlaceholders::default();
        let shapes: Vec<_> = root
            .elements()
            .filter(|el| is_shape_element(el))
            .map(|el| Shape::new(el, &layout))
            .collect();
        assert_eq!(shapes[0].kind(), ShapeKind::Table);
        assert!(shapes[0].table().is_some());
        assert!(shapes[0].is_addressable());
        assert_eq!(shapes[1].kind(), ShapeKind::Group);
        assert_eq!(shapes[1].children().len(), 1);
        assert!(!shapes[1].is_addressable());
        assert_eq!(shapes[2].kind(), ShapeKind::Graphic);
        assert!(!shapes[2].is_addressable());
    }

    #[test]
    fn test_placeholder_roles() {
        assert_eq!(PlaceholderRole::from_attr(None), PlaceholderRole::Object);
        assert_eq!(
            PlaceholderRole::from_attr(Some("ctrTitle")).code(),
            3
        );
        assert!(PlaceholderRole::from_attr(Some("ctrTitle")).is_title());
        assert!(!PlaceholderRole::from_attr(Some("hdr")).is_title());
        assert_eq!(PlaceholderRole::Header.code(), 14);
    }
}
