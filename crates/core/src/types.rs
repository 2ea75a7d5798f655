//! Documents and slides as handed over by a package backend.

use crate::model::{is_shape_element, LayoutPlaceholders, Shape, ShapeMut, ShapePath};
use crate::order::MAX_GROUP_DEPTH;
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Path from a slide root to its shape tree.
const SHAPE_TREE: &[&str] = &["cSld", "spTree"];

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

impl Default for SlideSize {
    /// 10 x 7.5 inches, used when the package declares no size.
    fn default() -> Self {
        Self {
            cx: 9_144_000,
            cy: 6_858_000,
        }
    }
}

/// A presentation opened for extraction or rewriting.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name reported in extraction output.
    pub source: String,

    pub slide_size: SlideSize,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Document {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            slide_size: SlideSize::default(),
            slides: Vec::new(),
        }
    }

    pub fn with_slide_size(mut self, slide_size: SlideSize) -> Self {
        self.slide_size = slide_size;
        self
    }

    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Slide by 1-based number.
    pub fn slide(&self, number: usize) -> Option<&Slide> {
        number.checked_sub(1).and_then(|i| self.slides.get(i))
    }

    pub fn slide_mut(&mut self, number: usize) -> Option<&mut Slide> {
        number.checked_sub(1).and_then(|i| self.slides.get_mut(i))
    }
}

/// One slide part and what the package knows about it.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based position in the presentation.
    pub number: usize,

    /// Id from the presentation's slide list, when there is one.
    pub id: Option<u32>,

    /// Package path of the slide part, e.g. `ppt/slides/slide1.xml`.
    pub part_name: String,

    /// Speaker notes text.
    pub notes: Option<String>,

    /// Placeholder geometry inherited from the slide layout.
    pub layout: LayoutPlaceholders,

    xml: XmlDocument,
}

impl Slide {
    /// Wrap a parsed slide part, checking that it has a usable shape tree.
    pub fn new(number: usize, part_name: impl Into<String>, xml: XmlDocument) -> Result<Self> {
        let part_name = part_name.into();
        let tree = xml.root.find(SHAPE_TREE).ok_or_else(|| {
            Error::DocumentOpen(format!("{} has no shape tree", part_name))
        })?;
        check_group_depth(tree)?;

        Ok(Self {
            number,
            id: None,
            part_name,
            notes: None,
            layout: LayoutPlaceholders::default(),
            xml,
        })
    }

    /// Parse slide XML text and wrap it.
    pub fn from_xml(number: usize, part_name: impl Into<String>, xml: &str) -> Result<Self> {
        let part_name = part_name.into();
        let doc = XmlDocument::parse(xml)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", part_name, e)))?;
        Self::new(number, part_name, doc)
    }

    pub fn with_id(mut self, id: Option<u32>) -> Self {
        self.id = id;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_layout(mut self, layout: LayoutPlaceholders) -> Self {
        self.layout = layout;
        self
    }

    fn shape_tree(&self) -> Option<&XmlElement> {
        self.xml.root.find(SHAPE_TREE)
    }

    fn shape_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root.find_mut(SHAPE_TREE)
    }

    /// Shapes directly under the shape tree, in stored order.
    pub fn top_level_shapes(&self) -> Vec<(ShapePath, Shape<'_>)> {
        let Some(tree) = self.shape_tree() else {
            return Vec::new();
        };
        tree.indexed_elements()
            .filter(|(_, el)| is_shape_element(el))
            .map(|(i, el)| (vec![i], Shape::new(el, &self.layout)))
            .collect()
    }

    pub fn shape(&self, path: &[usize]) -> Option<Shape<'_>> {
        if path.is_empty() {
            return None;
        }
        let element = self.shape_tree()?.at_path(path)?;
        Some(Shape::new(element, &self.layout))
    }

    pub fn shape_mut(&mut self, path: &[usize]) -> Option<ShapeMut<'_>> {
        if path.is_empty() {
            return None;
        }
        self.shape_tree_mut()?.at_path_mut(path).map(ShapeMut::new)
    }

    /// Remove the shape at `path`. Raw positions after it shift down by one.
    pub fn remove_shape(&mut self, path: &[usize]) -> bool {
        let Some((&last, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(parent) = self
            .shape_tree_mut()
            .and_then(|tree| tree.at_path_mut(parent_path))
        else {
            return false;
        };
        match parent.children.get(last) {
            Some(XmlNode::Element(el)) if is_shape_element(el) => {
                parent.children.remove(last);
                true
            }
            _ => false,
        }
    }

    /// Append a shape to the shape tree, ahead of any trailing extension list.
    pub fn add_shape(&mut self, shape: XmlElement) -> Option<ShapePath> {
        let tree = self.shape_tree_mut()?;
        let position = tree
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is("extLst")))
            .unwrap_or(tree.children.len());
        tree.children.insert(position, XmlNode::Element(shape));
        Some(vec![position])
    }

    /// An id no shape on this slide uses yet.
    pub fn next_shape_id(&self) -> u32 {
        self.shape_tree()
            .and_then(|tree| tree.max_numeric_attr("cNvPr", "id"))
            .unwrap_or(1)
            + 1
    }

    /// Serialize the slide part.
    pub fn to_xml(&self) -> Result<String> {
        self.xml.to_xml()
    }
}

/// Reject group nesting past [`MAX_GROUP_DEPTH`].
fn check_group_depth(tree: &XmlElement) -> Result<()> {
    let mut pending: Vec<(&XmlElement, usize)> = vec![(tree, 0)];
    while let Some((element, depth)) = pending.pop() {
        for child in element.elements().filter(|el| el.is("grpSp")) {
            let child_depth = depth + 1;
            if child_depth > MAX_GROUP_DEPTH {
                return Err(Error::ShapeNestingTooDeep {
                    depth: MAX_GROUP_DEPTH,
                });
            }
            pending.push((child, child_depth));
        }
    }
    Ok(())
}
