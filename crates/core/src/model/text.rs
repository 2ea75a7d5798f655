//! Text frames, paragraphs and runs (`a:txBody`, `a:p`, `a:r`).

use crate::normalize::{is_blank, single_line};
use crate::units::{centipoints_to_points, points_to_centipoints};
use crate::xml::{XmlElement, XmlNode};
use serde::{Deserialize, Serialize};

/// Child order of `a:rPr` / `a:defRPr`.
const RUN_PROPERTY_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

/// Child order of `a:pPr`.
const PARAGRAPH_PROPERTY_ORDER: &[&str] = &[
    "lnSpc", "spcBef", "spcAft", "buClrTx", "buClr", "buSzTx", "buSzPct", "buSzPts", "buFontTx",
    "buFont", "buNone", "buAutoNum", "buChar", "buBlip", "tabLst", "defRPr", "extLst",
];

const RUN_CHILD_ORDER: &[&str] = &["rPr", "t"];
const PARAGRAPH_CHILD_ORDER: &[&str] = &["pPr", "r", "br", "fld", "endParaRPr"];
const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// Elements that carry a paragraph's visible text.
const INLINE_ELEMENTS: &[&str] = &["r", "br", "fld"];

/// An sRGB color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse a six-digit hex value such as `1F4E79`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self((value >> 16) as u8, (value >> 8) as u8, value as u8))
    }

    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Paragraph alignment (`a:pPr@algn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    JustifyLow,
    Distributed,
    ThaiDistributed,
}

impl Alignment {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" => Some(Self::Justify),
            "justLow" => Some(Self::JustifyLow),
            "dist" => Some(Self::Distributed),
            "thaiDist" => Some(Self::ThaiDistributed),
            _ => None,
        }
    }
}

/// Formatting declared directly on a run. Inherited values are not resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Size in points.
    pub size: Option<f64>,
    pub name: Option<String>,
    pub color: Option<Rgb>,
}

impl Font {
    fn from_properties(props: Option<&XmlElement>) -> Self {
        let Some(props) = props else {
            return Self::default();
        };
        Self {
            bold: props.attr("b").and_then(parse_bool),
            italic: props.attr("i").and_then(parse_bool),
            size: props
                .attr("sz")
                .and_then(|v| v.parse::<i64>().ok())
                .map(centipoints_to_points),
            name: props
                .child("latin")
                .and_then(|latin| latin.attr("typeface"))
                .map(str::to_string),
            color: props
                .find(&["solidFill", "srgbClr"])
                .and_then(|clr| clr.attr("val"))
                .and_then(Rgb::from_hex),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn set_typeface(props: &mut XmlElement, name: &str) {
    let latin = props.qualified("latin");
    props
        .ensure_child(&latin, RUN_PROPERTY_ORDER)
        .set_attr("typeface", name);
}

fn set_solid_fill(props: &mut XmlElement, color: Rgb) {
    props.remove_elements_where(|el| FILL_ELEMENTS.contains(&el.local_name()));
    let fill = XmlElement::new(props.qualified("solidFill"))
        .with_child(XmlElement::new(props.qualified("srgbClr")).with_attr("val", color.to_hex()));
    props.insert_ordered(fill, RUN_PROPERTY_ORDER);
}

/// Name for a DrawingML element created inside `parent`'s text body.
fn drawing_name(parent: &XmlElement, local: &str) -> String {
    if parent.is("txBody") {
        // p:txBody holds a:bodyPr/a:p children; a:txBody (table cells) is already DrawingML
        return match parent.child("bodyPr").or_else(|| parent.child("p")) {
            Some(child) => child.qualified(local),
            None if parent.name.starts_with("a:") => parent.qualified(local),
            None => format!("a:{}", local),
        };
    }
    parent.qualified(local)
}

/// A text run (`a:r`).
#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a XmlElement,
}

impl<'a> Run<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        self.element.child("t").map(|t| t.text()).unwrap_or_default()
    }

    pub fn font(&self) -> Font {
        Font::from_properties(self.element.child("rPr"))
    }
}

/// Mutable access to a text run.
#[derive(Debug)]
pub struct RunMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> RunMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        Run::new(&*self.element).text()
    }

    pub fn font(&self) -> Font {
        Run::new(&*self.element).font()
    }

    pub fn set_text(&mut self, text: &str) {
        let name = self.element.qualified("t");
        self.element.ensure_child(&name, RUN_CHILD_ORDER).set_text(text);
    }

    fn properties(&mut self) -> &mut XmlElement {
        let name = self.element.qualified("rPr");
        self.element.ensure_child(&name, RUN_CHILD_ORDER)
    }

    pub fn set_font_name(&mut self, name: &str) {
        set_typeface(self.properties(), name);
    }

    pub fn set_size(&mut self, points: f64) {
        self.properties()
            .set_attr("sz", points_to_centipoints(points).to_string());
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.properties().set_attr("b", if bold { "1" } else { "0" });
    }

    pub fn set_color(&mut self, color: Rgb) {
        set_solid_fill(self.properties(), color);
    }
}

/// A paragraph (`a:p`).
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a XmlElement,
}

impl<'a> Paragraph<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    /// Visible text: runs and fields in order, line breaks as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for el in self.element.elements() {
            match el.local_name() {
                "r" | "fld" => {
                    if let Some(t) = el.child("t") {
                        out.push_str(&t.text());
                    }
                }
                "br" => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    pub fn runs(&self) -> Vec<Run<'a>> {
        self.element.children_named("r").map(Run::new).collect()
    }

    /// Outline level (0-8).
    pub fn level(&self) -> u8 {
        self.element
            .find(&["pPr"])
            .and_then(|ppr| ppr.attr("lvl"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.element
            .find(&["pPr"])
            .and_then(|ppr| ppr.attr("algn"))
            .and_then(Alignment::from_attr)
    }

    /// A paragraph counts for addressing only if its trimmed text is non-empty.
    pub fn is_significant(&self) -> bool {
        !is_blank(&self.text())
    }
}

/// Mutable access to a paragraph.
#[derive(Debug)]
pub struct ParagraphMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> ParagraphMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        Paragraph::new(&*self.element).text()
    }

    pub fn has_runs(&self) -> bool {
        self.element.child("r").is_some()
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = RunMut<'_>> + '_ {
        self.element.children_named_mut("r").map(RunMut::new)
    }

    /// Replace the visible text, keeping the first run's formatting.
    ///
    /// The first run receives the new text and every other run, field and
    /// line break is removed. A paragraph without runs gets a fresh run.
    pub fn replace_text(&mut self, text: &str) {
        let Some(first) = self
            .element
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is("r")))
        else {
            self.set_text(text);
            return;
        };

        let mut position = 0;
        self.element.children.retain(|node| {
            let keep = match node {
                XmlNode::Element(el) => {
                    position == first || !INLINE_ELEMENTS.contains(&el.local_name())
                }
                _ => true,
            };
            position += 1;
            keep
        });

        if let Some(run) = self.element.child_mut("r") {
            RunMut::new(run).set_text(text);
        }
    }

    /// Replace all inline content with one unformatted run.
    pub fn set_text(&mut self, text: &str) {
        self.element
            .remove_elements_where(|el| INLINE_ELEMENTS.contains(&el.local_name()));
        let run = XmlElement::new(self.element.qualified("r"))
            .with_child(XmlElement::new(self.element.qualified("t")).with_text(text));
        self.element.insert_ordered(run, PARAGRAPH_CHILD_ORDER);
    }

    /// Set the paragraph-level default font (`a:pPr/a:defRPr/a:latin`).
    pub fn set_default_font_name(&mut self, name: &str) {
        let ppr_name = self.element.qualified("pPr");
        let ppr = self.element.ensure_child(&ppr_name, PARAGRAPH_CHILD_ORDER);
        let def_name = ppr.qualified("defRPr");
        let def = ppr.ensure_child(&def_name, PARAGRAPH_PROPERTY_ORDER);
        set_typeface(def, name);
    }

    /// Merge the paragraph into its first run with line breaks stripped.
    pub fn collapse_to_single_line(&mut self) {
        let text = self.text();
        if text.is_empty() {
            return;
        }
        self.replace_text(&single_line(&text));
    }
}

/// A text body (`p:txBody` on shapes, `a:txBody` in table cells).
#[derive(Debug, Clone, Copy)]
pub struct TextFrame<'a> {
    body: &'a XmlElement,
}

impl<'a> TextFrame<'a> {
    pub fn new(body: &'a XmlElement) -> Self {
        Self { body }
    }

    /// All paragraphs, empty ones included.
    pub fn paragraphs(&self) -> Vec<Paragraph<'a>> {
        self.body.children_named("p").map(Paragraph::new).collect()
    }

    /// Significant paragraphs paired with their raw position.
    pub fn significant_paragraphs(&self) -> Vec<(usize, Paragraph<'a>)> {
        self.paragraphs()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| p.is_significant())
            .collect()
    }

    /// Paragraph texts joined by `\n`.
    pub fn text(&self) -> String {
        self.paragraphs()
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Mutable access to a text body.
#[derive(Debug)]
pub struct TextFrameMut<'a> {
    body: &'a mut XmlElement,
}

impl<'a> TextFrameMut<'a> {
    pub fn new(body: &'a mut XmlElement) -> Self {
        Self { body }
    }

    pub fn text(&self) -> String {
        TextFrame::new(&*self.body).text()
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<ParagraphMut<'_>> {
        self.body.children_named_mut("p").nth(index).map(ParagraphMut::new)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = ParagraphMut<'_>> + '_ {
        self.body.children_named_mut("p").map(ParagraphMut::new)
    }

    /// Replace the whole body text, one paragraph per line.
    ///
    /// The first paragraph keeps its properties; every run-level format is
    /// lost. Only the legacy `replace_text` change uses this.
    pub fn set_text(&mut self, text: &str) {
        let mut kept_first = false;
        self.body.remove_elements_where(|el| {
            if !el.is("p") {
                return false;
            }
            if kept_first {
                true
            } else {
                kept_first = true;
                false
            }
        });
        if !kept_first {
            let paragraph = XmlElement::new(drawing_name(&*self.body, "p"));
            self.body.children.push(XmlNode::Element(paragraph));
        }

        let mut lines = text.split('\n');
        if let Some(mut first) = self.paragraph_mut(0) {
            first.set_text(lines.next().unwrap_or_default());
        }
        for line in lines {
            self.push_paragraph(line);
        }
    }

    /// Append a paragraph holding a single run.
    pub fn push_paragraph(&mut self, text: &str) {
        let mut paragraph = XmlElement::new(drawing_name(&*self.body, "p"));
        ParagraphMut::new(&mut paragraph).set_text(text);
        let position = self
            .body
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is("extLst")))
            .unwrap_or(self.body.children.len());
        self.body.children.insert(position, XmlNode::Element(paragraph));
    }
}
