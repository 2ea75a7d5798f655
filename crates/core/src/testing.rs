//! Slide XML fixtures for unit tests.

use crate::model::Geometry;
use crate::types::{Document, Slide};

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Shape markup inside a bare shape tree element.
pub fn wrap_fragment(shapes: &str) -> String {
    format!("<p:spTree {}>{}</p:spTree>", NAMESPACES, shapes)
}

/// A complete slide part holding the given shapes.
pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\r\n",
            r#"<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
        ),
        NAMESPACES,
        shapes.concat()
    )
}

/// Paragraphs with one run each; an empty string gives an empty paragraph.
pub fn paragraphs(texts: &[&str], size: Option<f64>) -> String {
    let size = size
        .map(|pt| format!(r#" sz="{}""#, (pt * 100.0).round() as i64))
        .unwrap_or_default();
    texts
        .iter()
        .map(|text| {
            if text.is_empty() {
                r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string()
            } else {
                format!(
                    r#"<a:p><a:r><a:rPr lang="en-US"{}/><a:t>{}</a:t></a:r></a:p>"#,
                    size,
                    escape(text)
                )
            }
        })
        .collect()
}

fn xfrm(prefix: &str, geometry: Geometry) -> String {
    format!(
        r#"<{p}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{p}:xfrm>"#,
        geometry.left,
        geometry.top,
        geometry.width,
        geometry.height,
        p = prefix
    )
}

fn default_geometry(top: i64, left: i64) -> Geometry {
    Geometry {
        top,
        left,
        width: 4_000_000,
        height: 1_000_000,
    }
}

/// A text box with explicit geometry and an optional run size in points.
pub fn framed_text_box(id: u32, geometry: Geometry, size: Option<f64>, texts: &[&str]) -> String {
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>{body}</p:txBody></p:sp>"#
        ),
        id = id,
        xfrm = xfrm("a", geometry),
        body = paragraphs(texts, size)
    )
}

pub fn text_box(id: u32, top: i64, left: i64, texts: &[&str]) -> String {
    framed_text_box(id, default_geometry(top, left), None, texts)
}

pub fn sized_text_box(id: u32, top: i64, left: i64, size: f64, texts: &[&str]) -> String {
    framed_text_box(id, default_geometry(top, left), Some(size), texts)
}

fn placeholder_shape(id: u32, ph: &str, spr: &str, texts: &[&str]) -> String {
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#,
            r#"<p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr>{spr}</p:spPr>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#
        ),
        id = id,
        ph = ph,
        spr = spr,
        body = paragraphs(texts, None)
    )
}

/// A placeholder without its own transform.
pub fn placeholder(id: u32, ph_type: &str, idx: Option<u32>, text: &str) -> String {
    let idx = idx.map(|i| format!(r#" idx="{}""#, i)).unwrap_or_default();
    let ph = format!(r#"<p:ph type="{}"{}/>"#, ph_type, idx);
    placeholder_shape(id, &ph, "", &[text])
}

/// A placeholder positioned on the slide itself.
pub fn placeholder_at(id: u32, ph_type: &str, top: i64, left: i64, texts: &[&str]) -> String {
    let ph = format!(r#"<p:ph type="{}"/>"#, ph_type);
    placeholder_shape(id, &ph, &xfrm("a", default_geometry(top, left)), texts)
}

/// A table frame; each row is a list of cell texts.
pub fn table(id: u32, top: i64, left: i64, rows: &[&[&str]]) -> String {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let grid: String = (0..cols).map(|_| r#"<a:gridCol w="1000000"/>"#).collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|text| {
                    format!(
                        r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody><a:tcPr/></a:tc>"#,
                        paragraphs(&[*text], None)
                    )
                })
                .collect();
            format!(r#"<a:tr h="370840">{}</a:tr>"#, cells)
        })
        .collect();
    format!(
        concat!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>"#,
            r#"{xfrm}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">"#,
            r#"<a:tbl><a:tblPr/><a:tblGrid>{grid}</a:tblGrid>{body}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#
        ),
        id = id,
        xfrm = xfrm("p", default_geometry(top, left)),
        grid = grid,
        body = body
    )
}

/// A group shape around the given children.
pub fn group(id: u32, children: &[String]) -> String {
    format!(
        concat!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="{id}" name="Group {id}"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
            "{children}</p:grpSp>"
        ),
        id = id,
        children = children.concat()
    )
}

pub fn picture(id: u32, top: i64, left: i64) -> String {
    format!(
        concat!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr>{xfrm}</p:spPr></p:pic>"#
        ),
        id = id,
        xfrm = xfrm("a", default_geometry(top, left))
    )
}

/// A slide numbered 1 holding the given shapes.
pub fn slide(shapes: &[String]) -> Slide {
    Slide::from_xml(1, "ppt/slides/slide1.xml", &slide_xml(shapes)).unwrap()
}

/// A document with one slide per entry.
pub fn document(slides: &[Vec<String>]) -> Document {
    let mut doc = Document::new("deck.pptx");
    for (i, shapes) in slides.iter().enumerate() {
        let number = i + 1;
        let part = format!("ppt/slides/slide{}.xml", number);
        doc.add_slide(
            Slide::from_xml(number, part, &slide_xml(shapes))
                .unwrap()
                .with_id(Some(255 + number as u32)),
        );
    }
    doc
}
