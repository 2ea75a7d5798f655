//! Applying changes to a slide.

use crate::change::{AddTextbox, Change, DeleteShape, ReplaceText, TargetType};
use crate::locate::{LocatorResolver, Resolution, SkipReason};
use crate::model::{ShapeKind, ShapePath};
use crate::types::Slide;
use crate::units::{inches_to_emu, points_to_centipoints};
use crate::xml::{XmlElement, XmlNode};
use serde::Serialize;
use std::cmp::Reverse;

/// What happened to one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum ChangeOutcome {
    Applied,
    Skipped(SkipReason),
}

impl ChangeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChangeOutcome::Applied)
    }
}

/// Applies the changes of one slide entry.
pub struct ChangeApplier<'s> {
    slide: &'s mut Slide,
}

impl<'s> ChangeApplier<'s> {
    pub fn new(slide: &'s mut Slide) -> Self {
        Self { slide }
    }

    /// Apply changes in descending declared paragraph index, keeping input
    /// order for equal indices. Outcomes follow the application order.
    pub fn apply_all(&mut self, target: TargetType, changes: &[Change]) -> Vec<ChangeOutcome> {
        let mut ordered: Vec<&Change> = changes.iter().collect();
        ordered.sort_by_key(|change| Reverse(change.order_key()));
        ordered
            .into_iter()
            .map(|change| {
                let outcome = self.apply(target, change);
                match outcome {
                    ChangeOutcome::Applied => log::debug!(
                        "Slide {}: applied {}",
                        self.slide.number,
                        change.name()
                    ),
                    ChangeOutcome::Skipped(reason) => log::warn!(
                        "Slide {}: skipped {} ({:?})",
                        self.slide.number,
                        change.name(),
                        reason
                    ),
                }
                outcome
            })
            .collect()
    }

    pub fn apply(&mut self, target: TargetType, change: &Change) -> ChangeOutcome {
        match change {
            Change::ReplaceByIndex(c) => {
                let resolution = {
                    let resolver = LocatorResolver::new(&*self.slide);
                    match target {
                        TargetType::Title => resolver.resolve_title(c),
                        TargetType::Content => resolver.resolve_content_index(c),
                        TargetType::Style => Resolution::Missed(SkipReason::UnsupportedTarget),
                    }
                };
                self.write(resolution, &c.new_text)
            }
            Change::ReplaceByShapeParagraph(c) => {
                let resolution = LocatorResolver::new(&*self.slide).resolve_shape_paragraph(c);
                self.write(resolution, &c.new_text)
            }
            Change::ReplaceText(c) => self.replace_text(c),
            Change::AddTextbox(c) => self.add_textbox(c),
            Change::DeleteShape(c) => self.delete_shape(c),
            Change::NormalizeStyle(_) => ChangeOutcome::Skipped(SkipReason::UnsupportedTarget),
            Change::Unsupported => ChangeOutcome::Skipped(SkipReason::UnknownChangeType),
        }
    }

    fn write(&mut self, resolution: Resolution, new_text: &str) -> ChangeOutcome {
        let target = match resolution {
            Resolution::Found(target) => target,
            Resolution::Missed(reason) => return ChangeOutcome::Skipped(reason),
        };
        log::debug!(
            "Writing shape {:?} paragraph {} via {:?}",
            target.path,
            target.paragraph,
            target.strategy
        );
        let Some(mut shape) = self.slide.shape_mut(&target.path) else {
            return ChangeOutcome::Skipped(SkipReason::NotFound);
        };
        let Some(mut frame) = shape.text_frame_mut() else {
            return ChangeOutcome::Skipped(SkipReason::NotFound);
        };
        match frame.paragraph_mut(target.paragraph) {
            Some(mut paragraph) => {
                paragraph.replace_text(new_text);
                ChangeOutcome::Applied
            }
            None => ChangeOutcome::Skipped(SkipReason::NotFound),
        }
    }

    /// Legacy: rewrite the first top-level text shape containing `old_text`.
    /// The shape's text is rebuilt, so its run formatting is lost.
    fn replace_text(&mut self, change: &ReplaceText) -> ChangeOutcome {
        if change.old_text.is_empty() {
            return ChangeOutcome::Skipped(SkipReason::NoMatch);
        }
        let hit = self
            .slide
            .top_level_shapes()
            .into_iter()
            .filter(|(_, shape)| shape.kind() == ShapeKind::Text)
            .map(|(path, shape)| (path, shape.text()))
            .find(|(_, text)| {
                text.contains(&change.old_text)
                    && (change.new_text.is_empty() || !text.contains(&change.new_text))
            });
        let Some((path, text)) = hit else {
            return ChangeOutcome::Skipped(SkipReason::NoMatch);
        };

        let Some(mut shape) = self.slide.shape_mut(&path) else {
            return ChangeOutcome::Skipped(SkipReason::NoMatch);
        };
        match shape.text_frame_mut() {
            Some(mut frame) => {
                frame.set_text(&text.replace(&change.old_text, &change.new_text));
                ChangeOutcome::Applied
            }
            None => ChangeOutcome::Skipped(SkipReason::NoMatch),
        }
    }

    fn add_textbox(&mut self, change: &AddTextbox) -> ChangeOutcome {
        let id = self.slide.next_shape_id();
        match self.slide.add_shape(textbox_element(id, change)) {
            Some(_) => ChangeOutcome::Applied,
            None => ChangeOutcome::Skipped(SkipReason::NotFound),
        }
    }

    /// Remove every top-level text shape whose text contains the needle.
    fn delete_shape(&mut self, change: &DeleteShape) -> ChangeOutcome {
        if change.text.is_empty() {
            return ChangeOutcome::Skipped(SkipReason::NoMatch);
        }
        let doomed: Vec<ShapePath> = self
            .slide
            .top_level_shapes()
            .into_iter()
            .filter(|(_, shape)| shape.kind() == ShapeKind::Text && shape.text().contains(&change.text))
            .map(|(path, _)| path)
            .collect();
        if doomed.is_empty() {
            return ChangeOutcome::Skipped(SkipReason::NoMatch);
        }
        // Later positions first so earlier paths stay valid
        for path in doomed.iter().rev() {
            self.slide.remove_shape(path);
        }
        log::debug!("Slide {}: deleted {} shapes", self.slide.number, doomed.len());
        ChangeOutcome::Applied
    }
}

/// A word-wrapped text box with one paragraph (line breaks kept as `a:br`).
fn textbox_element(id: u32, change: &AddTextbox) -> XmlElement {
    let size = points_to_centipoints(change.font_size).to_string();
    let mut paragraph = XmlElement::new("a:p");
    for (i, line) in change.text.split('\n').enumerate() {
        if i > 0 {
            paragraph.children.push(XmlNode::Element(
                XmlElement::new("a:br").with_child(
                    XmlElement::new("a:rPr")
                        .with_attr("lang", "en-US")
                        .with_attr("sz", size.as_str()),
                ),
            ));
        }
        paragraph = paragraph.with_child(
            XmlElement::new("a:r")
                .with_child(
                    XmlElement::new("a:rPr")
                        .with_attr("lang", "en-US")
                        .with_attr("sz", size.as_str())
                        .with_attr("dirty", "0"),
                )
                .with_child(XmlElement::new("a:t").with_text(line)),
        );
    }

    let xfrm = XmlElement::new("a:xfrm")
        .with_child(
            XmlElement::new("a:off")
                .with_attr("x", inches_to_emu(change.left).to_string())
                .with_attr("y", inches_to_emu(change.top).to_string()),
        )
        .with_child(
            XmlElement::new("a:ext")
                .with_attr("cx", inches_to_emu(change.width).to_string())
                .with_attr("cy", inches_to_emu(change.height).to_string()),
        );

    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("TextBox {}", id.saturating_sub(1))),
                )
                .with_child(XmlElement::new("p:cNvSpPr").with_attr("txBox", "1"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm)
                .with_child(
                    XmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlElement::new("a:avLst")),
                )
                .with_child(XmlElement::new("a:noFill")),
        )
        .with_child(
            XmlElement::new("p:txBody")
                .with_child(
                    XmlElement::new("a:bodyPr")
                        .with_attr("wrap", "square")
                        .with_attr("rtlCol", "0")
                        .with_child(XmlElement::new("a:spAutoFit")),
                )
                .with_child(XmlElement::new("a:lstStyle"))
                .with_child(paragraph),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ReplaceByIndex, ReplaceByShapeParagraph};
    use crate::index::SlideIndex;
    use crate::normalize::MatchMode;
    use crate::testing::{group, sized_text_box, slide, text_box};

    fn texts(slide: &Slide) -> Vec<String> {
        crate::order::ordered_shapes(slide)
            .iter()
            .flat_map(|s| {
                s.shape
                    .text_frame()
                    .map(|f| f.paragraphs().iter().map(|p| p.text()).collect::<Vec<_>>())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn by_index(index: i64, old: &str, new: &str) -> Change {
        Change::ReplaceByIndex(ReplaceByIndex {
            paragraph_index: Some(index),
            old_text: old.to_string(),
            new_text: new.to_string(),
            match_mode: MatchMode::Exact,
        })
    }

    #[test]
    fn test_basic_title_rewrite() {
        let mut slide = slide(&[
            sized_text_box(2, 0, 0, 32.0, &["Draft"]),
            text_box(3, 1_000_000, 0, &["first point"]),
        ]);
        let outcomes =
            ChangeApplier::new(&mut slide).apply_all(TargetType::Title, &[by_index(0, "Draft", "Final")]);
        assert_eq!(outcomes, vec![ChangeOutcome::Applied]);
        assert_eq!(texts(&slide), vec!["Final", "first point"]);
        // title formatting survives
        let index = SlideIndex::build(&slide);
        let title = index.title_shape().unwrap();
        let run = title.shape.text_frame().unwrap().paragraphs()[0].runs()[0];
        assert_eq!(run.font().size, Some(32.0));
    }

    #[test]
    fn test_multi_change_descending_order() {
        let mut slide = slide(&[
            text_box(2, 0, 0, &["Heading"]),
            text_box(3, 1_000_000, 0, &["zero", "one", "two"]),
        ]);
        let changes = [by_index(0, "zero", "ZERO"), by_index(2, "two", "TWO")];
        let outcomes = ChangeApplier::new(&mut slide).apply_all(TargetType::Content, &changes);
        assert!(outcomes.iter().all(|o| o.is_applied()));
        assert_eq!(texts(&slide), vec!["Heading", "ZERO", "one", "TWO"]);
    }

    #[test]
    fn test_round_trip_addressability() {
        let slide = slide(&[
            sized_text_box(2, 0, 0, 28.0, &["Title"]),
            text_box(3, 1_000_000, 0, &["a", "", "b"]),
            group(4, &[text_box(5, 2_000_000, 0, &["c", "d"])]),
        ]);
        let entries: Vec<_> = SlideIndex::build(&slide)
            .content
            .iter()
            .map(|p| (p.shape_index, p.paragraph_index_in_shape, p.nonempty_index_in_shape, p.paragraph.text()))
            .collect();

        for (shape_index, raw, nonempty, text) in entries {
            let mut copy = slide.clone();
            let change = Change::ReplaceByShapeParagraph(ReplaceByShapeParagraph {
                shape_index: Some(shape_index as i64),
                paragraph_index_in_shape: Some(raw as i64),
                nonempty_index_in_shape: Some(nonempty as i64),
                old_text: text.clone(),
                new_text: format!("{}!", text),
                ..Default::default()
            });
            let before = texts(&copy);
            assert!(ChangeApplier::new(&mut copy).apply(TargetType::Content, &change).is_applied());
            let after = texts(&copy);
            let changed: Vec<_> = before
                .iter()
                .zip(&after)
                .filter(|(b, a)| b != a)
                .collect();
            assert_eq!(changed, vec![(&text, &format!("{}!", text))]);
        }
    }

    #[test]
    fn test_fallback_replaces_moved_paragraph() {
        let mut slide = slide(&[
            text_box(2, 0, 0, &["Heading"]),
            text_box(3, 1_000_000, 0, &["first", "second"]),
        ]);
        let outcome = ChangeApplier::new(&mut slide)
            .apply(TargetType::Content, &by_index(0, "second", "second (updated)"));
        assert!(outcome.is_applied());
        assert_eq!(texts(&slide), vec!["Heading", "first", "second (updated)"]);

        // the updated paragraph is not found again
        let outcome = ChangeApplier::new(&mut slide).apply(
            TargetType::Content,
            &by_index(5, "second (updated)", "second (updated)"),
        );
        assert_eq!(outcome, ChangeOutcome::Skipped(SkipReason::NotFound));
    }

    #[test]
    fn test_style_target_and_unknown_changes_skipped() {
        let mut slide = slide(&[text_box(2, 0, 0, &["x"])]);
        let mut applier = ChangeApplier::new(&mut slide);
        assert_eq!(
            applier.apply(TargetType::Style, &by_index(0, "x", "y")),
            ChangeOutcome::Skipped(SkipReason::UnsupportedTarget)
        );
        assert_eq!(
            applier.apply(TargetType::Content, &Change::Unsupported),
            ChangeOutcome::Skipped(SkipReason::UnknownChangeType)
        );
    }

    #[test]
    fn test_legacy_replace_text() {
        let mut slide = slide(&[
            text_box(2, 0, 0, &["Hello world", "second line"]),
            text_box(3, 1_000_000, 0, &["Hello again"]),
        ]);
        let change = Change::ReplaceText(ReplaceText {
            old_text: "Hello".to_string(),
            new_text: "Bye".to_string(),
        });
        let mut applier = ChangeApplier::new(&mut slide);
        assert!(applier.apply(TargetType::Content, &change).is_applied());
        assert_eq!(texts(&slide), vec!["Bye world", "second line", "Hello again"]);

        let missing = Change::ReplaceText(ReplaceText {
            old_text: "absent".to_string(),
            new_text: "x".to_string(),
        });
        assert_eq!(
            ChangeApplier::new(&mut slide).apply(TargetType::Content, &missing),
            ChangeOutcome::Skipped(SkipReason::NoMatch)
        );
    }

    #[test]
    fn test_add_textbox() {
        let mut slide = slide(&[text_box(7, 0, 0, &["existing"])]);
        let change = Change::AddTextbox(AddTextbox {
            left: 2.0,
            top: 3.0,
            width: 4.0,
            height: 0.5,
            text: "Added".to_string(),
            font_size: 24.0,
        });
        assert!(ChangeApplier::new(&mut slide).apply(TargetType::Content, &change).is_applied());

        let shapes = slide.top_level_shapes();
        let added = &shapes.last().unwrap().1;
        assert_eq!(added.id(), Some(8));
        assert_eq!(added.text(), "Added");
        let geometry = added.geometry();
        assert_eq!((geometry.left, geometry.top), (1_828_800, 2_743_200));
        assert_eq!(geometry.height, 457_200);
        let frame = added.text_frame().unwrap();
        assert_eq!(frame.paragraphs()[0].runs()[0].font().size, Some(24.0));
        let body_pr = added.element().find(&["txBody", "bodyPr"]).unwrap();
        assert_eq!(body_pr.attr("wrap"), Some("square"));
    }

    #[test]
    fn test_delete_shape() {
        let mut slide = slide(&[
            text_box(2, 0, 0, &["keep"]),
            text_box(3, 0, 0, &["DRAFT stamp"]),
            text_box(4, 0, 0, &["also DRAFT"]),
        ]);
        let delete = |text: &str| {
            Change::DeleteShape(DeleteShape {
                text: text.to_string(),
            })
        };
        let mut applier = ChangeApplier::new(&mut slide);
        assert!(applier.apply(TargetType::Content, &delete("DRAFT")).is_applied());
        assert_eq!(
            applier.apply(TargetType::Content, &delete("")),
            ChangeOutcome::Skipped(SkipReason::NoMatch)
        );
        assert_eq!(texts(&slide), vec!["keep"]);
    }
}
