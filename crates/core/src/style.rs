//! Presentation-wide font and title style normalization.

use crate::index::SlideIndex;
use crate::model::{Rgb, ShapeKind, ShapeMut, ShapePath, TextFrameMut};
use crate::order::OrderedShape;
use crate::settings::StyleSettings;
use crate::title::TITLE_TOP_THRESHOLD;
use crate::types::{Document, Slide};

/// Applies [`StyleSettings`] across a document.
#[derive(Debug, Clone)]
pub struct StyleNormalizer {
    settings: StyleSettings,
}

impl StyleNormalizer {
    pub fn new(settings: StyleSettings) -> Self {
        Self { settings }
    }

    /// Normalize every slide. Returns `false` when the pass is disabled.
    pub fn normalize(&self, document: &mut Document) -> bool {
        if !self.settings.enabled {
            log::debug!("Style normalization disabled");
            return false;
        }

        let size = self.settings.clamped_title_size();
        let color = self.settings.title_color_rgb.or_else(|| {
            if self.settings.unify_title_color {
                self.detect_title_color(document)
            } else {
                None
            }
        });
        log::debug!(
            "Normalizing style: font {:?}, title size {}, title color {:?}",
            self.settings.default_font_name,
            size,
            color.map(|c| c.to_hex())
        );

        for slide in &mut document.slides {
            self.normalize_slide(slide, size, color);
        }
        true
    }

    fn normalize_slide(&self, slide: &mut Slide, size: f64, color: Option<Rgb>) {
        let title: Option<ShapePath> = {
            let index = SlideIndex::build(slide);
            self.title_shape(&index, size).map(|t| t.path.clone())
        };

        let top_level: Vec<ShapePath> = slide
            .top_level_shapes()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        for path in &top_level {
            if let Some(mut shape) = slide.shape_mut(path) {
                apply_default_font(&mut shape, &self.settings.default_font_name);
            }
        }

        let Some(path) = title else {
            return;
        };
        let Some(mut shape) = slide.shape_mut(&path) else {
            return;
        };
        let Some(mut frame) = shape.text_frame_mut() else {
            return;
        };
        if self.settings.enforce_title_single_line {
            for mut paragraph in frame.paragraphs_mut() {
                paragraph.collapse_to_single_line();
            }
        }
        for mut paragraph in frame.paragraphs_mut() {
            for mut run in paragraph.runs_mut() {
                run.set_font_name(&self.settings.default_font_name);
                run.set_size(size);
                run.set_bold(true);
                if let Some(color) = color {
                    run.set_color(color);
                }
            }
        }
    }

    /// The slide's title for styling purposes.
    ///
    /// A shape that already carries the normalized title style keeps the
    /// title role, so shrinking a heading never hands the role to a larger
    /// neighbour on the next pass.
    fn title_shape<'i, 'a>(
        &self,
        index: &'i SlideIndex<'a>,
        size: f64,
    ) -> Option<&'i OrderedShape<'a>> {
        let classified = index.title_shape();
        if classified.is_some_and(|t| self.has_title_style(t, size)) {
            return classified;
        }
        index
            .shapes
            .iter()
            .filter(|s| s.shape.kind() == ShapeKind::Text)
            .filter(|s| {
                s.geometry.top < TITLE_TOP_THRESHOLD
                    || s.shape.placeholder().is_some_and(|ph| ph.role.is_title())
            })
            .find(|s| self.has_title_style(s, size))
            .or(classified)
    }

    /// Every run is bold, in the default font and at the title size.
    fn has_title_style(&self, shape: &OrderedShape, size: f64) -> bool {
        let Some(frame) = shape.shape.text_frame() else {
            return false;
        };
        let fonts: Vec<_> = frame
            .paragraphs()
            .iter()
            .flat_map(|p| p.runs())
            .map(|run| run.font())
            .collect();
        !fonts.is_empty()
            && fonts.iter().all(|font| {
                font.bold == Some(true)
                    && font.size.is_some_and(|s| (s - size).abs() < 0.01)
                    && font.name.as_deref() == Some(self.settings.default_font_name.as_str())
            })
    }

    /// The first explicit run color of any title, scanning slides in order.
    pub fn detect_title_color(&self, document: &Document) -> Option<Rgb> {
        let size = self.settings.clamped_title_size();
        document.slides.iter().find_map(|slide| {
            let index = SlideIndex::build(slide);
            let frame = self.title_shape(&index, size)?.shape.text_frame()?;
            frame
                .paragraphs()
                .iter()
                .flat_map(|p| p.runs())
                .find_map(|run| run.font().color)
        })
    }
}

/// Set the default font on every text frame of a shape, descending into
/// groups and table cells.
fn apply_default_font(shape: &mut ShapeMut, font: &str) {
    if let Some(mut table) = shape.table_mut() {
        for mut frame in table.text_frames_mut() {
            apply_default_font_to_frame(&mut frame, font);
        }
        return;
    }
    if let Some(mut frame) = shape.text_frame_mut() {
        apply_default_font_to_frame(&mut frame, font);
        return;
    }
    for mut child in shape.children_mut() {
        apply_default_font(&mut child, font);
    }
}

fn apply_default_font_to_frame(frame: &mut TextFrameMut, font: &str) {
    for mut paragraph in frame.paragraphs_mut() {
        if paragraph.has_runs() {
            for mut run in paragraph.runs_mut() {
                run.set_font_name(font);
            }
        } else {
            paragraph.set_default_font_name(font);
        }
    }
}
