//! Image generation for loaded themes.
//!
//! Saved entries carry no images; they are regenerated from the decoded
//! swatches on load. The actual drawing belongs to the caller, which plugs
//! in through [`ThemeRenderer`]. [`NoopRenderer`] is used when no images
//! are wanted, and [`HexRenderer`] backs the CLI's text output.

use crate::swatch::{EMPTY_COLOR, Swatches};
use crate::theme::{StoredTheme, ThemeRecord};

/// Produces the two image handles shown for a theme.
pub trait ThemeRenderer {
    type Image;

    /// Small preview used in history lists.
    fn thumbnail(&self, swatches: &Swatches) -> Self::Image;

    /// Full-size image at the renderer's natural dimensions.
    fn full_image(&self, swatches: &Swatches) -> Self::Image;
}

/// Renders nothing.
pub struct NoopRenderer;

impl ThemeRenderer for NoopRenderer {
    type Image = ();

    fn thumbnail(&self, _swatches: &Swatches) {}

    fn full_image(&self, _swatches: &Swatches) {}
}

/// Renders swatches as `#RRGGBB` text; unused slots become `-------`.
pub struct HexRenderer;

impl HexRenderer {
    fn hex(code: i64) -> String {
        if code == EMPTY_COLOR {
            "-------".to_string()
        } else {
            format!("#{:06X}", code & 0x00FF_FFFF)
        }
    }
}

impl ThemeRenderer for HexRenderer {
    type Image = String;

    fn thumbnail(&self, swatches: &Swatches) -> String {
        swatches.codes()[..swatches.used_count()]
            .iter()
            .map(|&c| Self::hex(c))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn full_image(&self, swatches: &Swatches) -> String {
        swatches
            .codes()
            .iter()
            .map(|&c| Self::hex(c))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A loaded theme with its regenerated images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTheme<I> {
    pub record: ThemeRecord,
    pub swatches: Swatches,
    pub thumbnail: I,
    pub full_image: I,
}

impl<I> RenderedTheme<I> {
    pub fn render<R: ThemeRenderer<Image = I>>(theme: StoredTheme, renderer: &R) -> Self {
        let thumbnail = renderer.thumbnail(&theme.swatches);
        let full_image = renderer.full_image(&theme.swatches);
        Self {
            record: theme.record,
            swatches: theme.swatches,
            thumbnail,
            full_image,
        }
    }
}
