use image::DynamicImage;
use imageproc::point::Point;
use tracing::instrument;

use crate::{
    util::{mask_outlines, part_image},
    CharacterBox, Result,
};

/// Recognises the single glyph shown in a cropped image.
pub trait GlyphClassifier {
    fn classify(&self, glyph: &DynamicImage) -> Result<String>;
}

impl<F> GlyphClassifier for F
where
    F: Fn(&DynamicImage) -> Result<String>,
{
    fn classify(&self, glyph: &DynamicImage) -> Result<String> {
        self(glyph)
    }
}

/// How a glyph crop is prepared before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropOptions {
    /// Blank every pixel outside the glyph's contours, so margins never show a neighbour.
    pub mask: bool,
    /// Invert the crop, for light glyphs on a dark overlay.
    pub invert: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            mask: true,
            invert: false,
        }
    }
}

/// Only the first character of the first recognised line is trusted.
fn first_glyph(text: &str) -> Option<String> {
    text.lines()
        .next()
        .and_then(|line| line.chars().next())
        .map(String::from)
}

/// Labels every box with the glyph the classifier sees in its crop.
///
/// Boxes the classifier returns nothing for are dropped.
#[instrument(
    level = "debug",
    skip(characters, image, classifier),
    fields(count = characters.len())
)]
pub fn label_characters<C: GlyphClassifier + ?Sized>(
    characters: Vec<CharacterBox>,
    image: &DynamicImage,
    classifier: &C,
    crop_options: CropOptions,
) -> Result<Vec<CharacterBox>> {
    let mut labeled = Vec::with_capacity(characters.len());
    for (i, character) in characters.into_iter().enumerate() {
        let mut crop = part_image(image, &character.rect);
        if crop.width() == 0 || crop.height() == 0 {
            log::trace!("Skipping empty crop for {:?}", character.rect);
            continue;
        }
        if crop_options.mask {
            let origin = Point::new(character.rect.x.max(0), character.rect.y.max(0));
            mask_outlines(&mut crop, origin, character.outlines());
        }
        if crop_options.invert {
            crop.invert();
        }
        #[cfg(feature = "debug")]
        if let Err(err) = crop.save(format!("glyph_crops/{i}.png")) {
            log::warn!("Failed to save glyph crop {i}: {err}");
        }

        let text = classifier.classify(&crop)?;
        match first_glyph(&text) {
            Some(glyph) => labeled.push(character.with_text(glyph)),
            None => log::trace!("Classifier returned nothing for crop {i}"),
        }
    }
    log::debug!("Labeled {} characters", labeled.len());
    Ok(labeled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_character_of_first_line() {
        assert_eq!(first_glyph("7\n"), Some("7".to_string()));
        assert_eq!(first_glyph("AB"), Some("A".to_string()));
        assert_eq!(first_glyph("\nA"), None);
        assert_eq!(first_glyph(""), None);
    }
}
