use tracing::instrument;

use crate::{util::contour_area, CharacterBox};

/// Size bounds a contour must satisfy to be considered a glyph. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restrictions {
    pub min_area: f64,
    pub max_area: f64,
    pub min_height: i32,
    pub max_height: i32,
    pub min_width: i32,
    pub max_width: i32,
}

impl Restrictions {
    pub fn accepts(&self, character: &CharacterBox) -> bool {
        let area = contour_area(character.contour());
        if area < self.min_area || area > self.max_area {
            return false;
        }
        let rect = character.rect;
        (self.min_height..=self.max_height).contains(&rect.height)
            && (self.min_width..=self.max_width).contains(&rect.width)
    }
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            min_area: 10.0,
            max_area: 5000.0,
            min_height: 8,
            max_height: 100,
            min_width: 1,
            max_width: 100,
        }
    }
}

/// Keeps the boxes whose contour area and rect size fall within `restrictions`.
#[instrument(level = "debug", skip(characters), fields(count = characters.len()))]
pub fn filter_by_contour_size(
    characters: &[CharacterBox],
    restrictions: &Restrictions,
) -> Vec<CharacterBox> {
    let filtered = characters
        .iter()
        .filter(|character| restrictions.accepts(character))
        .cloned()
        .collect::<Vec<_>>();
    log::debug!(
        "Contour filter kept {} of {} candidates",
        filtered.len(),
        characters.len()
    );
    filtered
}
