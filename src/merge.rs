use tracing::instrument;

use crate::CharacterBox;

/// Merges boxes that overlap by more than `threshold` of either box's own area.
///
/// The cursor walks the set once. Every box overlapping the cursor box is folded into it
/// and removed. A box widened late may come to overlap a box the cursor already passed;
/// that pair is left alone, a single pass is the defined behaviour.
#[instrument(level = "debug", skip(characters), fields(count = characters.len()))]
pub fn merge_overlapping(characters: &mut Vec<CharacterBox>, threshold: f32) {
    let mut index = 0;
    while index < characters.len() {
        let reference = characters[index].rect;
        let overlapped = characters
            .iter()
            .enumerate()
            .filter(|(i, other)| *i != index && reference.overlaps(&other.rect, threshold))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        if !overlapped.is_empty() {
            let absorbed = overlapped
                .iter()
                .rev()
                .map(|&i| characters.remove(i))
                .collect::<Vec<_>>();
            index -= overlapped.iter().filter(|i| **i < index).count();

            let anchor = &mut characters[index];
            for other in absorbed.into_iter().rev() {
                anchor.absorb(other);
            }
            log::trace!("Merged {} boxes into {:?}", overlapped.len(), anchor.rect);
        }

        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchor_keeps_identity_when_earlier_box_is_absorbed() {
        // box 0 is widened while processing index 0 and then overlaps box 2
        let mut characters = vec![
            CharacterBox::from_rect(Rect::new(0, 0, 10, 10), "a"),
            CharacterBox::from_rect(Rect::new(8, 0, 10, 10), "b"),
            CharacterBox::from_rect(Rect::new(16, 0, 10, 10), "c"),
        ];
        merge_overlapping(&mut characters, 0.15);
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].rect, Rect::new(0, 0, 26, 10));
        assert_eq!(characters[0].outlines().count(), 3);
    }

    #[test]
    fn box_widened_late_leaves_visited_box_alone() {
        // the middle box only grows into the first box after the cursor has passed it
        let mut characters = vec![
            CharacterBox::from_rect(Rect::new(0, 0, 10, 10), "a"),
            CharacterBox::from_rect(Rect::new(12, 8, 10, 10), "b"),
            CharacterBox::from_rect(Rect::new(2, 12, 20, 10), "c"),
        ];
        merge_overlapping(&mut characters, 0.15);
        assert_eq!(
            characters.iter().map(|it| it.rect).collect::<Vec<_>>(),
            vec![Rect::new(0, 0, 10, 10), Rect::new(2, 8, 20, 14)]
        );
        assert_eq!(characters[1].text, "b");
        assert!(characters[0].rect.overlaps(&characters[1].rect, 0.15));
    }
}
