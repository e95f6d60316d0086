use tracing::instrument;

use crate::{AssembledText, CharacterBox, Cluster};

/// Spacing between two horizontally adjacent glyphs.
///
/// Touching or overlapping glyphs get no space, a gap wider than
/// `left.height * height_to_dist_ratio` gets two, anything in between one.
pub fn spaces_between(
    left: &CharacterBox,
    right: &CharacterBox,
    height_to_dist_ratio: f32,
) -> &'static str {
    let gap = right.rect.x - left.rect.right();
    if gap <= 0 {
        ""
    } else if gap as f32 > left.height() as f32 * height_to_dist_ratio {
        "  "
    } else {
        " "
    }
}

fn glyph_text(character: &CharacterBox) -> &str {
    character.text.lines().next().unwrap_or("")
}

/// Reads one cluster left to right. Empty clusters produce nothing.
pub fn assemble_cluster(
    mut cluster: Cluster,
    height_to_dist_ratio: f32,
) -> Option<AssembledText> {
    cluster.sort_by_key(|it| it.center().x);
    let center = cluster.first()?.center();

    let mut text = String::new();
    for (i, character) in cluster.iter().enumerate() {
        text.push_str(glyph_text(character));
        if let Some(next) = cluster.get(i + 1) {
            text.push_str(spaces_between(character, next, height_to_dist_ratio));
        }
    }

    Some(AssembledText {
        text: text.to_uppercase(),
        center,
    })
}

/// Turns every cluster into its text and orders the results left to right.
#[instrument(level = "debug", skip(clusters), fields(count = clusters.len()))]
pub fn assemble_text(clusters: Vec<Cluster>, height_to_dist_ratio: f32) -> Vec<AssembledText> {
    let mut words = clusters
        .into_iter()
        .filter_map(|cluster| assemble_cluster(cluster, height_to_dist_ratio))
        .collect::<Vec<_>>();
    words.sort_by_key(|it| it.center.x);
    log::debug!(
        "Assembled words: {:?}",
        words.iter().map(|it| it.text.as_str()).collect::<Vec<_>>()
    );
    words
}
