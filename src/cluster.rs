use tracing::instrument;

use crate::{util::euclidean_distance, CharacterBox, Cluster};

/// Fraction of the member height two facing bottom corners may be apart.
const CORNER_DISTANCE_RATIO: f64 = 0.8;

/// Whether `candidate` sits directly left or right of `member` on the same text line.
fn is_neighbour(member: &CharacterBox, candidate: &CharacterBox) -> bool {
    let m = member.rect;
    let c = candidate.rect;
    let reach = CORNER_DISTANCE_RATIO * member.height() as f64;

    // member's bottom-left corner to candidate's bottom-right corner, and the mirror
    let left = euclidean_distance(m.x, m.bottom(), c.right(), c.bottom());
    let right = euclidean_distance(m.right(), m.bottom(), c.x, c.bottom());

    (left < reach || right < reach) && (m.y - c.y).abs() < member.height()
}

/// Greedily groups boxes into words.
///
/// A cluster is seeded with the last unclustered box. Each pass admits every remaining box
/// that neighbours a member not searched in an earlier pass; the cluster closes on the
/// first pass that admits nothing. Boxes with an empty rect are dropped up front.
#[instrument(level = "debug", skip(characters), fields(count = characters.len()))]
pub fn cluster_characters(mut characters: Vec<CharacterBox>) -> Vec<Cluster> {
    characters.retain(|it| !it.rect.is_empty());
    let mut clusters = Vec::new();
    let Some(seed) = characters.pop() else {
        return clusters;
    };

    let mut current = vec![seed];
    // members before this index have already had their neighbours searched
    let mut searched = 0;

    loop {
        if characters.is_empty() {
            clusters.push(current);
            break;
        }

        let admitted = characters
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                current[searched..]
                    .iter()
                    .any(|member| is_neighbour(member, candidate))
            })
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        searched = current.len();

        if admitted.is_empty() {
            log::trace!("Closing cluster of {} characters", current.len());
            clusters.push(std::mem::take(&mut current));
            if let Some(seed) = characters.pop() {
                current.push(seed);
            }
            searched = 0;
        } else {
            for index in admitted.into_iter().rev() {
                current.push(characters.remove(index));
            }
        }
    }

    log::debug!("Grouped characters into {} clusters", clusters.len());
    clusters
}

fn average_height(cluster: &[CharacterBox]) -> Option<i32> {
    if cluster.is_empty() {
        return None;
    }
    let sum = cluster.iter().map(|it| it.height()).sum::<i32>();
    Some(sum / cluster.len() as i32)
}

/// True when every member height lies within a fifth of the average height.
pub fn same_height(cluster: &[CharacterBox]) -> bool {
    let Some(average) = average_height(cluster) else {
        return false;
    };
    let range = (average - average / 5)..=(average + average / 5);
    cluster.iter().all(|it| range.contains(&it.height()))
}

/// True when every member bottom lies within a tenth of the average height of the
/// average bottom line.
pub fn same_level(cluster: &[CharacterBox]) -> bool {
    let Some(average) = average_height(cluster) else {
        return false;
    };
    let level = cluster.iter().map(|it| it.rect.bottom()).sum::<i32>() / cluster.len() as i32;
    let range = (level - average / 10)..=(level + average / 10);
    cluster.iter().all(|it| range.contains(&it.rect.bottom()))
}
