use tracing::instrument;

use crate::{CharacterBox, Cluster, FrameSize};

/// Largest allowed difference of average top lines, relative to the mean height.
const MAX_Y_DIFF_RATIO: f32 = 0.05;
/// Largest allowed difference of average heights, relative to the taller cluster.
const MAX_HEIGHT_DIFF_RATIO: f32 = 0.05;

pub const DEFAULT_TWIN_THRESHOLD: f32 = 0.6;

/// Where a cluster sits relative to the frame's vertical center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterPosition {
    Left,
    Middle,
    Right,
}

/// Geometry summary of one cluster, derived on demand and never stored with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterFeatures {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub average_y: i32,
    pub average_height: i32,
    pub position: ClusterPosition,
    /// Distance of the edge nearest to the center line.
    pub symmetric_x1: i32,
    /// Distance of the edge furthest from the center line.
    pub symmetric_x2: i32,
    pub index: usize,
}

impl ClusterFeatures {
    /// Returns `None` for an empty cluster.
    pub fn of(cluster: &[CharacterBox], frame: FrameSize, index: usize) -> Option<Self> {
        let first = cluster.first()?;
        let mut min_x = first.rect.x;
        let mut max_x = first.rect.right();
        let mut min_y = first.rect.y;
        for character in &cluster[1..] {
            min_x = min_x.min(character.rect.x);
            max_x = max_x.max(character.rect.right());
            min_y = min_y.min(character.rect.y);
        }
        let len = cluster.len() as i32;
        let average_y = cluster.iter().map(|it| it.rect.y).sum::<i32>() / len;
        let average_height = cluster.iter().map(|it| it.height()).sum::<i32>() / len;

        let mid = frame.mid_x();
        let to_min = mid - min_x;
        let to_max = mid - max_x;
        let (position, symmetric_x1, symmetric_x2) = if to_min >= 0 && to_max > 0 {
            (ClusterPosition::Left, to_max, to_min)
        } else if to_min < 0 && to_max < 0 {
            (ClusterPosition::Right, -to_min, -to_max)
        } else {
            (ClusterPosition::Middle, 0, 0)
        };

        Some(Self {
            min_x,
            max_x,
            min_y,
            average_y,
            average_height,
            position,
            symmetric_x1,
            symmetric_x2,
            index,
        })
    }

    fn symmetric_span(&self) -> i32 {
        self.symmetric_x2 - self.symmetric_x1
    }
}

/// Whether two clusters mirror each other around the frame's center line.
pub fn are_twins(first: &ClusterFeatures, second: &ClusterFeatures, threshold: f32) -> bool {
    let mean_height = (first.average_height + second.average_height) as f32 / 2.0;
    let max_height = first.average_height.max(second.average_height) as f32;
    if mean_height <= 0.0 || max_height <= 0.0 {
        return false;
    }

    let y_diff_ratio = (first.average_y - second.average_y).abs() as f32 / mean_height;
    let height_diff_ratio =
        (first.average_height - second.average_height).abs() as f32 / max_height;
    if y_diff_ratio >= MAX_Y_DIFF_RATIO || height_diff_ratio >= MAX_HEIGHT_DIFF_RATIO {
        return false;
    }

    if first.symmetric_span() <= 0 || second.symmetric_span() <= 0 {
        return false;
    }
    let start = first.symmetric_x1.max(second.symmetric_x1);
    let end = first.symmetric_x2.min(second.symmetric_x2);
    let shared = (end - start) as f32;
    let overlapped_ratio = (shared / first.symmetric_span() as f32)
        .max(shared / second.symmetric_span() as f32);

    overlapped_ratio > threshold
}

/// Pairs every cluster with its first unmatched twin, in index order.
pub fn match_twins(features: &[ClusterFeatures], threshold: f32) -> Vec<Option<usize>> {
    let mut twins = vec![None; features.len()];
    for i in 0..features.len() {
        if twins[i].is_some() {
            continue;
        }
        for j in i + 1..features.len() {
            if twins[j].is_some() {
                continue;
            }
            if are_twins(&features[i], &features[j], threshold) {
                twins[i] = Some(j);
                twins[j] = Some(i);
                break;
            }
        }
    }
    twins
}

fn unmatch(twins: &mut [Option<usize>], i: usize) {
    if let Some(twin) = twins[i].take() {
        twins[twin] = None;
    }
}

/// Drops name pairs in the clock strip and keeps only the most populous pairs.
fn refine_words(
    clusters: &[Cluster],
    features: &[ClusterFeatures],
    twins: &mut [Option<usize>],
    frame: FrameSize,
) {
    let bottom_strip = frame.height * 4 / 5;
    for i in 0..twins.len() {
        if twins[i].is_some() && features[i].average_y > bottom_strip {
            unmatch(twins, i);
        }
    }

    let Some(more) = (0..twins.len())
        .filter(|i| twins[*i].is_some())
        .map(|i| clusters[i].len())
        .max()
    else {
        return;
    };
    for i in 0..twins.len() {
        if let Some(twin) = twins[i] {
            if clusters[i].len() < more && clusters[twin].len() < more {
                unmatch(twins, i);
            }
        }
    }
}

/// Keeps a pair unless both members are shorter than the tallest pair seen so far.
fn refine_by_height(features: &[ClusterFeatures], twins: &mut [Option<usize>]) {
    let mut largest: Option<i32> = None;
    for i in 0..twins.len() {
        let Some(twin) = twins[i] else {
            continue;
        };
        let height = features[i].average_height;
        let current = *largest.get_or_insert(height);
        if current > height && current > features[twin].average_height {
            unmatch(twins, i);
        } else {
            largest = Some(height);
        }
    }
}

/// Erases every cluster that has no mirror-symmetric twin.
///
/// With `word` set, pairs in the bottom fifth of the frame and pairs with fewer glyphs than
/// the most populous pair are dropped as well. Otherwise pairs shorter than the running
/// tallest pair are dropped.
#[instrument(level = "debug", skip(clusters), fields(count = clusters.len()))]
pub fn keep_twins(clusters: &mut Vec<Cluster>, frame: FrameSize, word: bool, threshold: f32) {
    clusters.retain(|cluster| !cluster.is_empty());
    let features = clusters
        .iter()
        .enumerate()
        .filter_map(|(index, cluster)| ClusterFeatures::of(cluster, frame, index))
        .collect::<Vec<_>>();

    let mut twins = match_twins(&features, threshold);
    if word {
        refine_words(clusters, &features, &mut twins, frame);
    } else {
        refine_by_height(&features, &mut twins);
    }

    for index in (0..clusters.len()).rev() {
        if twins[index].is_none() {
            clusters.remove(index);
        }
    }
    log::debug!("Kept {} twin clusters", clusters.len());
}
