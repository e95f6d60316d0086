use tracing::instrument;

use crate::Cluster;

/// Keeps the clusters of a vertically stacked clock ladder.
///
/// Walking from the last cluster back to the first, a cluster survives only if the top of
/// its first glyph is not below the top of the previously kept cluster. Empty clusters are
/// dropped up front.
#[instrument(level = "debug", skip(clusters), fields(count = clusters.len()))]
pub fn keep_time(clusters: &mut Vec<Cluster>) {
    clusters.retain(|cluster| !cluster.is_empty());
    let Some(mut reference) = clusters.last().map(|cluster| cluster[0].rect.y) else {
        return;
    };

    for index in (0..clusters.len() - 1).rev() {
        let top = clusters[index][0].rect.y;
        if top > reference {
            log::trace!("Dropping clock cluster at y = {top}, below {reference}");
            clusters.remove(index);
        } else {
            reference = top;
        }
    }
}
