//! Grapheme cluster iteration and display width.
//!
//! Cells store extended grapheme clusters, not chars. Width is the
//! terminal-column count of a cluster: 0, 1, or 2. Emoji clusters are
//! forced to width 2 regardless of what their constituent scalars report,
//! since terminals render them double-width.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Iterate the extended grapheme clusters of `s`.
pub fn clusters(s: &str) -> impl Iterator<Item = &str> {
    s.graphemes(true)
}

/// Display width of a single grapheme cluster: 0, 1, or 2.
///
/// Control characters and pure combining clusters report 0 and occupy no
/// cell.
pub fn cluster_width(cluster: &str) -> usize {
    if cluster.is_empty() {
        return 0;
    }
    if emoji_get(cluster).is_some() {
        return 2;
    }
    cluster
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum::<usize>()
        .min(2)
}
