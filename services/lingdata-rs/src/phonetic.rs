//! Edit distances between phonetic transcriptions.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::Segmentation;

/// Split a transcription into the units edits are counted over.
pub fn segments(word: &str, segmentation: Segmentation) -> Vec<&str> {
    match segmentation {
        Segmentation::CodePoint => word
            .char_indices()
            .map(|(i, c)| &word[i..i + c.len_utf8()])
            .collect(),
        Segmentation::Grapheme => word.graphemes(true).collect(),
    }
}

/// Levenshtein distance divided by the length of the longer word.
///
/// Two empty words are identical and score 0.
pub fn normalized_edit_distance(word_a: &str, word_b: &str, segmentation: Segmentation) -> f64 {
    let segments_a = segments(word_a, segmentation);
    let segments_b = segments(word_b, segmentation);

    let max_len = segments_a.len().max(segments_b.len());
    if max_len == 0 {
        return 0.0;
    }

    levenshtein(&segments_a, &segments_b) as f64 / max_len as f64
}

/// Unit-cost Levenshtein distance using two rolling rows.
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let len_a = a.len();
    let len_b = b.len();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut prev_row: Vec<usize> = (0..=len_b).collect();
    let mut curr_row = vec![0; len_b + 1];

    for (i, seg_a) in a.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, seg_b) in b.iter().enumerate() {
            let cost = if seg_a == seg_b { 0 } else { 1 };

            curr_row[j + 1] = std::cmp::min(
                std::cmp::min(curr_row[j] + 1, prev_row[j + 1] + 1),
                prev_row[j] + cost,
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len_b]
}

/// Mean normalized distance over every pairing of one synonym from each side.
///
/// Returns `None` when either side has no synonyms.
pub fn mean_cross_distance(
    synonyms_a: &[String],
    synonyms_b: &[String],
    segmentation: Segmentation,
) -> Option<f64> {
    let pairs = synonyms_a.len() * synonyms_b.len();
    if pairs == 0 {
        return None;
    }

    let total: f64 = synonyms_a
        .iter()
        .flat_map(|a| {
            synonyms_b
                .iter()
                .map(move |b| normalized_edit_distance(a, b, segmentation))
        })
        .sum();

    Some(total / pairs as f64)
}
