//! Greedy non-max suppression.

use crate::pose::detection::Detection;
use crate::pose::rect::Rect;

/// Indices of the boxes that survive greedy non-max suppression.
///
/// Candidates are visited by descending score, ties by ascending index. Each
/// visited candidate that is still live and scores at least `score_threshold`
/// is kept and discards every later live candidate whose IoU with it exceeds
/// `iou_threshold`. The result is in visiting order.
pub fn suppress(
    boxes: &[Rect],
    scores: &[f32],
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());
    let n = boxes.len().min(scores.len());

    let mut order: Vec<usize> = (0..n).collect();
    // Stable sort keeps equal scores in index order.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut live = vec![true; n];
    let mut keep = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        if !live[i] {
            continue;
        }
        if scores[i] < score_threshold {
            // Everything after this point scores lower still.
            break;
        }
        keep.push(i);

        for &j in &order[pos + 1..] {
            if live[j] && boxes[i].iou(&boxes[j]) > iou_threshold {
                live[j] = false;
            }
        }
    }

    keep
}

/// Run [`suppress`] over detections and return the survivors, strongest first.
pub fn suppress_detections(
    candidates: Vec<Detection>,
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<Detection> {
    let boxes: Vec<Rect> = candidates.iter().map(|d| d.bbox).collect();
    let scores: Vec<f32> = candidates.iter().map(|d| d.confidence).collect();
    let keep = suppress(&boxes, &scores, score_threshold, iou_threshold);

    let mut slots: Vec<Option<Detection>> = candidates.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|i| slots[i].take()).collect()
}
