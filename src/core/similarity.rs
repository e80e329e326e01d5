//! Character-overlap similarity between two strings.
//!
//! The score is the classic recursive longest-common-substring measure: take
//! the longest common run of bytes, recurse into the pieces on either side of
//! it, and sum the matched lengths. The percentage is
//! `2 * matched / (len(a) + len(b)) * 100`.
//!
//! Strings are compared byte for byte with no normalisation, so case,
//! whitespace and multi-byte sequences all count as-is.

/// Similarity of `a` and `b` as a percentage in `[0, 100]`.
///
/// Symmetric, and `100.0` for identical non-empty inputs. Two empty strings
/// score `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_bytes(a.as_bytes(), b.as_bytes())
}

/// Byte-slice form of [`similarity`].
pub fn similarity_bytes(a: &[u8], b: &[u8]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    // Tie-breaking between equally long runs depends on argument order, so
    // always evaluate the pair in one canonical order.
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let matched = matched_chars(first, second);

    (matched * 200) as f64 / total as f64
}

/// Total bytes matched by the recursive longest-common-substring walk.
pub fn matched_chars(a: &[u8], b: &[u8]) -> usize {
    let mut total = 0;
    let mut pending = vec![(a, b)];

    while let Some((left, right)) = pending.pop() {
        let Some(run) = longest_common_run(left, right) else {
            continue;
        };
        total += run.len;
        pending.push((&left[..run.start_a], &right[..run.start_b]));
        pending.push((
            &left[run.start_a + run.len..],
            &right[run.start_b + run.len..],
        ));
    }

    total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommonRun {
    start_a: usize,
    start_b: usize,
    len: usize,
}

/// First longest common run, scanning `a` then `b` from the left.
fn longest_common_run(a: &[u8], b: &[u8]) -> Option<CommonRun> {
    let mut best: Option<CommonRun> = None;
    let mut best_len = 0;

    for start_a in 0..a.len() {
        if a.len() - start_a <= best_len {
            break;
        }
        for start_b in 0..b.len() {
            if b.len() - start_b <= best_len {
                break;
            }
            let len = a[start_a..]
                .iter()
                .zip(&b[start_b..])
                .take_while(|(x, y)| x == y)
                .count();
            if len > best_len {
                best_len = len;
                best = Some(CommonRun {
                    start_a,
                    start_b,
                    len,
                });
            }
        }
    }

    best
}
