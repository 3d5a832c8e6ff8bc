//! Bounded scans over row or column indexes.
//!
//! Every locator walks a prefix of rows or columns with its own predicate;
//! these two helpers are the only place the caps are applied.

/// Returns the first index in `lower..upper`, looking at no more than
/// `limit` indexes, for which `predicate` holds.
pub(crate) fn first_match<F>(lower: usize, upper: usize, limit: usize, mut predicate: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    (lower..upper).take(limit).find(|index| predicate(*index))
}

/// Returns the index with the strictly highest positive score among the first
/// `limit` indexes of `lower..upper`, together with that score.
///
/// Ties keep the earliest index; a best score of zero yields `None`.
pub(crate) fn best_match<F>(lower: usize, upper: usize, limit: usize, mut score: F) -> Option<(usize, usize)>
where
    F: FnMut(usize) -> usize,
{
    let mut best: Option<(usize, usize)> = None;
    for index in (lower..upper).take(limit) {
        let current = score(index);
        if current > best.map(|(_, score)| score).unwrap_or(0) {
            best = Some((index, current));
        }
    }
    best
}
