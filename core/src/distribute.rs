//! Largest-remainder integer apportionment.
//!
//! Floors every fractional share, then hands the leftover units to the
//! entries with the largest remainders. The result always sums to
//! `total` exactly.

/// Split `total` into integer parts proportional to `weights`.
///
/// Negative and non-finite weights count as zero. If every weight is
/// zero the total is split evenly, with the leftover units going to the
/// earliest entries.
pub fn distribute(total: u64, weights: &[f64]) -> Vec<u64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let clean: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let weight_sum: f64 = clean.iter().sum();

    if weight_sum <= 0.0 {
        let base = total / n as u64;
        let extra = (total % n as u64) as usize;
        return (0..n).map(|i| base + u64::from(i < extra)).collect();
    }

    let mut parts = Vec::with_capacity(n);
    let mut remainders = Vec::with_capacity(n);
    let mut assigned: u64 = 0;
    for (i, w) in clean.iter().enumerate() {
        let exact = total as f64 * (w / weight_sum);
        let floor = exact.floor().max(0.0) as u64;
        parts.push(floor);
        remainders.push((i, exact - floor as f64));
        assigned += floor;
    }

    // Float error can push the floors a unit over; take it back from
    // the smallest remainders among non-empty parts.
    while assigned > total {
        let idx = remainders
            .iter()
            .filter(|(i, _)| parts[*i] > 0)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| *i);
        match idx {
            Some(i) => {
                parts[i] -= 1;
                assigned -= 1;
            }
            None => break,
        }
    }

    // Stable sort keeps earlier entries first on equal remainders.
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut leftover = total - assigned;
    let mut cursor = 0;
    while leftover > 0 {
        let (i, _) = remainders[cursor % n];
        if clean[i] > 0.0 {
            parts[i] += 1;
            leftover -= 1;
        }
        cursor += 1;
    }

    parts
}

/// Two-way split that always conserves the total: the first part is
/// `round(total * ratio)` (ratio clamped to [0, 1]), the second part is
/// whatever remains.
pub fn split_pair(total: u64, ratio: f64) -> (u64, u64) {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let first = ((total as f64 * ratio).round() as u64).min(total);
    (first, total - first)
}
