//! Peak detection with height, distance and prominence filters.
//!
//! Filters are applied in that order. Missing samples should be passed as
//! NaN; they never form or bound a peak.

/// Peak acceptance criteria.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    /// Inclusive lower bound on peak height
    pub height_min: f64,
    /// Inclusive upper bound on peak height
    pub height_max: f64,
    /// Minimum separation between kept peaks, in samples
    pub distance: usize,
    /// Minimum prominence
    pub prominence: f64,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            height_min: 0.4,
            height_max: 1.0,
            distance: 10,
            prominence: 0.20,
        }
    }
}

/// A detected peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Sample position
    pub index: usize,
    pub value: f64,
    pub prominence: f64,
}

/// Positions of local maxima. Flat tops resolve to their midpoint (rounded down).
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let right_edge = ahead - 1;
                peaks.push((i + right_edge) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Keep peaks at least `distance` samples apart, highest first.
///
/// Ties in height are broken in favour of the later peak.
pub fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Height of a peak above the higher of the two lowest points reached on
/// either side before meeting a higher sample or the series edge.
pub fn prominence(x: &[f64], peak: usize) -> f64 {
    let height = x[peak];

    let mut left_min = height;
    let mut i = peak;
    loop {
        if !(x[i] <= height) {
            break;
        }
        left_min = left_min.min(x[i]);
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = height;
    for &v in &x[peak..] {
        if !(v <= height) {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

/// Find peaks in `x` that pass every criterion of `params`, in ascending position.
pub fn find_peaks(x: &[f64], params: &PeakParams) -> Vec<Peak> {
    let candidates: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&p| params.height_min <= x[p] && x[p] <= params.height_max)
        .collect();
    let spaced = select_by_distance(x, &candidates, params.distance.max(1));
    spaced
        .into_iter()
        .filter_map(|p| {
            let prominence = prominence(x, p);
            (prominence >= params.prominence).then_some(Peak {
                index: p,
                value: x[p],
                prominence,
            })
        })
        .collect()
}
