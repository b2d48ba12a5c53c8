//! Savitzky–Golay smoothing with polynomial-fit edges.

/// Solve a small dense system `a * x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Least-squares weights that evaluate the degree-`degree` fit over a
/// centred window at offset `t` from the window centre.
///
/// Returns `None` when the window cannot support the polynomial.
pub fn savgol_coeffs(window: usize, degree: usize, t: f64) -> Option<Vec<f64>> {
    if window % 2 == 0 || degree >= window {
        return None;
    }
    let half = (window / 2) as f64;
    let positions: Vec<f64> = (0..window).map(|i| i as f64 - half).collect();
    let terms = degree + 1;

    // normal equations A^T A
    let mut ata = vec![vec![0.0; terms]; terms];
    for (r, row) in ata.iter_mut().enumerate() {
        for (c, entry) in row.iter_mut().enumerate() {
            *entry = positions.iter().map(|z| z.powi((r + c) as i32)).sum();
        }
    }
    let basis: Vec<f64> = (0..terms).map(|j| t.powi(j as i32)).collect();
    let u = solve(ata, basis)?;

    Some(
        positions
            .iter()
            .map(|z| (0..terms).map(|j| u[j] * z.powi(j as i32)).sum())
            .collect(),
    )
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

/// Smooth `values` with a Savitzky–Golay filter.
///
/// Interior samples use the centred window. The first and last `window / 2`
/// samples are evaluated from the polynomial fitted to the first and last
/// full window. Inputs shorter than the window, or parameters that cannot
/// define a filter, are returned unchanged.
pub fn smooth(values: &[f64], window: usize, degree: usize) -> Vec<f64> {
    let n = values.len();
    if n < window {
        return values.to_vec();
    }
    let half = window / 2;
    let weights_at = |t: i64| savgol_coeffs(window, degree, t as f64);
    let Some(centre) = weights_at(0) else {
        log::warn!("invalid Savitzky-Golay parameters: window {window}, degree {degree}");
        return values.to_vec();
    };

    let mut smoothed = values.to_vec();
    for i in half..n - half {
        smoothed[i] = dot(&centre, &values[i - half..=i + half]);
    }

    let head = &values[..window];
    let tail = &values[n - window..];
    for k in 0..half {
        let offset = (k + 1) as i64;
        if let Some(w) = weights_at(-offset) {
            smoothed[half - k - 1] = dot(&w, head);
        }
        if let Some(w) = weights_at(offset) {
            smoothed[n - half + k] = dot(&w, tail);
        }
    }
    smoothed
}
