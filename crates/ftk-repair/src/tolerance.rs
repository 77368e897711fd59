//! Tolerance merging of sorted scalar stations.

/// Collapses runs of values within `tol` of the last kept value, keeping the
/// first of each run. `sorted` must be ascending.
pub fn merge_close(sorted: &[f64], tol: f64) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(sorted.len());
    for &v in sorted {
        match out.last() {
            Some(&kept) if (v - kept).abs() <= tol => {}
            _ => out.push(v),
        }
    }
    out
}

/// Sorts then merges.
pub fn sort_and_merge(mut values: Vec<f64>, tol: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    merge_close(&values, tol)
}
