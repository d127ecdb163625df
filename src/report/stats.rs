use serde::Serialize;
use std::cmp::Ordering;

/// Summary of one numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; ties go to the smallest.
    pub mode: f64,
    /// Sample standard deviation (n - 1). `None` below two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// `None` for an empty series. NaNs must already be filtered out.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let std_dev = (n > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    Some(Describe {
        count: n,
        mean,
        median,
        mode: mode_of_sorted(&sorted),
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
    })
}

fn mode_of_sorted(sorted: &[f64]) -> f64 {
    let mut best = (sorted[0], 0usize);
    let mut run = (sorted[0], 0usize);
    for &value in sorted {
        if value == run.0 {
            run.1 += 1;
        } else {
            run = (value, 1);
        }
        // strict > keeps the earliest (smallest) value on ties
        if run.1 > best.1 {
            best = run;
        }
    }
    best.0
}

/// Pearson correlation. `None` when lengths differ, fewer than two points, or
/// either series is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Indices of the `n` largest (`descending`) or smallest values. Equal values keep
/// input order.
pub fn rank_indices(values: &[f64], n: usize, descending: bool) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| {
        let ord = values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    idx.truncate(n);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_describe_small_series() {
        let d = describe(&[4.0, 1.0, 2.0, 2.0, 6.0]).unwrap();
        assert_eq!(d.count, 5);
        assert!(close(d.mean, 3.0));
        assert_eq!(d.median, 2.0);
        assert_eq!(d.mode, 2.0);
        // squared deviations 1 + 4 + 1 + 1 + 9 = 16, / 4 = 4
        assert!(close(d.std_dev.unwrap(), 2.0));
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 6.0);
    }

    #[test]
    fn test_describe_even_count_and_mode_ties() {
        let d = describe(&[3.0, 1.0, 3.0, 1.0]).unwrap();
        assert_eq!(d.median, 2.0);
        assert_eq!(d.mode, 1.0);
    }

    #[test]
    fn test_describe_single_and_empty() {
        let d = describe(&[12.5]).unwrap();
        assert_eq!(d.mean, 12.5);
        assert_eq!(d.mode, 12.5);
        assert_eq!(d.std_dev, None);
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(close(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
        assert_eq!(pearson(&xs, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&xs, &[1.0]), None);
    }

    #[test]
    fn test_rank_indices() {
        let values = [5.0, 1.0, 9.0, 5.0, 3.0];
        assert_eq!(rank_indices(&values, 3, true), vec![2, 0, 3]);
        assert_eq!(rank_indices(&values, 2, false), vec![1, 4]);
        assert_eq!(rank_indices(&values, 10, false).len(), 5);
    }
}
