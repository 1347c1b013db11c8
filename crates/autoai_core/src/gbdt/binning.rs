//! Feature quantization
//!
//! Each feature gets a sorted list of cut thresholds. A value's bin is the
//! number of thresholds strictly below it, so `bin(x) <= b` exactly when
//! `x <= thresholds[b]`: splitting on bins and evaluating trees on raw values
//! agree. NaN lands in the last bin and therefore always goes right.

/// Per-feature cut thresholds learned from training data
#[derive(Debug, Clone, PartialEq)]
pub struct BinMapper {
    thresholds: Vec<Vec<f64>>,
}

impl BinMapper {
    /// Learn at most `max_bins - 1` thresholds per feature.
    ///
    /// Thresholds sit at midpoints between adjacent distinct values. When a
    /// feature has more distinct values than bins, cuts are taken at evenly
    /// spaced ranks among the distinct values.
    pub fn fit(rows: &[Vec<f64>], max_bins: usize) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let thresholds = (0..n_features)
            .map(|f| {
                let mut distinct: Vec<f64> = rows
                    .iter()
                    .map(|row| row[f])
                    .filter(|v| !v.is_nan())
                    .collect();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();
                cut_points(&distinct, max_bins)
            })
            .collect();
        Self { thresholds }
    }

    pub fn n_features(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self, feature: usize) -> &[f64] {
        &self.thresholds[feature]
    }

    /// Number of bins for a feature (one more than its thresholds)
    pub fn n_bins(&self, feature: usize) -> usize {
        self.thresholds[feature].len() + 1
    }

    pub fn bin_value(&self, feature: usize, value: f64) -> u16 {
        let cuts = &self.thresholds[feature];
        if value.is_nan() {
            return cuts.len() as u16;
        }
        cuts.partition_point(|&t| t < value) as u16
    }

    /// Bin every row into column-major storage
    pub fn transform(&self, rows: &[Vec<f64>]) -> BinnedMatrix {
        let columns = (0..self.n_features())
            .map(|f| rows.iter().map(|row| self.bin_value(f, row[f])).collect())
            .collect();
        BinnedMatrix {
            columns,
            n_rows: rows.len(),
        }
    }
}

fn cut_points(distinct: &[f64], max_bins: usize) -> Vec<f64> {
    let midpoint = |i: usize| distinct[i - 1] + (distinct[i] - distinct[i - 1]) / 2.0;

    if distinct.len() <= max_bins {
        return (1..distinct.len()).map(midpoint).collect();
    }

    let mut cuts: Vec<f64> = (1..max_bins)
        .map(|k| midpoint(k * distinct.len() / max_bins))
        .collect();
    cuts.dedup();
    cuts
}

/// Column-major bin indices
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    columns: Vec<Vec<u16>>,
    n_rows: usize,
}

impl BinnedMatrix {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column(&self, feature: usize) -> &[u16] {
        &self.columns[feature]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_thresholds() {
        let rows = vec![vec![1.0], vec![3.0], vec![3.0], vec![5.0]];
        let mapper = BinMapper::fit(&rows, 256);
        assert_eq!(mapper.thresholds(0), &[2.0, 4.0]);
        assert_eq!(mapper.n_bins(0), 3);
        assert_eq!(mapper.bin_value(0, 1.0), 0);
        assert_eq!(mapper.bin_value(0, 2.0), 0);
        assert_eq!(mapper.bin_value(0, 3.0), 1);
        assert_eq!(mapper.bin_value(0, 9.0), 2);
        assert_eq!(mapper.bin_value(0, f64::NAN), 2);
    }

    #[test]
    fn test_bin_order_matches_threshold_comparison() {
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![(i * 7 % 13) as f64 * 0.5]).collect();
        let mapper = BinMapper::fit(&rows, 4);
        assert!(mapper.thresholds(0).len() <= 3);

        for (b, &t) in mapper.thresholds(0).iter().enumerate() {
            for row in &rows {
                let x = row[0];
                assert_eq!(mapper.bin_value(0, x) as usize <= b, x <= t);
            }
        }
    }

    #[test]
    fn test_constant_and_missing_columns() {
        let rows = vec![vec![2.0, f64::NAN], vec![2.0, f64::NAN]];
        let mapper = BinMapper::fit(&rows, 256);
        assert!(mapper.thresholds(0).is_empty());
        assert!(mapper.thresholds(1).is_empty());

        let binned = mapper.transform(&rows);
        assert_eq!(binned.n_rows(), 2);
        assert_eq!(binned.column(1), &[0, 0]);
    }
}
