// projeto: lstmfit
// file: src/neural/data.rs

use log::info;
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::FitError;

pub fn load_series(path: &Path, value_column: usize) -> Result<Vec<f32>, FitError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut series = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = record.get(value_column).ok_or_else(|| {
            FitError::Data(format!(
                "Row {}: column {} is out of bounds ({} fields)",
                row + 1,
                value_column,
                record.len()
            ))
        })?;
        let value: f32 = field.parse().map_err(|_| {
            FitError::Data(format!("Row {}: '{}' is not a number", row + 1, field))
        })?;
        series.push(value);
    }

    if series.is_empty() {
        return Err(FitError::Data(format!("Dataset {} has no rows", path.display())));
    }
    Ok(series)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: f32,
    pub max: f32,
}

impl MinMaxScaler {
    pub fn fit(series: &[f32]) -> Result<Self, FitError> {
        let arr = Array1::from_vec(series.to_vec());
        let min = *arr
            .min()
            .map_err(|e| FitError::Data(format!("Cannot fit scaler: {}", e)))?;
        let max = *arr
            .max()
            .map_err(|e| FitError::Data(format!("Cannot fit scaler: {}", e)))?;
        Ok(Self { min, max })
    }

    // No-op bounds, used when applyScaler is off
    pub fn identity() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    pub fn transform(&self, series: &[f32]) -> Vec<f32> {
        let range = self.max - self.min;
        if range.abs() < f32::EPSILON {
            return vec![0.0; series.len()];
        }
        series.iter().map(|&x| (x - self.min) / range).collect()
    }

    pub fn inverse(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f32::EPSILON {
            return self.min;
        }
        value * range + self.min
    }
}

pub fn effective_count(len: usize, time_steps: usize, batch_size: usize) -> usize {
    if len <= time_steps {
        return 0;
    }
    ((len - time_steps) / batch_size) * batch_size
}

#[derive(Debug)]
pub struct WindowSplit {
    pub x_train: Vec<Vec<f32>>,
    pub y_train: Vec<f32>,
    pub x_test: Vec<Vec<f32>>,
    pub y_test: Vec<f32>,
    pub shift: usize,
    pub effective_count: usize,
}

// Trims the series from the front so the window count divides evenly by
// batch_size, then slices [i, i + time_steps) windows labeled with the
// next point. shift + effective_count == len always holds.
pub fn window_split(
    series: &[f32],
    time_steps: usize,
    batch_size: usize,
    train_split: f32,
) -> Result<WindowSplit, FitError> {
    let len = series.len();
    let count = effective_count(len, time_steps, batch_size);
    if count < 2 * batch_size {
        return Err(FitError::InsufficientData {
            required: time_steps + 2 * batch_size,
            actual: len,
        });
    }
    let shift = len - count;
    debug_assert_eq!(shift + count, len);

    let mut windows = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    for k in 0..count {
        let start = shift - time_steps + k;
        windows.push(series[start..start + time_steps].to_vec());
        labels.push(series[shift + k]);
    }

    let mut n_train = ((count as f32 * train_split) as usize / batch_size) * batch_size;
    n_train = n_train.clamp(batch_size, count - batch_size);

    let (x_train, x_test) = (windows[..n_train].to_vec(), windows[n_train..].to_vec());
    let (y_train, y_test) = (labels[..n_train].to_vec(), labels[n_train..].to_vec());

    info!(
        "📊 Created {} windows of length {} ({} train, {} test)",
        count,
        time_steps,
        x_train.len(),
        x_test.len()
    );

    Ok(WindowSplit {
        x_train,
        y_train,
        x_test,
        y_test,
        shift,
        effective_count: count,
    })
}

pub fn create_batches(
    windows: &[Vec<f32>],
    labels: &[f32],
    batch_size: usize,
) -> Vec<(Vec<Vec<f32>>, Vec<f32>)> {
    let mut rng = rand::rng();
    let mut combined: Vec<(Vec<f32>, f32)> = windows
        .iter()
        .cloned()
        .zip(labels.iter().copied())
        .collect();
    combined.shuffle(&mut rng);
    combined
        .chunks(batch_size)
        .map(|chunk| {
            let (xs, ys): (Vec<_>, Vec<_>) = chunk.iter().cloned().unzip();
            (xs, ys)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn series(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_effective_count_formula() {
        // effective_count == floor((L - t) / b) * b
        assert_eq!(effective_count(100, 10, 16), 80);
        assert_eq!(effective_count(100, 10, 7), 84);
        assert_eq!(effective_count(26, 10, 16), 16);
        assert_eq!(effective_count(25, 10, 16), 0);
        assert_eq!(effective_count(10, 10, 4), 0);
        assert_eq!(effective_count(5, 10, 4), 0);
    }

    #[test]
    fn test_shift_plus_effective_count_equals_len() {
        for &(len, t, b) in &[(100usize, 10usize, 16usize), (57, 5, 4), (200, 40, 16), (33, 3, 8)] {
            let count = effective_count(len, t, b);
            let shift = len - count;
            assert_eq!(shift + count, len);
        }
    }

    #[test]
    fn test_window_split_alignment() {
        let data = series(100);
        let split = window_split(&data, 10, 16, 0.8).unwrap();
        assert_eq!(split.effective_count, 80);
        assert_eq!(split.shift, 20);
        let total = split.x_train.len() + split.x_test.len();
        assert_eq!(total, 80);
        // every window is time_steps long and its label is the next point
        assert_eq!(split.x_train[0].len(), 10);
        assert_eq!(split.x_train[0], data[10..20].to_vec());
        assert_eq!(split.y_train[0], data[20]);
        let last = split.x_test.last().unwrap();
        assert_eq!(last.last().copied().unwrap(), data[98]);
        assert_eq!(*split.y_test.last().unwrap(), data[99]);
    }

    #[test]
    fn test_window_split_counts_are_batch_multiples() {
        let data = series(200);
        let split = window_split(&data, 20, 16, 0.8).unwrap();
        assert_eq!(split.x_train.len() % 16, 0);
        assert_eq!(split.effective_count % 16, 0);
        assert!(!split.x_test.is_empty());
    }

    #[test]
    fn test_window_split_insufficient_data() {
        let data = series(12);
        let result = window_split(&data, 10, 16, 0.8);
        assert!(matches!(result, Err(crate::FitError::InsufficientData { .. })));
    }

    #[test]
    fn test_scaler_range() {
        let data = vec![2.0, 4.0, 6.0, 8.0];
        let scaler = MinMaxScaler::fit(&data).unwrap();
        let scaled = scaler.transform(&data);
        assert_eq!(scaled.first().copied(), Some(0.0));
        assert_eq!(scaled.last().copied(), Some(1.0));
        for &v in &scaled {
            assert!((0.0..=1.0).contains(&v));
        }
        let back = scaler.inverse(scaled[1]);
        assert!((back - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_scaler_degenerate_series() {
        let data = vec![3.0, 3.0, 3.0];
        let scaler = MinMaxScaler::fit(&data).unwrap();
        assert_eq!(scaler.transform(&data), vec![0.0, 0.0, 0.0]);
        assert_eq!(scaler.inverse(0.7), 3.0);
    }

    #[test]
    fn test_create_batches_sizes() {
        let data = series(64);
        let split = window_split(&data, 4, 8, 0.8).unwrap();
        let batches = create_batches(&split.x_train, &split.y_train, 8);
        assert!(!batches.is_empty());
        for (xs, ys) in &batches {
            assert_eq!(xs.len(), ys.len());
            assert!(xs.len() <= 8);
        }
        let total: usize = batches.iter().map(|(xs, _)| xs.len()).sum();
        assert_eq!(total, split.x_train.len());
    }

    #[test]
    fn test_load_series_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,value").unwrap();
        writeln!(file, "2024-01-01, 1.5").unwrap();
        writeln!(file, "2024-01-02, 2.5").unwrap();
        writeln!(file, "2024-01-03, 3.5").unwrap();
        file.flush().unwrap();

        let series = load_series(file.path(), 1).unwrap();
        assert_eq!(series, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_load_series_bad_cell() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "value").unwrap();
        writeln!(file, "1.0").unwrap();
        writeln!(file, "abc").unwrap();
        file.flush().unwrap();

        let result = load_series(file.path(), 0);
        assert!(matches!(result, Err(crate::FitError::Data(_))));
    }
}
