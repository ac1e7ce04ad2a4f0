// projeto: lstmpredict
// file: src/neural/data.rs

use std::path::Path;

use crate::PredictError;

pub fn load_series(path: &Path, value_column: usize) -> Result<Vec<f32>, PredictError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut series = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = record.get(value_column).ok_or_else(|| {
            PredictError::Data(format!(
                "Row {}: column {} is out of bounds ({} fields)",
                row + 1,
                value_column,
                record.len()
            ))
        })?;
        let value: f32 = field.parse().map_err(|_| {
            PredictError::Data(format!("Row {}: '{}' is not a number", row + 1, field))
        })?;
        series.push(value);
    }

    if series.is_empty() {
        return Err(PredictError::Data(format!("Dataset {} has no rows", path.display())));
    }
    Ok(series)
}

// Bounds come from the model artifact, not refitted here
#[derive(Debug, Clone, Copy)]
pub struct MinMaxScaler {
    pub min: f32,
    pub max: f32,
}

impl MinMaxScaler {
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

pub fn last_window(series: &[f32], time_steps: usize) -> Result<Vec<f32>, PredictError> {
    if series.len() < time_steps {
        return Err(PredictError::InsufficientData {
            required: time_steps,
            actual: series.len(),
        });
    }
    Ok(series[series.len() - time_steps..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_last_window_takes_newest_points() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let window = last_window(&series, 3).unwrap();
        assert_eq!(window, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_last_window_insufficient_data() {
        let series = vec![1.0, 2.0];
        assert!(matches!(
            last_window(&series, 3),
            Err(crate::PredictError::InsufficientData { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_scaler_round_trip_with_stored_bounds() {
        let scaler = MinMaxScaler { min: 10.0, max: 30.0 };
        let scaled = scaler.transform(&[10.0, 20.0, 30.0]);
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
        assert_eq!(scaler.inverse(0.5), 20.0);
    }

    #[test]
    fn test_scaler_degenerate_bounds() {
        let scaler = MinMaxScaler { min: 4.0, max: 4.0 };
        assert_eq!(scaler.transform(&[4.0, 4.0]), vec![0.0, 0.0]);
        assert_eq!(scaler.inverse(0.9), 4.0);
    }

    #[test]
    fn test_load_series_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "value").unwrap();
        writeln!(file, "1.25").unwrap();
        writeln!(file, "2.75").unwrap();
        file.flush().unwrap();

        let series = load_series(file.path(), 0).unwrap();
        assert_eq!(series, vec![1.25, 2.75]);
    }
}
