//! Dense point set storing cytometry events across measured channels.

use crate::data::Mask;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Instrument metadata for a single channel.
///
/// Both fields are optional; gates fall back to data-driven defaults when
/// they are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Lowest and highest value the instrument can report.
    pub range: Option<(f64, f64)>,
    /// Default histogram bin edges for this channel.
    pub bin_edges: Option<Vec<f64>>,
}

/// A dense set of events observed over several channels.
///
/// Rows represent events, columns represent channels. Values are stored
/// row-major so a single event is a contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    /// Row-major values (n_rows × n_channels)
    data: Vec<f64>,
    /// Number of events
    n_rows: usize,
    /// Channel names (column names)
    channels: Vec<String>,
    /// Optional instrument metadata per channel
    channel_info: Vec<Option<ChannelInfo>>,
}

impl PointSet {
    /// Create a new PointSet from row-major values and channel names.
    pub fn new(data: Vec<f64>, channels: Vec<String>) -> Result<Self> {
        let n_channels = channels.len();
        if n_channels == 0 {
            return Err(GateError::InvalidArgument(
                "A point set needs at least one channel".to_string(),
            ));
        }
        if data.len() % n_channels != 0 {
            return Err(GateError::DimensionMismatch {
                expected: (data.len() / n_channels + 1) * n_channels,
                actual: data.len(),
            });
        }
        let n_rows = data.len() / n_channels;
        Ok(Self {
            data,
            n_rows,
            channel_info: vec![None; n_channels],
            channels,
        })
    }

    /// Create a PointSet from a slice of rows, naming channels `ch0`, `ch1`, ...
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            GateError::EmptyOrDegenerateInput("Cannot infer channels from zero rows".to_string())
        })?;
        let n_channels = first.len();

        let mut data = Vec::with_capacity(rows.len() * n_channels);
        for row in rows {
            if row.len() != n_channels {
                return Err(GateError::DimensionMismatch {
                    expected: n_channels,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        let channels = (0..n_channels).map(|i| format!("ch{}", i)).collect();
        Self::new(data, channels)
    }

    /// Attach instrument metadata to a channel.
    pub fn with_channel_info(mut self, channel: usize, info: ChannelInfo) -> Result<Self> {
        if channel >= self.n_channels() {
            return Err(GateError::InvalidArgument(format!(
                "Channel index {} out of bounds ({} channels)",
                channel,
                self.n_channels()
            )));
        }
        self.channel_info[channel] = Some(info);
        Ok(self)
    }

    /// Load a point set from a TSV file.
    ///
    /// Expected format:
    /// - First row: channel names
    /// - Subsequent rows: one event per line, one numeric value per channel
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let channels: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();
        if channels.is_empty() || channels.iter().all(|c| c.is_empty()) {
            return Err(GateError::EmptyOrDegenerateInput(
                "TSV must have at least one channel".to_string(),
            ));
        }

        let mut data = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != channels.len() {
                return Err(GateError::DimensionMismatch {
                    expected: channels.len(),
                    actual: record.len(),
                });
            }
            for (col_idx, field) in record.iter().enumerate() {
                let value: f64 = field.trim().parse().map_err(|_| GateError::InvalidValue {
                    value: field.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
                data.push(value);
            }
        }

        Self::new(data, channels)
    }

    /// Write the point set to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(BufWriter::new(file));

        writer.write_record(&self.channels)?;
        for row in 0..self.n_rows {
            writer.write_record(self.row(row).iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Number of events (rows).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of channels (columns).
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// True when the set holds no events.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Channel names.
    #[inline]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Instrument metadata for a channel, if any was attached.
    pub fn channel_info(&self, channel: usize) -> Option<&ChannelInfo> {
        self.channel_info.get(channel).and_then(|info| info.as_ref())
    }

    /// Position of a channel by name.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    /// Get the value at (row, channel).
    #[inline]
    pub fn get(&self, row: usize, channel: usize) -> f64 {
        self.data[row * self.n_channels() + channel]
    }

    /// All values of one event.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.n_channels();
        &self.data[row * n..(row + 1) * n]
    }

    /// Copy one channel into a dense vector.
    pub fn column(&self, channel: usize) -> Vec<f64> {
        (0..self.n_rows).map(|row| self.get(row, channel)).collect()
    }

    /// Underlying row-major values.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Keep the rows where `mask` is true, preserving their order.
    pub fn select(&self, mask: &Mask) -> Result<Self> {
        if mask.len() != self.n_rows {
            return Err(GateError::DimensionMismatch {
                expected: self.n_rows,
                actual: mask.len(),
            });
        }

        let n = self.n_channels();
        let mut data = Vec::with_capacity(mask.count() * n);
        for row in mask.indices() {
            data.extend_from_slice(self.row(row));
        }

        Ok(Self {
            n_rows: data.len() / n,
            data,
            channels: self.channels.clone(),
            channel_info: self.channel_info.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_points() -> PointSet {
        PointSet::from_rows(&[
            vec![1.0, 10.0, 100.0],
            vec![2.0, 20.0, 200.0],
            vec![3.0, 30.0, 300.0],
            vec![4.0, 40.0, 400.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_shape_and_access() {
        let points = create_test_points();
        assert_eq!(points.n_rows(), 4);
        assert_eq!(points.n_channels(), 3);
        assert_eq!(points.channels(), &["ch0", "ch1", "ch2"]);
        assert_eq!(points.get(2, 1), 30.0);
        assert_eq!(points.row(3), &[4.0, 40.0, 400.0]);
        assert_eq!(points.column(2), vec![100.0, 200.0, 300.0, 400.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = PointSet::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(GateError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_select_preserves_order() {
        let points = create_test_points();
        let mask = Mask::from(vec![true, false, false, true]);
        let kept = points.select(&mask).unwrap();

        assert_eq!(kept.n_rows(), 2);
        assert_eq!(kept.row(0), &[1.0, 10.0, 100.0]);
        assert_eq!(kept.row(1), &[4.0, 40.0, 400.0]);
    }

    #[test]
    fn test_select_length_mismatch() {
        let points = create_test_points();
        let mask = Mask::from(vec![true, false]);
        assert!(points.select(&mask).is_err());
    }

    #[test]
    fn test_channel_info_attached() {
        let info = ChannelInfo {
            range: Some((0.0, 1023.0)),
            bin_edges: None,
        };
        let points = create_test_points().with_channel_info(1, info.clone()).unwrap();
        assert_eq!(points.channel_info(1), Some(&info));
        assert_eq!(points.channel_info(0), None);
        assert!(create_test_points().with_channel_info(5, info).is_err());
    }

    #[test]
    fn test_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "FSC-A\tSSC-A").unwrap();
        writeln!(file, "100.5\t20").unwrap();
        writeln!(file, "200\t40.25").unwrap();
        file.flush().unwrap();

        let points = PointSet::from_tsv(file.path()).unwrap();
        assert_eq!(points.channels(), &["FSC-A", "SSC-A"]);
        assert_eq!(points.n_rows(), 2);
        assert_eq!(points.get(1, 1), 40.25);
        assert_eq!(points.channel_index("SSC-A"), Some(1));
    }

    #[test]
    fn test_from_tsv_bad_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "FSC-A\tSSC-A").unwrap();
        writeln!(file, "100\tabc").unwrap();
        file.flush().unwrap();

        let result = PointSet::from_tsv(file.path());
        assert!(matches!(
            result,
            Err(GateError::InvalidValue { row: 0, col: 1, .. })
        ));
    }
}
