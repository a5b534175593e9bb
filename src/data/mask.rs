//! Boolean inclusion masks produced by gates.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Per-event retain/discard flags, `true` = retained.
///
/// A mask always has one entry per row of the point set it was computed on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// Create a mask from explicit flags.
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// A mask of length `n` with every entry set to `value`.
    pub fn filled(n: usize, value: bool) -> Self {
        Self(vec![value; n])
    }

    /// A mask of length `n` retaining exactly the given rows.
    pub fn from_indices(n: usize, indices: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut flags = vec![false; n];
        for idx in indices {
            if idx >= n {
                return Err(GateError::InvalidArgument(format!(
                    "Row index {} out of bounds for mask of length {}",
                    idx, n
                )));
            }
            flags[idx] = true;
        }
        Ok(Self(flags))
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the mask has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of retained rows.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&keep| keep).count()
    }

    /// Flag for a single row.
    #[inline]
    pub fn get(&self, row: usize) -> bool {
        self.0[row]
    }

    /// Flags as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Iterate over the flags.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Indices of retained rows, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &keep)| keep)
            .map(|(i, _)| i)
    }

    /// Map a mask computed on this mask's retained rows back onto the full set.
    ///
    /// `inner` must have exactly one entry per retained row of `self`.
    pub fn compose(&self, inner: &Mask) -> Result<Mask> {
        let n_kept = self.count();
        if inner.len() != n_kept {
            return Err(GateError::DimensionMismatch {
                expected: n_kept,
                actual: inner.len(),
            });
        }

        let mut inner_flags = inner.iter();
        let flags = self
            .0
            .iter()
            .map(|&keep| keep && inner_flags.next().unwrap_or(false))
            .collect();
        Ok(Self(flags))
    }

    /// Write the mask as a two-column TSV (`event`, `kept` as 0/1).
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(BufWriter::new(file));

        writer.write_record(["event", "kept"])?;
        for (row, &keep) in self.0.iter().enumerate() {
            writer.write_record([row.to_string(), u8::from(keep).to_string()])?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Consume the mask, returning the flags.
    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

impl FromIterator<bool> for Mask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
