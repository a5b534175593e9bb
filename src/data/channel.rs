//! Channel selection by index or name.

use crate::data::PointSet;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single channel reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    /// Zero-based column index.
    Index(usize),
    /// Channel name, resolved against the point set's channel names.
    Name(String),
}

impl Channel {
    /// Resolve to a column index of `points`.
    pub fn resolve(&self, points: &PointSet) -> Result<usize> {
        match self {
            Channel::Index(idx) => {
                if *idx < points.n_channels() {
                    Ok(*idx)
                } else {
                    Err(GateError::InvalidArgument(format!(
                        "Channel index {} out of bounds ({} channels)",
                        idx,
                        points.n_channels()
                    )))
                }
            }
            Channel::Name(name) => points.channel_index(name).ok_or_else(|| {
                GateError::InvalidArgument(format!("Unknown channel '{}'", name))
            }),
        }
    }

    /// Parse a command-line style reference: digits are indices, anything else a name.
    pub fn parse(s: &str) -> Self {
        match s.parse::<usize>() {
            Ok(idx) => Channel::Index(idx),
            Err(_) => Channel::Name(s.to_string()),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Index(idx) => write!(f, "#{}", idx),
            Channel::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for Channel {
    fn from(idx: usize) -> Self {
        Channel::Index(idx)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel::Name(name.to_string())
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Channel::Name(name)
    }
}

/// The channels a gate operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSelector(Vec<Channel>);

impl ChannelSelector {
    /// Create a selector from any list of channel references.
    pub fn new<C: Into<Channel>>(channels: impl IntoIterator<Item = C>) -> Self {
        Self(channels.into_iter().map(Into::into).collect())
    }

    /// Selector for exactly two channels.
    pub fn pair(x: impl Into<Channel>, y: impl Into<Channel>) -> Self {
        Self(vec![x.into(), y.into()])
    }

    /// Number of channels selected.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no channel is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Referenced channels.
    pub fn channels(&self) -> &[Channel] {
        &self.0
    }

    /// Resolve every channel to a column index.
    pub fn resolve(&self, points: &PointSet) -> Result<Vec<usize>> {
        if self.0.is_empty() {
            return Err(GateError::InvalidArgument(
                "At least one channel should be specified".to_string(),
            ));
        }
        self.0.iter().map(|c| c.resolve(points)).collect()
    }

    /// Resolve a two-channel selector, rejecting any other cardinality.
    pub fn resolve_pair(&self, points: &PointSet) -> Result<(usize, usize)> {
        if self.0.len() != 2 {
            return Err(GateError::InvalidArgument(format!(
                "2 channels should be specified, got {}",
                self.0.len()
            )));
        }
        Ok((self.0[0].resolve(points)?, self.0[1].resolve(points)?))
    }
}

impl Default for ChannelSelector {
    fn default() -> Self {
        Self::pair(0usize, 1usize)
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
