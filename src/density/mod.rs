//! Building blocks of the density gate.
//!
//! ```text
//!   two channels ──► histogram ──► smooth ──► threshold ──► mask
//!                                     │            │
//!                                     └──► contour ◄┘ (cutoff density)
//! ```

pub mod contour;
pub mod histogram;
pub mod smooth;
pub mod threshold;

pub use contour::{trace_contours, trace_isolines, PathCode, TracedPath};
pub use histogram::{
    bin_points, digitize, equal_width_edges, resolve_edges, validate_edges, BinPointIndex,
    BinSpec, Histogram2D, DEFAULT_BIN_COUNT,
};
pub use smooth::{
    estimate_density, gaussian_filter, gaussian_kernel, kernel_radius, DensityField, TRUNCATE,
};
pub use threshold::{select_bins, Selection};
