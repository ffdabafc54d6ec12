/// Shared configuration for point cloud cubitization

/// Decimal digits written for every value in an output record
pub const OUTPUT_PRECISION: usize = 5;

/// Extension of per-bin output records
pub const RECORD_EXTENSION: &str = "txt";

/// Column separator used in output records
pub const COLUMN_SEPARATOR: char = ' ';

/// Number of columns in a point source row
pub const POINT_COLUMNS: usize = 3;

/// Lines starting with this marker are skipped by the text loaders
pub const COMMENT_MARKER: char = '#';

/// Points processed between progress bar refreshes
pub const PROGRESS_POINT_INTERVAL: usize = 50_000;

/// Bins emitted between progress bar refreshes
pub const PROGRESS_BIN_INTERVAL: usize = 1_000;


/// Largest grid a single cloud may be divided into
pub const MAX_TOTAL_BINS: usize = u32::MAX as usize;
