// ============================================================
// CSV INFRASTRUCTURE
// ============================================================
// File-level CSV I/O. Cleaning and typing live in the
// application layer; this module only moves raw cells in and out.

pub mod reader;
pub mod writer;

pub use reader::{parse_content, read_records};
pub use writer::{to_csv_bytes, write_records};
