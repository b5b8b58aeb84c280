// File I/O operations

pub mod csv;
pub mod dataset;
pub mod error;
pub mod store;
pub mod workbook;
pub mod xlsx;

pub use dataset::{load_dataset, UploadFormat};
pub use error::IoError;
pub use store::StoreFile;

/// Verdict side file format version.
/// Increment when the schema changes in a way that old versions can't read
pub const STORE_FORMAT_VERSION: u32 = 1;
