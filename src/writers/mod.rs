pub mod parquet_writer;
pub mod schema;

pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use schema::{ArrowRecord, FromArrow};
