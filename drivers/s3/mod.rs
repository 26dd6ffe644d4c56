//! S3 object store driver / S3对象存储驱动

pub mod config;
pub mod driver;

pub use config::S3Config;
pub use driver::S3Store;
