mod blob;
mod cache_fs;

pub use blob::{BlobStore, PutResult, S3BlobStore};
pub use cache_fs::CacheFs;
