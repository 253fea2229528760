//! Binary large-object storage

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// Chunks of a stored file
pub type DownloadStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// An in-progress upload. Nothing is visible until [`UploadStream::finish`].
#[async_trait]
pub trait UploadStream: Send {
    /// Id the file will be stored under
    fn id(&self) -> &str;

    async fn write(&mut self, chunk: &[u8]) -> Result<()>;

    /// Commit the upload, returning the file id
    async fn finish(self: Box<Self>) -> Result<String>;
}

/// Named blob storage with streaming upload and download
#[async_trait]
pub trait Bucket: Send + Sync {
    async fn open_upload_stream(&self, filename: &str) -> Result<Box<dyn UploadStream>>;

    async fn open_download_stream(&self, id: &str) -> Result<DownloadStream>;
}
