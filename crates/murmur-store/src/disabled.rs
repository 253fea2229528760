//! Disabled backend: reads find nothing, writes change nothing

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    bucket::{Bucket, DownloadStream, UploadStream},
    collection::{
        Collection, Cursor, DeleteResult, Document, FindOptions, InsertManyResult,
        InsertOneResult, SortOrder, UpdateResult, index_name,
    },
    error::Result,
};

/// A collection that accepts every call and stores nothing
#[derive(Debug, Clone)]
pub struct DisabledCollection {
    name: String,
}

impl DisabledCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn document_id(document: &Document) -> Value {
    document
        .get("_id")
        .cloned()
        .unwrap_or_else(|| Value::String(uuid::Uuid::new_v4().to_string()))
}

#[async_trait]
impl Collection for DisabledCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, _filter: &Document) -> Result<Option<Document>> {
        Ok(None)
    }

    async fn find(&self, _filter: &Document, _options: FindOptions) -> Result<Cursor> {
        Ok(Cursor::empty())
    }

    async fn insert_one(&self, document: Document) -> Result<InsertOneResult> {
        Ok(InsertOneResult {
            inserted_id: document_id(&document),
        })
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<InsertManyResult> {
        Ok(InsertManyResult {
            inserted_ids: documents.iter().map(document_id).collect(),
        })
    }

    async fn update_one(&self, _filter: &Document, _update: &Document) -> Result<UpdateResult> {
        Ok(UpdateResult::default())
    }

    async fn replace_one(&self, _filter: &Document, _replacement: Document) -> Result<UpdateResult> {
        Ok(UpdateResult::default())
    }

    async fn delete_one(&self, _filter: &Document) -> Result<DeleteResult> {
        Ok(DeleteResult::default())
    }

    async fn delete_many(&self, _filter: &Document) -> Result<DeleteResult> {
        Ok(DeleteResult::default())
    }

    async fn count_documents(&self, _filter: &Document) -> Result<u64> {
        Ok(0)
    }

    async fn distinct(&self, _field: &str, _filter: &Document) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn create_index(&self, keys: &[(&str, SortOrder)]) -> Result<String> {
        Ok(index_name(keys))
    }
}

/// A bucket that discards uploads and serves empty downloads
#[derive(Debug, Clone, Default)]
pub struct DisabledBucket;

struct DiscardingUpload {
    id: String,
}

#[async_trait]
impl UploadStream for DiscardingUpload {
    fn id(&self) -> &str {
        &self.id
    }

    async fn write(&mut self, _chunk: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<String> {
        Ok(self.id)
    }
}

#[async_trait]
impl Bucket for DisabledBucket {
    async fn open_upload_stream(&self, _filename: &str) -> Result<Box<dyn UploadStream>> {
        Ok(Box::new(DiscardingUpload {
            id: uuid::Uuid::new_v4().to_string(),
        }))
    }

    async fn open_download_stream(&self, _id: &str) -> Result<DownloadStream> {
        Ok(Box::pin(futures::stream::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_are_not_observable() {
        let coll = DisabledCollection::new("conversations");
        let inserted = coll
            .insert_one(json!({"_id": "c1", "title": "x"}))
            .await
            .unwrap();
        assert_eq!(inserted.inserted_id, json!("c1"));

        assert!(coll.find_one(&json!({"_id": "c1"})).await.unwrap().is_none());
        assert_eq!(coll.count_documents(&json!({})).await.unwrap(), 0);
        assert!(coll
            .find(&json!({}), FindOptions::default().limit(5))
            .await
            .unwrap()
            .to_vec()
            .is_empty());
        assert!(coll.distinct("title", &json!({})).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_report_zero_effect() {
        let coll = DisabledCollection::new("messages");
        let filter = json!({"_id": "m"});
        assert_eq!(
            coll.update_one(&filter, &json!({"$set": {"a": 1}}))
                .await
                .unwrap()
                .modified_count,
            0
        );
        assert_eq!(coll.delete_many(&json!({})).await.unwrap().deleted_count, 0);
        let ids = coll
            .insert_many(vec![json!({}), json!({"_id": 7})])
            .await
            .unwrap()
            .inserted_ids;
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], json!(7));
    }

    #[tokio::test]
    async fn test_bucket_round_trip_is_empty() {
        let bucket = DisabledBucket;
        let mut upload = bucket.open_upload_stream("a.bin").await.unwrap();
        upload.write(b"data").await.unwrap();
        let id = upload.finish().await.unwrap();

        let chunks: Vec<_> = bucket
            .open_download_stream(&id)
            .await
            .unwrap()
            .collect()
            .await;
        assert!(chunks.is_empty());
    }
}
