//! In-memory backend

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    bucket::{Bucket, DownloadStream, UploadStream},
    collection::{
        Collection, Cursor, DeleteResult, Document, FindOptions, InsertManyResult,
        InsertOneResult, SortOrder, UpdateResult, apply_update, compare_values, index_name,
        matches_filter, project, validate_filter,
    },
    error::{Error, Result},
};

/// Download chunk size, matching the usual GridFS default
const CHUNK_SIZE: usize = 255 * 1024;

/// A collection held in process memory
#[derive(Debug, Default)]
pub struct MemoryCollection {
    name: String,
    docs: Mutex<Vec<Document>>,
    indexes: Mutex<Vec<String>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Names of indexes created so far
    pub fn indexes(&self) -> Vec<String> {
        self.indexes.lock().clone()
    }

    fn position(docs: &[Document], filter: &Document) -> Result<Option<usize>> {
        for (i, doc) in docs.iter().enumerate() {
            if matches_filter(doc, filter)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn matching(&self, filter: &Document) -> Result<Vec<Document>> {
        validate_filter(filter)?;
        let docs = self.docs.lock();
        let mut out = Vec::new();
        for doc in docs.iter() {
            if matches_filter(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    fn prepare(docs: &[Document], mut document: Document) -> Result<(Document, Value)> {
        let fields = document
            .as_object_mut()
            .ok_or_else(|| Error::InvalidDocument("expected an object".to_string()))?;
        let id = fields
            .entry("_id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
            .clone();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(Error::InvalidDocument(format!("duplicate _id {}", id)));
        }
        Ok((document, id))
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Document) -> Result<Option<Document>> {
        validate_filter(filter)?;
        let docs = self.docs.lock();
        Ok(Self::position(&docs, filter)?.map(|i| docs[i].clone()))
    }

    async fn find(&self, filter: &Document, options: FindOptions) -> Result<Cursor> {
        let mut docs = self.matching(filter)?;

        if let Some((field, order)) = &options.sort {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        let page = docs
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX));
        let docs = match &options.projection {
            Some(fields) => page.map(|d| project(&d, fields)).collect(),
            None => page.collect(),
        };
        Ok(Cursor::new(docs))
    }

    async fn insert_one(&self, document: Document) -> Result<InsertOneResult> {
        let mut docs = self.docs.lock();
        let (document, id) = Self::prepare(&docs, document)?;
        docs.push(document);
        Ok(InsertOneResult { inserted_id: id })
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<InsertManyResult> {
        let mut docs = self.docs.lock();
        let mut inserted_ids = Vec::with_capacity(documents.len());
        for document in documents {
            let (document, id) = Self::prepare(&docs, document)?;
            docs.push(document);
            inserted_ids.push(id);
        }
        Ok(InsertManyResult { inserted_ids })
    }

    async fn update_one(&self, filter: &Document, update: &Document) -> Result<UpdateResult> {
        validate_filter(filter)?;
        let mut docs = self.docs.lock();
        let Some(i) = Self::position(&docs, filter)? else {
            return Ok(UpdateResult::default());
        };
        let changed = apply_update(&mut docs[i], update)?;
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: changed as u64,
        })
    }

    async fn replace_one(&self, filter: &Document, replacement: Document) -> Result<UpdateResult> {
        validate_filter(filter)?;
        let mut replacement = replacement;
        let fields = replacement
            .as_object_mut()
            .ok_or_else(|| Error::InvalidDocument("expected an object".to_string()))?;

        let mut docs = self.docs.lock();
        let Some(i) = Self::position(&docs, filter)? else {
            return Ok(UpdateResult::default());
        };
        if let Some(id) = docs[i].get("_id") {
            fields.insert("_id".to_string(), id.clone());
        }
        let changed = docs[i] != replacement;
        docs[i] = replacement;
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: changed as u64,
        })
    }

    async fn delete_one(&self, filter: &Document) -> Result<DeleteResult> {
        validate_filter(filter)?;
        let mut docs = self.docs.lock();
        let deleted_count = match Self::position(&docs, filter)? {
            Some(i) => {
                docs.remove(i);
                1
            }
            None => 0,
        };
        Ok(DeleteResult { deleted_count })
    }

    async fn delete_many(&self, filter: &Document) -> Result<DeleteResult> {
        validate_filter(filter)?;
        let mut docs = self.docs.lock();
        let before = docs.len();
        // Filter validity was checked above, so matching cannot fail here.
        docs.retain(|d| !matches_filter(d, filter).unwrap_or(false));
        Ok(DeleteResult {
            deleted_count: (before - docs.len()) as u64,
        })
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn distinct(&self, field: &str, filter: &Document) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for doc in self.matching(filter)? {
            if let Some(v) = doc.get(field) {
                if !values.contains(v) {
                    values.push(v.clone());
                }
            }
        }
        Ok(values)
    }

    async fn create_index(&self, keys: &[(&str, SortOrder)]) -> Result<String> {
        let name = index_name(keys);
        let mut indexes = self.indexes.lock();
        if !indexes.contains(&name) {
            indexes.push(name.clone());
        }
        Ok(name)
    }
}

#[derive(Debug, Clone)]
struct StoredFile {
    filename: String,
    data: Vec<u8>,
}

/// A bucket held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBucket {
    files: Arc<Mutex<HashMap<String, StoredFile>>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Original filename of a stored file
    pub fn filename(&self, id: &str) -> Option<String> {
        self.files.lock().get(id).map(|f| f.filename.clone())
    }
}

struct MemoryUpload {
    id: String,
    filename: String,
    buffer: Vec<u8>,
    files: Arc<Mutex<HashMap<String, StoredFile>>>,
}

#[async_trait]
impl UploadStream for MemoryUpload {
    fn id(&self) -> &str {
        &self.id
    }

    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<String> {
        let upload = *self;
        upload.files.lock().insert(
            upload.id.clone(),
            StoredFile {
                filename: upload.filename,
                data: upload.buffer,
            },
        );
        Ok(upload.id)
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn open_upload_stream(&self, filename: &str) -> Result<Box<dyn UploadStream>> {
        Ok(Box::new(MemoryUpload {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    async fn open_download_stream(&self, id: &str) -> Result<DownloadStream> {
        let data = self
            .files
            .lock()
            .get(id)
            .map(|f| f.data.clone())
            .ok_or_else(|| Error::NotFound(format!("file {}", id)))?;
        let chunks: Vec<Result<Vec<u8>>> =
            data.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    async fn seeded() -> MemoryCollection {
        let coll = MemoryCollection::new("conversations");
        coll.insert_many(vec![
            json!({"_id": "a", "title": "first", "n": 3, "shared": false}),
            json!({"_id": "b", "title": "second", "n": 1, "shared": true}),
            json!({"_id": "c", "title": "third", "n": 2, "shared": false}),
        ])
        .await
        .unwrap();
        coll
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_duplicates() {
        let coll = MemoryCollection::new("t");
        let id = coll.insert_one(json!({"x": 1})).await.unwrap().inserted_id;
        assert!(id.is_string());
        assert!(coll.find_one(&json!({"_id": id})).await.unwrap().is_some());

        coll.insert_one(json!({"_id": "dup"})).await.unwrap();
        assert!(matches!(
            coll.insert_one(json!({"_id": "dup"})).await,
            Err(Error::InvalidDocument(_))
        ));
        assert!(matches!(
            coll.insert_one(json!("not an object")).await,
            Err(Error::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_find_sort_skip_limit_project() {
        let coll = seeded().await;
        let docs = coll
            .find(
                &json!({}),
                FindOptions::default()
                    .sort("n", SortOrder::Descending)
                    .skip(1)
                    .limit(1)
                    .projection(["title"]),
            )
            .await
            .unwrap()
            .to_vec();
        assert_eq!(docs, vec![json!({"_id": "c", "title": "third"})]);
    }

    #[tokio::test]
    async fn test_find_with_filter() {
        let coll = seeded().await;
        let docs = coll
            .find(&json!({"shared": false}), FindOptions::default())
            .await
            .unwrap()
            .to_vec();
        assert_eq!(docs.len(), 2);
        assert_eq!(coll.count_documents(&json!({"shared": true})).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_replace_delete() {
        let coll = seeded().await;

        let r = coll
            .update_one(&json!({"_id": "a"}), &json!({"$set": {"title": "renamed"}}))
            .await
            .unwrap();
        assert_eq!(r, UpdateResult { matched_count: 1, modified_count: 1 });

        let r = coll
            .replace_one(&json!({"_id": "b"}), json!({"title": "replaced"}))
            .await
            .unwrap();
        assert_eq!(r.modified_count, 1);
        let b = coll.find_one(&json!({"_id": "b"})).await.unwrap().unwrap();
        assert_eq!(b, json!({"_id": "b", "title": "replaced"}));

        let r = coll
            .update_one(&json!({"_id": "zzz"}), &json!({"$set": {"x": 1}}))
            .await
            .unwrap();
        assert_eq!(r, UpdateResult::default());

        assert_eq!(coll.delete_one(&json!({"_id": "a"})).await.unwrap().deleted_count, 1);
        assert_eq!(
            coll.delete_many(&json!({"shared": false})).await.unwrap().deleted_count,
            1
        );
        assert_eq!(coll.count_documents(&Value::Null).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distinct_and_indexes() {
        let coll = seeded().await;
        let shared = coll.distinct("shared", &json!({})).await.unwrap();
        assert_eq!(shared, vec![json!(false), json!(true)]);

        let name = coll
            .create_index(&[("updatedAt", SortOrder::Descending)])
            .await
            .unwrap();
        coll.create_index(&[("updatedAt", SortOrder::Descending)])
            .await
            .unwrap();
        assert_eq!(name, "updatedAt_-1");
        assert_eq!(coll.indexes(), vec!["updatedAt_-1".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_an_error() {
        let coll = seeded().await;
        assert!(matches!(
            coll.find_one(&json!("a")).await,
            Err(Error::InvalidFilter(_))
        ));
    }

    #[tokio::test]
    async fn test_bucket_upload_then_download() {
        let bucket = MemoryBucket::new();
        let mut upload = bucket.open_upload_stream("notes.txt").await.unwrap();
        upload.write(b"hello ").await.unwrap();
        upload.write(b"world").await.unwrap();
        let id = upload.finish().await.unwrap();

        let chunks: Vec<Vec<u8>> = bucket
            .open_download_stream(&id)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.concat(), b"hello world");
        assert_eq!(bucket.filename(&id).as_deref(), Some("notes.txt"));
    }

    #[tokio::test]
    async fn test_bucket_missing_file() {
        let bucket = MemoryBucket::new();
        assert!(matches!(
            bucket.open_download_stream("nope").await,
            Err(Error::NotFound(_))
        ));
    }
}
