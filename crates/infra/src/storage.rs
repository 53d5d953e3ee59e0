//! Evidence-image storage boundary.
//!
//! Customers may attach photos of damaged or wrong items. Images are uploaded
//! before the request record is written, so a stored request never references
//! a missing image. If any upload in a batch fails, the ones already stored
//! are removed before the error surfaces.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use returnflow_core::TenantId;

/// Evidence-store error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("evidence upload failed: {0}")]
    Upload(String),

    #[error("evidence delete failed: {0}")]
    Delete(String),
}

/// One image as received from the customer.
#[derive(Debug, Clone)]
pub struct EvidenceImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Blob-storage boundary for evidence images.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store one image and return its public URL.
    async fn put(&self, tenant_id: TenantId, image: &EvidenceImage) -> Result<String, StorageError>;

    /// Remove a previously stored image by URL.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// Upload a batch of images, cleaning up on partial failure.
///
/// Returns the stored URLs in input order. On failure the already-uploaded
/// images are deleted on a best-effort basis before the error is returned.
pub async fn upload_evidence_batch(
    store: &dyn EvidenceStore,
    tenant_id: TenantId,
    images: &[EvidenceImage],
) -> Result<Vec<String>, StorageError> {
    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        match store.put(tenant_id, image).await {
            Ok(url) => urls.push(url),
            Err(err) => {
                for url in &urls {
                    if let Err(cleanup_err) = store.delete(url).await {
                        warn!(%url, error = %cleanup_err, "failed to clean up evidence image");
                    }
                }
                return Err(err);
            }
        }
    }
    Ok(urls)
}

/// In-process evidence store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.blobs
            .read()
            .expect("evidence store lock poisoned")
            .contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("evidence store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn put(&self, tenant_id: TenantId, image: &EvidenceImage) -> Result<String, StorageError> {
        let url = format!("mem://{tenant_id}/{}/{}", uuid::Uuid::now_v7(), image.file_name);
        self.blobs
            .write()
            .map_err(|_| StorageError::Upload("evidence store lock poisoned".into()))?
            .insert(url.clone(), image.bytes.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.blobs
            .write()
            .map_err(|_| StorageError::Delete("evidence store lock poisoned".into()))?
            .remove(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn image(name: &str) -> EvidenceImage {
        EvidenceImage {
            file_name: name.into(),
            bytes: vec![0xFF, 0xD8],
        }
    }

    #[tokio::test]
    async fn batch_upload_returns_urls_in_order() {
        let store = InMemoryEvidenceStore::new();
        let urls = upload_evidence_batch(
            &store,
            TenantId::new(),
            &[image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap();

        assert_eq!(urls.len(), 3);
        assert!(urls[0].ends_with("a.jpg"));
        assert!(urls[2].ends_with("c.jpg"));
        assert_eq!(store.len(), 3);
    }

    struct FailAfter {
        inner: InMemoryEvidenceStore,
        allowed: u32,
        puts: AtomicU32,
    }

    #[async_trait]
    impl EvidenceStore for FailAfter {
        async fn put(
            &self,
            tenant_id: TenantId,
            img: &EvidenceImage,
        ) -> Result<String, StorageError> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StorageError::Upload("disk full".into()));
            }
            self.inner.put(tenant_id, img).await
        }

        async fn delete(&self, url: &str) -> Result<(), StorageError> {
            self.inner.delete(url).await
        }
    }

    #[tokio::test]
    async fn partial_failure_cleans_up_stored_images() {
        let store = FailAfter {
            inner: InMemoryEvidenceStore::new(),
            allowed: 2,
            puts: AtomicU32::new(0),
        };

        let err = upload_evidence_batch(
            &store,
            TenantId::new(),
            &[image("a.jpg"), image("b.jpg"), image("c.jpg")],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::Upload(_)));
        assert!(store.inner.is_empty(), "uploaded images should be removed");
    }
}
