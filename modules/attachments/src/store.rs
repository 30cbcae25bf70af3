//! In-memory object store.
//!
//! Stands in for the opaque blob engine behind uploaded attachments; a
//! bucket-backed implementation would attach at this seam.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct StoredAttachment {
    pub meta: AttachmentMeta,
    pub bytes: Bytes,
}

#[derive(Clone, Default)]
pub struct ObjectStore {
    objects: Arc<DashMap<Uuid, StoredAttachment>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(
        &self,
        file_name: String,
        content_type: String,
        bytes: Bytes,
        uploaded_by: String,
    ) -> AttachmentMeta {
        let meta = AttachmentMeta {
            id: Uuid::new_v4(),
            file_name,
            content_type,
            size: bytes.len(),
            uploaded_by,
            created_at: Utc::now(),
        };
        self.objects.insert(
            meta.id,
            StoredAttachment {
                meta: meta.clone(),
                bytes,
            },
        );
        meta
    }

    pub fn get(&self, id: Uuid) -> Option<StoredAttachment> {
        self.objects.get(&id).map(|o| o.clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<AttachmentMeta> {
        self.objects.remove(&id).map(|(_, o)| o.meta)
    }
}
