//! In-memory passport document store.
//!
//! The persistence engine is an opaque source of truth in this design; a
//! document database would attach at this seam. A mutation "commits" when
//! the corresponding map operation returns, which is what gates event
//! emission in the routes.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{PassportBody, PassportDocument};

#[derive(Clone, Default)]
pub struct PassportStore {
    docs: Arc<DashMap<Uuid, PassportDocument>>,
}

impl PassportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, body: PassportBody) -> PassportDocument {
        let now = Utc::now();
        let doc = PassportDocument {
            id: Uuid::new_v4(),
            general_information: body.general_information,
            material_composition: body.material_composition,
            carbon_footprint: body.carbon_footprint,
            created_at: now,
            updated_at: now,
        };
        self.docs.insert(doc.id, doc.clone());
        doc
    }

    pub fn get(&self, id: Uuid) -> Option<PassportDocument> {
        self.docs.get(&id).map(|d| d.clone())
    }

    /// Replace the document body, bumping `updated_at`.
    pub fn update(&self, id: Uuid, body: PassportBody) -> Option<PassportDocument> {
        let mut entry = self.docs.get_mut(&id)?;
        entry.general_information = body.general_information;
        entry.material_composition = body.material_composition;
        entry.carbon_footprint = body.carbon_footprint;
        entry.updated_at = Utc::now();
        Some(entry.clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<PassportDocument> {
        self.docs.remove(&id).map(|(_, doc)| doc)
    }
}
