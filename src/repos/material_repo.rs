use crate::blob::{BlobKind, BlobStore, Upload};
use crate::db::{Collection, DocumentStore, FieldOp, Order, Query};
use crate::error::Result;
use crate::models::{NewStudyMaterial, StudyMaterial};
use crate::repos::insert_after_upload;
use crate::session::Session;

pub struct MaterialRepository {
    store: DocumentStore,
    blobs: BlobStore,
    page_size: i64,
}

impl MaterialRepository {
    pub fn new(store: DocumentStore, blobs: BlobStore, page_size: i64) -> Self {
        Self {
            store,
            blobs,
            page_size,
        }
    }

    /// Stores the file under `study-materials/` and records its metadata.
    pub async fn upload(
        &self,
        session: &Session,
        new: NewStudyMaterial,
        file: &Upload,
    ) -> Result<StudyMaterial> {
        let blob = self.blobs.upload_file(BlobKind::StudyMaterial, file).await?;
        let material = StudyMaterial::new(
            new,
            blob.url.as_str(),
            file.filename.as_str(),
            file.file_type(),
            session.uid(),
            session.display_name(),
        );

        insert_after_upload(
            &self.store,
            Collection::StudyMaterials,
            &material.id,
            &material,
            Some(&blob),
        )
        .await?;
        tracing::info!("Uploaded study material {} ({})", material.id, material.file_name);
        Ok(material)
    }

    pub async fn get(&self, id: &str) -> Result<Option<StudyMaterial>> {
        self.store.get(Collection::StudyMaterials, id).await
    }

    pub async fn list(&self, subject: Option<&str>) -> Result<Vec<StudyMaterial>> {
        self.store
            .query(
                &Query::new(Collection::StudyMaterials)
                    .where_eq_ignore_case_opt("subject", subject)
                    .order_by(Order::NewestFirst)
                    .limit(self.page_size),
            )
            .await
    }

    /// Bumps the download counter and returns the file URL.
    pub async fn record_download(&self, id: &str) -> Result<String> {
        let material: StudyMaterial = self.store.fetch(Collection::StudyMaterials, id).await?;
        self.store
            .update(
                Collection::StudyMaterials,
                id,
                vec![FieldOp::increment("downloads", 1)],
            )
            .await?;
        Ok(material.file_url)
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        let material: StudyMaterial = self.store.fetch(Collection::StudyMaterials, id).await?;
        session.require_owner(&material.uploader_id, "delete this material")?;
        self.store.delete(Collection::StudyMaterials, id).await
    }
}
