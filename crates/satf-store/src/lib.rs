//! Reconciliation store: idempotent upsert of canonical tenders keyed by ocid.

use async_trait::async_trait;
use satf_core::{CanonicalTender, TenderDocument};
use sqlx::postgres::PgPool;
use sqlx::Row;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const CRATE_NAME: &str = "satf-store";

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence backend failure: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("migration failure: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Capability seam for the sync orchestrator: "can upsert one canonical
/// tender and replace its document set". Production uses [`PgTenderStore`];
/// tests use in-memory fakes.
#[async_trait]
pub trait TenderStore: Send + Sync {
    async fn upsert(
        &self,
        tender: &CanonicalTender,
        documents: &[TenderDocument],
    ) -> Result<Uuid, StoreError>;
}

const UPSERT_TENDER_SQL: &str = r#"
INSERT INTO tenders (
    ocid, title, description, buyer_name, buyer_contact_email,
    buyer_contact_phone, province, industry, value_amount, value_currency,
    submission_method, date_published, date_closing, status, raw_release
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
ON CONFLICT (ocid) DO UPDATE SET
    title = EXCLUDED.title,
    description = EXCLUDED.description,
    buyer_name = EXCLUDED.buyer_name,
    buyer_contact_email = EXCLUDED.buyer_contact_email,
    buyer_contact_phone = EXCLUDED.buyer_contact_phone,
    province = EXCLUDED.province,
    industry = EXCLUDED.industry,
    value_amount = EXCLUDED.value_amount,
    value_currency = EXCLUDED.value_currency,
    submission_method = EXCLUDED.submission_method,
    date_published = EXCLUDED.date_published,
    date_closing = EXCLUDED.date_closing,
    status = EXCLUDED.status,
    raw_release = EXCLUDED.raw_release,
    updated_at = NOW()
RETURNING id
"#;

const DELETE_DOCUMENTS_SQL: &str = "DELETE FROM tender_documents WHERE tender_id = $1";

const INSERT_DOCUMENT_SQL: &str = r#"
INSERT INTO tender_documents (
    tender_id, title, description, url, format, document_type,
    language, date_published, date_modified
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

#[derive(Debug, Clone)]
pub struct PgTenderStore {
    pool: PgPool,
}

impl PgTenderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Pool handle without an eager connection attempt; connections open on
    /// first use. Used by surfaces that must start even when the database is
    /// down.
    pub fn connect_lazy(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TenderStore for PgTenderStore {
    /// Upsert by ocid, then replace the document set, inside one transaction
    /// per record. The conflict resolution is the backend's native
    /// `ON CONFLICT` primitive, so two overlapping runs racing on the same
    /// ocid settle last-writer-wins without a read-then-write window.
    async fn upsert(
        &self,
        tender: &CanonicalTender,
        documents: &[TenderDocument],
    ) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(UPSERT_TENDER_SQL)
            .bind(&tender.ocid)
            .bind(&tender.title)
            .bind(&tender.description)
            .bind(&tender.buyer_name)
            .bind(&tender.buyer_contact_email)
            .bind(&tender.buyer_contact_phone)
            .bind(tender.province.as_str())
            .bind(tender.industry.as_str())
            .bind(tender.value_amount)
            .bind(&tender.value_currency)
            .bind(&tender.submission_method)
            .bind(tender.date_published)
            .bind(tender.date_closing)
            .bind(tender.status.as_str())
            .bind(&tender.raw_release)
            .fetch_one(&mut *tx)
            .await?;
        let tender_id: Uuid = row.try_get("id")?;

        sqlx::query(DELETE_DOCUMENTS_SQL)
            .bind(tender_id)
            .execute(&mut *tx)
            .await?;

        for doc in documents {
            sqlx::query(INSERT_DOCUMENT_SQL)
                .bind(tender_id)
                .bind(&doc.title)
                .bind(&doc.description)
                .bind(&doc.url)
                .bind(&doc.format)
                .bind(&doc.document_type)
                .bind(&doc.language)
                .bind(doc.date_published)
                .bind(doc.date_modified)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(ocid = %tender.ocid, %tender_id, documents = documents.len(), "reconciled tender");
        Ok(tender_id)
    }
}
