
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::AskError;

const TABLE_NAME: &str = "chunks";

/// Vector index backed by LanceDB. Written once at build time, opened
/// read-only at serve time.
pub struct VectorStore {
    connection: Connection,
}

/// One embedded chunk as stored in the index.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub source: String,
    pub chunk_index: u32,
    pub created_at: String,
}

/// One chunk returned by a similarity search.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Create a fresh index directory, replacing any existing one.
    #[inline]
    pub async fn create(index_dir: &Path) -> Result<Self, AskError> {
        if index_dir.exists() {
            debug!("Replacing existing index at {}", index_dir.display());
            std::fs::remove_dir_all(index_dir).map_err(|e| {
                AskError::Index(format!("Failed to remove previous index: {}", e))
            })?;
        }
        std::fs::create_dir_all(index_dir)
            .map_err(|e| AskError::Index(format!("Failed to create index directory: {}", e)))?;

        Self::connect(index_dir).await
    }

    /// Open an existing index directory for serving.
    #[inline]
    pub async fn open(index_dir: &Path) -> Result<Self, AskError> {
        if !index_dir.is_dir() {
            return Err(AskError::Index(format!(
                "Index directory not found: {}",
                index_dir.display()
            )));
        }

        Self::connect(index_dir).await
    }

    async fn connect(index_dir: &Path) -> Result<Self, AskError> {
        let uri = format!("file://{}", index_dir.display());
        debug!("Connecting to vector index at {}", uri);

        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to open vector index: {}", e)))?;

        Ok(Self { connection })
    }

    /// Insert a batch of chunk records, creating the table with the observed
    /// vector dimension on first insert.
    #[inline]
    pub async fn insert_batch(&mut self, records: &[ChunkRecord]) -> Result<(), AskError> {
        if records.is_empty() {
            debug!("No chunk records to insert");
            return Ok(());
        }

        let vector_dim = records[0].vector.len();
        debug!(
            "Inserting batch of {} records ({} dimensions)",
            records.len(),
            vector_dim
        );

        if !self.table_exists().await? {
            self.connection
                .create_empty_table(TABLE_NAME, create_schema(vector_dim))
                .execute()
                .await
                .map_err(|e| AskError::Index(format!("Failed to create chunks table: {}", e)))?;
        }

        let record_batch = create_record_batch(records, vector_dim)?;

        let table = self.open_table().await?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to insert chunk records: {}", e)))?;

        info!("Stored {} chunk records", records.len());
        Ok(())
    }

    /// Nearest-neighbor search over the stored chunks.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, AskError> {
        debug!("Searching for nearest chunks (limit: {})", limit);

        let table = self.open_table().await?;

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| AskError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to execute search: {}", e)))?;

        let mut chunks = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| AskError::Index(format!("Failed to read search results: {}", e)))?
        {
            chunks.extend(parse_search_batch(&batch)?);
        }

        debug!("Search returned {} chunks", chunks.len());
        Ok(chunks)
    }

    /// Number of chunks stored in the index; zero when the table has not
    /// been created yet.
    #[inline]
    pub async fn count(&self) -> Result<u64, AskError> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| AskError::Index(format!("Failed to count chunks: {}", e)))?;

        Ok(count as u64)
    }

    async fn table_exists(&self) -> Result<bool, AskError> {
        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to list index tables: {}", e)))?;
        Ok(names.iter().any(|name| name == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<lancedb::Table, AskError> {
        self.connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AskError::Index(format!("Failed to open chunks table: {}", e)))
    }
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    records: &[ChunkRecord],
    vector_dim: usize,
) -> Result<RecordBatch, AskError> {
    let len = records.len();

    let mut ids = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut chunk_indices = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);

    for record in records {
        if record.vector.len() != vector_dim {
            return Err(AskError::Index(format!(
                "Inconsistent vector dimensions in batch: {} vs {}",
                record.vector.len(),
                vector_dim
            )));
        }
        ids.push(record.id.as_str());
        contents.push(record.content.as_str());
        sources.push(record.source.as_str());
        chunk_indices.push(record.chunk_index);
        created_ats.push(record.created_at.as_str());
        flat_values.extend_from_slice(&record.vector);
    }

    let values_array = Float32Array::from(flat_values);
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
            .map_err(|e| AskError::Index(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(sources)),
        Arc::new(UInt32Array::from(chunk_indices)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(create_schema(vector_dim), arrays)
        .map_err(|e| AskError::Index(format!("Failed to create record batch: {}", e)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>, AskError> {
    let contents = string_column(batch, "content")?;
    let sources = string_column(batch, "source")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut chunks = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        chunks.push(RetrievedChunk {
            content: contents.value(row).to_string(),
            source: sources.value(row).to_string(),
            similarity_score: 1.0 - distance,
            distance,
        });
    }

    Ok(chunks)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, AskError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AskError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AskError::Index(format!("Invalid {} column type", name)))
}
