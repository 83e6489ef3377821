//! The three user-facing workflows: batch embedding, semantic search and
//! raw-vector search. Collaborators are passed in explicitly so tests can
//! substitute in-memory providers and backends.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use tracing::{debug, info};

use crate::corpus;
use crate::document::Document;
use crate::embedder::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::knn::{self, DEFAULT_TOP_K};
use crate::reducer::{self, ExcludedFields};
use crate::search::{self, SearchBackend, SearchHit, SearchRequest};

/// Field embeddings are stored under and searched against.
pub const DEFAULT_VECTOR_FIELD: &str = "film_vector";
/// Field displayed for each hit.
pub const DEFAULT_NAME_FIELD: &str = "name";

/// Knobs for [`batch_embed`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Identifier field, never embedded.
    pub id_field: String,
    /// Field the vector is written to, never embedded.
    pub vector_field: String,
    /// Documents per provider call.
    pub batch_size: usize,
    /// Concurrent provider calls.
    pub worker_threads: usize,
    /// Keep vectors already present with the right dimensionality.
    pub reuse_existing: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            id_field: search::ID_FIELD.to_string(),
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            batch_size: 1,
            worker_threads: 1,
            reuse_existing: false,
        }
    }
}

/// Counts reported after a successful batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents sent to the provider.
    pub embedded: usize,
    /// Documents whose existing vector was kept.
    pub reused: usize,
}

/// Attaches an embedding to every document in `corpus`. Any failure aborts
/// the whole run and no documents are returned.
pub fn batch_embed(
    mut corpus: Vec<Document>,
    gateway: &EmbeddingGateway,
    options: &BatchOptions,
) -> Result<(Vec<Document>, BatchReport)> {
    let excluded = ExcludedFields::new(&options.id_field, &options.vector_field);
    let mut report = BatchReport::default();
    let mut pending: Vec<(usize, String)> = Vec::with_capacity(corpus.len());
    for (index, document) in corpus.iter().enumerate() {
        if options.reuse_existing
            && document
                .vector(&options.vector_field)
                .is_some_and(|vector| vector.len() == gateway.dimensions())
        {
            report.reused += 1;
            continue;
        }
        let text = reducer::reduce(document, &excluded);
        if text.trim().is_empty() {
            let label = document
                .id(&options.id_field)
                .unwrap_or_else(|| format!("#{index}"));
            return Err(Error::InvalidQuery(format!(
                "document {label} has no fields left to embed"
            )));
        }
        pending.push((index, text));
    }

    let batch_size = options.batch_size.max(1);
    let batches: Vec<&[(usize, String)]> = pending.chunks(batch_size).collect();
    info!(
        documents = pending.len(),
        batches = batches.len(),
        reused = report.reused,
        workers = options.worker_threads.max(1),
        "embedding corpus"
    );
    let vectors = if options.worker_threads <= 1 || batches.len() <= 1 {
        embed_sequential(&batches, gateway)?
    } else {
        embed_parallel(&batches, gateway, options.worker_threads)?
    };

    for ((index, _), vector) in pending.iter().zip(vectors) {
        corpus[*index].set_vector(&options.vector_field, vector);
    }
    report.embedded = pending.len();
    Ok((corpus, report))
}

fn embed_batch(gateway: &EmbeddingGateway, batch: &[(usize, String)]) -> Result<Vec<Vec<f32>>> {
    let inputs: Vec<&str> = batch.iter().map(|(_, text)| text.as_str()).collect();
    gateway.embed_batch(&inputs)
}

fn embed_sequential(
    batches: &[&[(usize, String)]],
    gateway: &EmbeddingGateway,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::new();
    for (batch_id, batch) in batches.iter().enumerate() {
        vectors.extend(embed_batch(gateway, batch)?);
        debug!(batch_id, embedded = vectors.len(), "batch complete");
    }
    Ok(vectors)
}

// Fan out over a bounded task queue, fan back in by batch id so output order
// never depends on which worker finished first.
fn embed_parallel(
    batches: &[&[(usize, String)]],
    gateway: &EmbeddingGateway,
    worker_threads: usize,
) -> Result<Vec<Vec<f32>>> {
    let (task_tx, task_rx) = bounded::<usize>(worker_threads * 2);
    let (result_tx, result_rx) = unbounded::<(usize, Result<Vec<Vec<f32>>>)>();
    let aborted = AtomicBool::new(false);
    let mut slots: Vec<Option<Vec<Vec<f32>>>> = vec![None; batches.len()];
    let mut first_error: Option<Error> = None;

    thread::scope(|scope| {
        for worker_id in 0..worker_threads {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let aborted = &aborted;
            scope.spawn(move || {
                for batch_id in task_rx.iter() {
                    if aborted.load(Ordering::SeqCst) {
                        break;
                    }
                    debug!(worker_id, batch_id, "worker embedding batch");
                    let result = embed_batch(gateway, batches[batch_id]);
                    if result_tx.send((batch_id, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(task_rx);
        drop(result_tx);

        let aborted = &aborted;
        scope.spawn(move || {
            for batch_id in 0..batches.len() {
                if aborted.load(Ordering::SeqCst) || task_tx.send(batch_id).is_err() {
                    break;
                }
            }
        });

        for (batch_id, result) in result_rx.iter() {
            match result {
                Ok(vectors) => slots[batch_id] = Some(vectors),
                Err(err) => {
                    aborted.store(true, Ordering::SeqCst);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
    });

    if let Some(err) = first_error {
        return Err(err);
    }
    let mut vectors = Vec::new();
    for (batch_id, slot) in slots.into_iter().enumerate() {
        let batch = slot.ok_or_else(|| {
            Error::Provider(format!("embedding batch {batch_id} produced no result"))
        })?;
        vectors.extend(batch);
    }
    Ok(vectors)
}

/// Loads the corpus at `input`, embeds it and writes the full snapshot to
/// `output`. Nothing is written unless every document succeeds.
pub fn batch_embed_file(
    input: &Path,
    output: &Path,
    gateway: &EmbeddingGateway,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let documents = corpus::load(input)?;
    info!(documents = documents.len(), path = %input.display(), "loaded corpus");
    let (documents, report) = batch_embed(documents, gateway, options)?;
    corpus::save(output, &documents)?;
    info!(path = %output.display(), embedded = report.embedded, "wrote snapshot");
    Ok(report)
}

/// Knobs shared by both search workflows.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Vector field the KNN clause targets.
    pub vector_field: String,
    /// Neighbor count inside the KNN clause.
    pub top_k: usize,
    /// Row limit for the response.
    pub rows: usize,
    /// Fields returned per hit.
    pub fields: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            top_k: DEFAULT_TOP_K,
            rows: DEFAULT_TOP_K,
            fields: vec![
                search::ID_FIELD.to_string(),
                DEFAULT_NAME_FIELD.to_string(),
                search::SCORE_FIELD.to_string(),
            ],
        }
    }
}

/// Embeds `query` and runs it as a KNN search.
pub fn semantic_search(
    query: &str,
    gateway: &EmbeddingGateway,
    backend: &dyn SearchBackend,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>> {
    let vector = gateway.embed(query)?;
    vector_search(&vector, gateway.dimensions(), backend, options)
}

/// Runs a caller-supplied vector as a KNN search. Dimension problems are
/// reported before the backend is contacted.
pub fn vector_search(
    vector: &[f32],
    dimensions: usize,
    backend: &dyn SearchBackend,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>> {
    let query = knn::encode_knn(vector, &options.vector_field, options.top_k, dimensions)?;
    let request = SearchRequest::new(query, options.rows, options.fields.iter().cloned())?;
    let hits = search::run_search(backend, &request)?;
    debug!(hits = hits.len(), "search complete");
    Ok(hits)
}

/// `- <name> : <score>` line used by the semantic search CLI.
pub fn render_scored(hit: &SearchHit, name_field: &str) -> String {
    let name = hit.text(name_field).unwrap_or_default();
    match hit.score {
        Some(score) => format!("- {name} : {score}"),
        None => format!("- {name} : (no score)"),
    }
}

/// `- ID: <id>, Name: <name>` line used by the raw vector CLI.
pub fn render_identified(hit: &SearchHit, name_field: &str) -> String {
    let name = hit.text(name_field).unwrap_or_default();
    format!("- ID: {}, Name: {name}", hit.id)
}
