use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use solrvec::config::{init_tracing, EmbeddingArgs};
use solrvec::pipeline::DEFAULT_VECTOR_FIELD;
use solrvec::{batch_embed_file, BatchOptions};

#[derive(Parser, Debug)]
#[command(
    name = "solrvec-embed",
    about = "Embed every document of a JSON corpus and write a Solr-ready snapshot"
)]
struct EmbedCli {
    /// JSON array of documents to embed
    #[arg(long, env = "SOLRVEC_EMBED_INPUT", default_value = "films.json")]
    input: PathBuf,

    /// Output JSON array with one vector field added per document
    #[arg(
        long,
        env = "SOLRVEC_EMBED_OUTPUT",
        default_value = "films_with_embeddings.json"
    )]
    output: PathBuf,

    /// Identifier field, excluded from embedding text
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Field the embedding is stored under
    #[arg(long, env = "SOLRVEC_VECTOR_FIELD", default_value = DEFAULT_VECTOR_FIELD)]
    vector_field: String,

    /// Documents sent per embedding request
    #[arg(long, env = "SOLRVEC_OPENAI_BATCH", default_value_t = 1)]
    batch_size: usize,

    /// Number of concurrent embedding workers
    #[arg(long, env = "SOLRVEC_OPENAI_THREADS", default_value_t = 1)]
    worker_threads: usize,

    /// Keep vectors already present in the input instead of re-embedding
    #[arg(long, default_value_t = false)]
    reuse_existing: bool,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = EmbedCli::parse();
    let gateway = cli.embedding.build_gateway()?;
    let options = BatchOptions {
        id_field: cli.id_field,
        vector_field: cli.vector_field,
        batch_size: cli.batch_size.max(1),
        worker_threads: cli.worker_threads.max(1),
        reuse_existing: cli.reuse_existing,
    };
    let report = batch_embed_file(&cli.input, &cli.output, &gateway, &options).map_err(|err| {
        anyhow!(
            "{} stage failed while embedding {:?}; no output was written: {err}",
            err.stage(),
            cli.input
        )
    })?;
    println!(
        "Embeddings generated for {} documents ({} reused) and saved to {}",
        report.embedded,
        report.reused,
        cli.output.display()
    );
    Ok(())
}
