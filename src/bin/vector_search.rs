use std::io;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use solrvec::config::{init_tracing, SolrArgs};
use solrvec::pipeline::render_identified;
use solrvec::prompt::{count_or_default, read_block};
use solrvec::{vector, vector_search, DEFAULT_DIMENSIONS, DEFAULT_TOP_K};

#[derive(Parser, Debug)]
#[command(
    name = "solrvec-vector-search",
    about = "Run a raw embedding vector as a Solr KNN search"
)]
struct VectorCli {
    /// Vector literal such as `[0.3, 0.5, ...]` (read from stdin when omitted)
    #[arg(long)]
    vector: Option<String>,

    /// Dimensionality the vector must have
    #[arg(long, env = "SOLRVEC_OPENAI_DIMENSIONS", default_value_t = DEFAULT_DIMENSIONS)]
    dimensions: usize,

    /// Nearest neighbors to retrieve; non-numeric values fall back to 10
    #[arg(long)]
    top_k: Option<String>,

    /// Rows to return; non-numeric values fall back to 10
    #[arg(long)]
    rows: Option<String>,

    #[command(flatten)]
    solr: SolrArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = VectorCli::parse();
    if cli.dimensions == 0 {
        return Err(anyhow!(
            "configuration stage failed: --dimensions must be positive"
        ));
    }
    let backend = cli.solr.build_backend()?;

    let literal = match &cli.vector {
        Some(literal) => literal.clone(),
        None => {
            println!(
                "Enter a {}-dimensional vector in JSON list format (e.g., [0.3, 0.5, ...]).",
                cli.dimensions
            );
            println!("Paste your vector (press Enter twice when done):");
            read_block(&mut io::stdin().lock()).context("failed to read vector")?
        }
    };
    let query_vector = vector::parse_literal(&literal, cli.dimensions).map_err(|err| {
        anyhow!(
            "{} stage failed: vector rejected before search: {err}",
            err.stage()
        )
    })?;

    println!("Performing vector search...");
    let options = cli
        .solr
        .search_options(count_flag(&cli.top_k), count_flag(&cli.rows));
    let hits = vector_search(&query_vector, cli.dimensions, &backend, &options)
        .map_err(|err| anyhow!("{} stage failed during vector search: {err}", err.stage()))?;

    println!("\nTop results from Solr:");
    for hit in &hits {
        println!("{}", render_identified(hit, &cli.solr.name_field));
    }
    Ok(())
}

fn count_flag(flag: &Option<String>) -> usize {
    flag.as_deref()
        .map_or(DEFAULT_TOP_K, |raw| count_or_default(raw, DEFAULT_TOP_K))
}
