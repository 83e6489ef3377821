use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use solrvec::config::{init_tracing, EmbeddingArgs, SolrArgs};
use solrvec::pipeline::render_scored;
use solrvec::prompt::{ask, count_or_default};
use solrvec::{semantic_search, DEFAULT_TOP_K};

#[derive(Parser, Debug)]
#[command(
    name = "solrvec-search",
    about = "Embed a natural-language query and run it as a Solr KNN search"
)]
struct SearchCli {
    /// Query text (prompted for when omitted)
    #[arg(long)]
    query: Option<String>,

    /// Nearest neighbors to retrieve; non-numeric values fall back to 10
    #[arg(long)]
    top_k: Option<String>,

    /// Rows to print; non-numeric values fall back to 10
    #[arg(long)]
    rows: Option<String>,

    #[command(flatten)]
    embedding: EmbeddingArgs,

    #[command(flatten)]
    solr: SolrArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = SearchCli::parse();
    let gateway = cli.embedding.build_gateway()?;
    let backend = cli.solr.build_backend()?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    let query = match &cli.query {
        Some(query) => query.clone(),
        None => ask(&mut input, &mut stdout, "Enter your search query: ")
            .context("failed to read query")?,
    };
    let top_k = read_count(&cli.top_k, &mut input, &mut stdout, "Enter top_k (default 10): ")?;
    let rows = read_count(&cli.rows, &mut input, &mut stdout, "Enter rows (default 10): ")?;

    println!("Performing semantic search for: {query}");
    let options = cli.solr.search_options(top_k, rows);
    let hits = semantic_search(&query, &gateway, &backend, &options)
        .map_err(|err| anyhow!("{} stage failed during semantic search: {err}", err.stage()))?;

    println!("\nFound {} results:", hits.len());
    for hit in &hits {
        println!("{}", render_scored(hit, &cli.solr.name_field));
    }
    Ok(())
}

fn read_count<R: BufRead, W: Write>(
    flag: &Option<String>,
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<usize> {
    let raw = match flag {
        Some(value) => value.clone(),
        None => ask(input, output, prompt).context("failed to read count")?,
    };
    Ok(count_or_default(&raw, DEFAULT_TOP_K))
}
