use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tfidf_core::{Pipeline, PipelineConfig, QuerySet, Stage};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Word counts, TF-IDF index and keyword search over a corpus of text files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StageArgs {
    /// Input files or directories, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    input: Vec<PathBuf>,
    /// Output base directory; each stage writes to a subdirectory named after it
    #[arg(long)]
    output: PathBuf,
    /// Number of reduce partitions
    #[arg(long, env = "TFIDF_REDUCERS", default_value_t = 1)]
    reducers: usize,
}

impl StageArgs {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig::new(self.input, self.output).with_reducers(self.reducers)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Count every word in every document
    #[command(name = "docwordcount")]
    DocWordCount {
        #[command(flatten)]
        args: StageArgs,
    },
    /// Compute term frequencies, then TF-IDF scores
    #[command(name = "tfidf")]
    TfIdf {
        #[command(flatten)]
        args: StageArgs,
    },
    /// Sum the TF-IDF scores of the query words per document
    Search {
        #[command(flatten)]
        args: StageArgs,
        /// How many ranked results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Query words
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::DocWordCount { args } => {
            let pipeline = Pipeline::new(args.into_config());
            let report = pipeline.word_count()?;
            tracing::info!(
                output = %pipeline.stage_dir(Stage::DocWordCount).display(),
                records = report.reduce_output_records,
                "word count complete"
            );
        }
        Commands::TfIdf { args } => {
            let pipeline = Pipeline::new(args.into_config());
            let report = pipeline.index()?;
            tracing::info!(
                output = %pipeline.stage_dir(Stage::TfIdf).display(),
                corpus_size = report.corpus_size.get(),
                terms = report.tfidf.reduce_input_groups,
                "index build complete"
            );
        }
        Commands::Search { args, top, query } => {
            let queries = QuerySet::parse(&query)?;
            let pipeline = Pipeline::new(args.into_config());
            let report = pipeline.search(&queries)?;
            tracing::info!(
                output = %pipeline.stage_dir(Stage::Search).display(),
                hits = report.ranked.len(),
                "search complete"
            );
            for result in report.ranked.iter().take(top) {
                println!("{result}");
            }
        }
    }
    Ok(())
}
