use crate::error::{Error, Result};
use crate::persist::{self, MetaFile, Stage, StagePaths};
use crate::record::SearchResult;
use crate::runtime::{InputSplit, Job, JobReport, Mapper, Reducer};
use crate::search::{self, QuerySet, SearchMapper, SearchReducer};
use crate::term_frequency::{DocWordCountReducer, TermFrequencyReducer};
use crate::tfidf::{CorpusSize, TermEntryMapper, TfIdfReducer};
use crate::tokenizer::TokenCountMapper;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Corpus files or directories; for search, TF-IDF output locations.
    pub input: Vec<PathBuf>,
    /// Base directory; each stage writes to `<output>/<stage>`.
    pub output: PathBuf,
    pub reducers: usize,
}

impl PipelineConfig {
    pub fn new(input: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self { input, output: output.into(), reducers: 1 }
    }

    pub fn with_reducers(mut self, reducers: usize) -> Self {
        self.reducers = reducers.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexReport {
    pub corpus_size: CorpusSize,
    pub term_frequency: JobReport,
    pub tfidf: JobReport,
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub job: JobReport,
    /// Display order only; the stored output stays sorted by document.
    pub ranked: Vec<SearchResult>,
}

/// Sequences stage jobs. A failed stage stops the run before anything downstream starts.
pub struct Pipeline {
    config: PipelineConfig,
    paths: StagePaths,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let paths = StagePaths::new(&config.output);
        Self { config, paths }
    }

    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.paths.stage(stage)
    }

    /// Raw occurrence count of every word in every document.
    pub fn word_count(&self) -> Result<JobReport> {
        let splits = persist::resolve_input(&self.config.input)?;
        self.run_stage(Stage::DocWordCount, TokenCountMapper, DocWordCountReducer, &splits)
    }

    /// Term frequency, then TF-IDF over the term-frequency output.
    pub fn index(&self) -> Result<IndexReport> {
        let splits = persist::resolve_input(&self.config.input)?;
        let corpus_size = CorpusSize::of_splits(&splits);
        tracing::info!(corpus_size = corpus_size.get(), "resolved corpus");

        let term_frequency = self.run_stage(Stage::TermFrequency, TokenCountMapper, TermFrequencyReducer, &splits)?;

        let tf_splits = persist::resolve_input(&[self.stage_dir(Stage::TermFrequency)])
            .map_err(|source| stage_failed(Stage::TfIdf, source))?;
        let reducer = TfIdfReducer::new(corpus_size).map_err(|source| stage_failed(Stage::TfIdf, source))?;
        let tfidf = self.run_stage(Stage::TfIdf, TermEntryMapper, reducer, &tf_splits)?;

        write_index_meta(&self.stage_dir(Stage::TfIdf), corpus_size)?;
        Ok(IndexReport { corpus_size, term_frequency, tfidf })
    }

    /// Sum TF-IDF scores of the query words per document.
    pub fn search(&self, queries: &QuerySet) -> Result<SearchReport> {
        let splits = persist::resolve_input(&self.config.input)?;
        for input in &self.config.input {
            if let Some(meta) = read_index_meta(input) {
                tracing::info!(
                    index = %input.display(),
                    corpus_size = meta.corpus_size,
                    created_at = %meta.created_at,
                    "searching index"
                );
            }
        }
        tracing::debug!(queries = ?queries.words(), "query set");

        let job = self.run_stage(Stage::Search, SearchMapper::new(queries.clone()), SearchReducer, &splits)?;

        let ranked = persist::read_stage_output(&self.stage_dir(Stage::Search))?
            .iter()
            .map(|line| SearchResult::decode(line))
            .collect::<Result<Vec<_>>>()?;
        Ok(SearchReport { job, ranked: search::rank(ranked) })
    }

    fn run_stage<M, R>(&self, stage: Stage, mapper: M, reducer: R, splits: &[InputSplit]) -> Result<JobReport>
    where
        M: Mapper,
        R: Reducer<Key = M::Key, Value = M::Value>,
    {
        tracing::info!(stage = stage.name(), splits = splits.len(), reducers = self.config.reducers, "starting stage");
        Job::new(stage.name(), mapper, reducer, splits, self.stage_dir(stage))
            .reducers(self.config.reducers)
            .run()
            .map_err(|source| stage_failed(stage, source))
    }
}

fn write_index_meta(dir: &Path, corpus_size: CorpusSize) -> Result<()> {
    persist::save_meta(dir, &MetaFile::new(corpus_size.get())).map_err(|source| stage_failed(Stage::TfIdf, source))
}

/// Metadata is informational; a missing file is normal for handwritten indexes.
fn read_index_meta(dir: &Path) -> Option<MetaFile> {
    match persist::load_meta(dir) {
        Ok(meta) => Some(meta),
        Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(index = %dir.display(), %err, "unreadable index metadata");
            None
        }
    }
}

fn stage_failed(stage: Stage, source: Error) -> Error {
    Error::StageFailed { stage: stage.name(), source: Box::new(source) }
}
