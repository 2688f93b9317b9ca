use crate::error::{Error, Result};
use crate::runtime::InputSplit;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Written once every partition of a job has committed.
pub const SUCCESS_MARKER: &str = "_SUCCESS";
/// Run metadata stored next to the TF-IDF output.
pub const META_FILE: &str = "_meta.json";

const META_VERSION: u32 = 1;

/// Output area of each pipeline stage, relative to the output base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DocWordCount,
    TermFrequency,
    TfIdf,
    Search,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::DocWordCount => "docwordcount",
            Stage::TermFrequency => "tf",
            Stage::TfIdf => "tfidf",
            Stage::Search => "search",
        }
    }
}

pub struct StagePaths {
    pub root: PathBuf,
}

impl StagePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn stage(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.name())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub corpus_size: u64,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn new(corpus_size: u64) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into());
        Self { corpus_size, created_at, version: META_VERSION }
    }
}

fn is_hidden(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('_') || name.starts_with('.')
}

/// Expand input locations into one split per file.
///
/// Directories contribute their direct, non-hidden regular files in name order, so
/// markers such as `_SUCCESS` never reach a mapper.
pub fn resolve_input(paths: &[PathBuf]) -> Result<Vec<InputSplit>> {
    let mut splits = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(Error::InputNotFound(path.clone()));
        }
        if path.is_file() {
            splits.push(InputSplit::new(path));
            continue;
        }
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if is_hidden(entry.file_name()) || !entry.path().is_file() {
                continue;
            }
            splits.push(InputSplit::new(entry.path()));
        }
    }
    Ok(splits)
}

/// Read a file as lines. Invalid UTF-8 is replaced rather than failing the task.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect())
}

pub fn prepare_output(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Err(Error::OutputExists(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

pub fn part_file_name(partition: usize) -> String {
    format!("part-r-{partition:05}")
}

pub fn write_part<I>(dir: &Path, partition: usize, lines: I) -> Result<PathBuf>
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let file = dir.join(part_file_name(partition));
    let mut w = BufWriter::new(File::create(&file)?);
    for line in lines {
        writeln!(w, "{line}")?;
    }
    w.flush()?;
    Ok(file)
}

pub fn mark_success(dir: &Path) -> Result<()> {
    File::create(dir.join(SUCCESS_MARKER))?;
    Ok(())
}

pub fn is_committed(dir: &Path) -> bool {
    dir.join(SUCCESS_MARKER).is_file()
}

/// Remove whatever a failed job left behind.
pub fn abort_output(dir: &Path) {
    if let Err(err) = fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), %err, "failed to clean up aborted output");
    }
}

/// All record lines of a finished stage, partition by partition.
pub fn read_stage_output(dir: &Path) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for split in resolve_input(&[dir.to_path_buf()])? {
        lines.extend(read_lines(&split.path)?);
    }
    Ok(lines)
}

pub fn save_meta(dir: &Path, meta: &MetaFile) -> Result<()> {
    let mut f = File::create(dir.join(META_FILE))?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(dir: &Path) -> Result<MetaFile> {
    let buf = fs::read_to_string(dir.join(META_FILE))?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
