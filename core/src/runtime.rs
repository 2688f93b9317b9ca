//! Local grouped-aggregation runtime.
//!
//! Runs one map task per input split in parallel, shuffles every emitted record into
//! hash partitions grouped by key, then reduces each partition in parallel and commits
//! it as a `part-r-NNNNN` file. A reducer only ever sees a key's complete value list:
//! the reduce phase does not start until every map task has returned.

use crate::error::Result;
use crate::persist;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// One input file handed to a map task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSplit {
    pub path: PathBuf,
    /// File name without its directory.
    pub document_id: String,
}

impl InputSplit {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let document_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, document_id }
    }
}

/// Private output buffer of a single map task.
pub struct Emitter<K, V> {
    records: Vec<(K, V)>,
}

impl<K, V> Emitter<K, V> {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn emit(&mut self, key: K, value: V) {
        self.records.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<(K, V)> {
        self.records
    }
}

impl<K, V> Default for Emitter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Mapper: Sync {
    type Key: Ord + Hash + Send;
    type Value: Send;

    fn map(&self, line: &str, split: &InputSplit, out: &mut Emitter<Self::Key, Self::Value>) -> Result<()>;
}

pub trait Reducer: Sync {
    type Key: Send;
    type Value: Send;
    /// Rendered as exactly one output line.
    type Output: Display;

    fn reduce(&self, key: Self::Key, values: Vec<Self::Value>, out: &mut Vec<Self::Output>) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub map_tasks: usize,
    pub map_input_records: u64,
    pub map_output_records: u64,
    pub reduce_input_groups: u64,
    pub reduce_output_records: u64,
}

pub struct Job<'a, M, R> {
    name: &'static str,
    mapper: M,
    reducer: R,
    splits: &'a [InputSplit],
    output: PathBuf,
    reducers: usize,
}

struct MapTaskOutput<K, V> {
    input_records: u64,
    records: Vec<(K, V)>,
}

impl<'a, M, R> Job<'a, M, R>
where
    M: Mapper,
    R: Reducer<Key = M::Key, Value = M::Value>,
{
    pub fn new(name: &'static str, mapper: M, reducer: R, splits: &'a [InputSplit], output: impl Into<PathBuf>) -> Self {
        Self { name, mapper, reducer, splits, output: output.into(), reducers: 1 }
    }

    pub fn reducers(mut self, reducers: usize) -> Self {
        self.reducers = reducers.max(1);
        self
    }

    /// Run to completion. On failure the output directory is removed, so a stage
    /// either commits with `_SUCCESS` or leaves nothing behind.
    pub fn run(self) -> Result<JobReport> {
        persist::prepare_output(&self.output)?;
        let outcome = self.execute().and_then(|report| {
            persist::mark_success(&self.output)?;
            Ok(report)
        });
        match outcome {
            Ok(report) => {
                tracing::info!(
                    job = self.name,
                    map_tasks = report.map_tasks,
                    map_input_records = report.map_input_records,
                    map_output_records = report.map_output_records,
                    reduce_input_groups = report.reduce_input_groups,
                    reduce_output_records = report.reduce_output_records,
                    "job complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::error!(job = self.name, %err, "job failed");
                persist::abort_output(&self.output);
                Err(err)
            }
        }
    }

    fn execute(&self) -> Result<JobReport> {
        let mapped = self
            .splits
            .par_iter()
            .map(|split| self.map_split(split))
            .collect::<Result<Vec<_>>>()?;

        let mut report = JobReport { map_tasks: mapped.len(), ..JobReport::default() };

        // Shuffle: hash-partition, then sort and group by key within each partition.
        let mut partitions: Vec<BTreeMap<M::Key, Vec<M::Value>>> =
            (0..self.reducers).map(|_| BTreeMap::new()).collect();
        for task in mapped {
            report.map_input_records += task.input_records;
            report.map_output_records += task.records.len() as u64;
            for (key, value) in task.records {
                let partition = partition_for(&key, self.reducers);
                partitions[partition].entry(key).or_default().push(value);
            }
        }
        tracing::debug!(job = self.name, partitions = partitions.len(), "shuffle complete");

        let reduced = partitions
            .into_par_iter()
            .enumerate()
            .map(|(index, groups)| self.reduce_partition(index, groups))
            .collect::<Result<Vec<_>>>()?;
        for (groups, outputs) in reduced {
            report.reduce_input_groups += groups;
            report.reduce_output_records += outputs;
        }
        Ok(report)
    }

    fn map_split(&self, split: &InputSplit) -> Result<MapTaskOutput<M::Key, M::Value>> {
        let lines = persist::read_lines(&split.path)?;
        let mut emitter = Emitter::new();
        for line in &lines {
            self.mapper.map(line, split, &mut emitter)?;
        }
        tracing::trace!(job = self.name, document = %split.document_id, emitted = emitter.len(), "map task done");
        Ok(MapTaskOutput { input_records: lines.len() as u64, records: emitter.into_records() })
    }

    fn reduce_partition(&self, index: usize, groups: BTreeMap<M::Key, Vec<M::Value>>) -> Result<(u64, u64)> {
        let group_count = groups.len() as u64;
        let mut out = Vec::new();
        for (key, values) in groups {
            self.reducer.reduce(key, values, &mut out)?;
        }
        persist::write_part(&self.output, index, &out)?;
        Ok((group_count, out.len() as u64))
    }
}

fn partition_for<K: Hash>(key: &K, partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partitions as u64) as usize
}
