use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use tfidf_core::persist::{self, load_meta, read_stage_output};
use tfidf_core::{Error, Pipeline, PipelineConfig, QuerySet, Stage, WeightedEntry, WordCount};

fn corpus(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    for (name, body) in files {
        fs::write(corpus.join(name), body).unwrap();
    }
    (dir, corpus)
}

fn two_files() -> (TempDir, PathBuf) {
    corpus(&[("file1.txt", "the cat sat"), ("file2.txt", "the dog ran")])
}

fn entries(dir: &Path) -> HashMap<String, f64> {
    read_stage_output(dir)
        .unwrap()
        .iter()
        .map(|line| {
            let entry = WeightedEntry::decode(line).unwrap();
            (entry.key.encode(), entry.value)
        })
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn word_count_per_document() {
    let (work, corpus) = corpus(&[("a.txt", "the cat\nThe hat"), ("b.txt", "hat")]);
    let output = work.path().join("out");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![corpus], &output));

    let report = pipeline.word_count().unwrap();
    assert_eq!(report.map_tasks, 2);

    let mut lines = read_stage_output(&output.join("docwordcount")).unwrap();
    lines.sort();
    assert_eq!(
        lines,
        vec!["cat#####a.txt\t1", "hat#####a.txt\t1", "hat#####b.txt\t1", "the#####a.txt\t2"]
    );
    assert_eq!(WordCount::decode(&lines[3]).unwrap().value, 2);
}

#[test]
fn index_two_documents() {
    let (work, corpus) = two_files();
    let output = work.path().join("out");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![corpus], &output));

    let report = pipeline.index().unwrap();
    assert_eq!(report.corpus_size.get(), 2);
    assert_eq!(report.tfidf.reduce_input_groups, 5);

    let tf = entries(&output.join("tf"));
    assert_eq!(tf.len(), 6);
    assert!(tf.values().all(|v| *v == 1.0));

    let tfidf = entries(&output.join("tfidf"));
    assert_eq!(tfidf.len(), 6);
    assert!(close(tfidf["the#####file1.txt"], 2.0_f64.log10()));
    assert!(close(tfidf["the#####file2.txt"], 2.0_f64.log10()));
    assert!(close(tfidf["cat#####file1.txt"], 3.0_f64.log10()));
    assert!(close(tfidf["ran#####file2.txt"], 3.0_f64.log10()));

    assert!(persist::is_committed(&output.join("tf")));
    assert!(persist::is_committed(&output.join("tfidf")));
    assert_eq!(load_meta(&output.join("tfidf")).unwrap().corpus_size, 2);
}

#[test]
fn repeated_word_uses_dampened_tf() {
    let (work, corpus) = corpus(&[("file1.txt", "Hadoop hadoop is yellow"), ("file2.txt", "an elephant is yellow")]);
    let output = work.path().join("out");
    Pipeline::new(PipelineConfig::new(vec![corpus], &output)).index().unwrap();

    let tf = read_stage_output(&output.join("tf")).unwrap();
    assert!(tf.contains(&"hadoop#####file1.txt\t1.3010299956639813".to_string()));

    let tfidf = entries(&output.join("tfidf"));
    assert!(close(tfidf["hadoop#####file1.txt"], (1.0 + 2.0_f64.log10()) * 3.0_f64.log10()));
}

#[test]
fn index_is_stable_across_reducer_counts() {
    let (work, corpus) = corpus(&[
        ("a.txt", "one two three two"),
        ("b.txt", "two three four"),
        ("c.txt", "five, six; one"),
    ]);
    let single = work.path().join("single");
    let many = work.path().join("many");
    Pipeline::new(PipelineConfig::new(vec![corpus.clone()], &single)).index().unwrap();
    Pipeline::new(PipelineConfig::new(vec![corpus], &many).with_reducers(4)).index().unwrap();

    assert_eq!(entries(&single.join("tfidf")), entries(&many.join("tfidf")));
}

#[test]
fn search_sums_matching_scores() {
    let (work, corpus) = two_files();
    let index = work.path().join("index");
    Pipeline::new(PipelineConfig::new(vec![corpus], &index)).index().unwrap();

    let results = work.path().join("results");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![index.join("tfidf")], &results));
    let report = pipeline.search(&QuerySet::parse(["cat dog"]).unwrap()).unwrap();

    assert_eq!(report.ranked.len(), 2);
    for result in &report.ranked {
        assert!(close(result.score, 3.0_f64.log10()));
    }
    assert!(persist::is_committed(&pipeline.stage_dir(Stage::Search)));
}

#[test]
fn search_over_handwritten_index() {
    let (work, index) = corpus(&[("part-r-00000", "cat#####a.txt\t0.5\ndog#####a.txt\t0.3\ncategory#####b.txt\t0.25\n")]);
    let results = work.path().join("results");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![index], &results));

    let report = pipeline.search(&QuerySet::parse(["cat", "dog"]).unwrap()).unwrap();
    let scores: HashMap<_, _> = report.ranked.iter().map(|r| (r.document.as_str(), r.score)).collect();
    assert!(close(scores["a.txt"], 0.8));
    assert!(close(scores["b.txt"], 0.25));
    assert_eq!(report.ranked[0].document, "a.txt");
}

#[test]
fn malformed_index_line_fails_search() {
    let (work, index) = corpus(&[("part-r-00000", "cat#####a.txt\t0.5\ncat-without-tab\n")]);
    let results = work.path().join("results");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![index], &results));

    let err = pipeline.search(&QuerySet::parse(["cat"]).unwrap()).unwrap_err();
    match err {
        Error::StageFailed { stage, source } => {
            assert_eq!(stage, "search");
            assert!(matches!(*source, Error::MalformedRecord { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!results.join("search").exists());
}

#[test]
fn missing_input_aborts() {
    let work = tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::new(vec![work.path().join("missing")], work.path().join("out")));
    assert!(matches!(pipeline.index().unwrap_err(), Error::InputNotFound(_)));
    assert!(!work.path().join("out").exists());
}

#[test]
fn rerun_into_same_output_is_refused() {
    let (work, corpus) = two_files();
    let output = work.path().join("out");
    let pipeline = Pipeline::new(PipelineConfig::new(vec![corpus], &output));
    pipeline.word_count().unwrap();

    match pipeline.word_count().unwrap_err() {
        Error::StageFailed { source, .. } => assert!(matches!(*source, Error::OutputExists(_))),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn comma_separated_inputs_share_one_corpus() {
    let (work, first) = corpus(&[("file1.txt", "the cat sat")]);
    let second = work.path().join("more");
    fs::create_dir(&second).unwrap();
    fs::write(second.join("file2.txt"), "the dog ran").unwrap();

    let output = work.path().join("out");
    let report = Pipeline::new(PipelineConfig::new(vec![first, second], &output)).index().unwrap();
    assert_eq!(report.corpus_size.get(), 2);
    assert!(close(entries(&output.join("tfidf"))["cat#####file1.txt"], 3.0_f64.log10()));
}
