use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

use crate::error::EdgeError;
use crate::external_sort::{
    sort_and_deduplicate, EdgeDedupProcessor, ExternalSortConfig, PartitionStrategy,
};

fn config(root: &Path, partitions: usize) -> ExternalSortConfig {
    ExternalSortConfig {
        partitions,
        temp_directory: root.join("chunks"),
        ..Default::default()
    }
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn test_config_validation() {
    let mut config = ExternalSortConfig::default();
    assert!(config.validate().is_ok());

    config.memory_usage_percent = 5.0;
    assert!(config.validate().is_err());

    config.memory_usage_percent = 95.0;
    assert!(config.validate().is_err());

    config.memory_usage_percent = 50.0;
    config.partitions = 0;
    assert!(config.validate().is_err());

    config.partitions = 10_000;
    assert!(config.validate().is_err());

    config.partitions = 4;
    config.chunk_header = "a\nb".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_chunk_path_naming() {
    let config = ExternalSortConfig {
        temp_directory: "/tmp/x".into(),
        ..Default::default()
    };
    assert_eq!(config.chunk_path(3), Path::new("/tmp/x/chunk_0003.tab"));
}

#[test]
fn test_config_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sort.json");
    let mut config = config(dir.path(), 7);
    config.strategy = PartitionStrategy::LineCount;
    config.to_file(&path).unwrap();

    let loaded = ExternalSortConfig::from_file(&path).unwrap();
    assert_eq!(loaded.partitions, 7);
    assert_eq!(loaded.strategy, PartitionStrategy::LineCount);
    assert!(fs::read_to_string(&path).unwrap().contains("\"line_count\""));
}

#[test]
fn test_co_payment_projection_dedups_across_chunks() {
    // co1 pays d1, d2, d3; projected pairs straddle the two chunks
    let dir = tempdir().unwrap();
    let input = dir.path().join("dd.tab");
    let output = dir.path().join("dd_dedup.tab");
    fs::write(&input, "# doctorId\tdoctorId\n1\t2\n1\t3\n2\t3\n").unwrap();

    let processor = EdgeDedupProcessor::new(config(dir.path(), 2)).unwrap();
    let stats = processor.process(&input, &output).unwrap();

    assert_eq!(data_lines(&output), vec!["1\t2", "1\t3", "2\t3"]);
    assert_eq!(stats.chunks_created, 2);
    assert_eq!(stats.unique_records, 3);
    assert_eq!(stats.duplicates_removed, 0);
    assert!(!dir.path().join("chunks").join("chunk_0001.tab").exists());
}

#[test]
fn test_same_edge_in_both_chunks_appears_once() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");
    fs::write(&input, "# h\n1 2\n5 6\n2 1\n1 2\n").unwrap();

    let mut cfg = config(dir.path(), 2);
    cfg.strategy = PartitionStrategy::LineCount;
    let stats = EdgeDedupProcessor::new(cfg).unwrap().process(&input, &output).unwrap();

    assert_eq!(data_lines(&output), vec!["1\t2", "5\t6"]);
    assert_eq!(stats.records_partitioned, 3);
    assert_eq!(stats.unique_records, 2);
    assert_eq!(stats.duplicates_removed, 1);
}

#[test]
fn test_partition_mismatch_aborts_before_merge() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");
    fs::write(&input, "# doctorId\tdoctorId\n1\t2\n1\t3\n2\t3\n").unwrap();

    let result = EdgeDedupProcessor::new(config(dir.path(), 5)).unwrap().process(&input, &output);

    assert!(matches!(
        result,
        Err(EdgeError::PartitionCountMismatch { requested: 5, produced: 3 })
    ));
    assert!(!output.exists());
    assert!(!dir.path().join("chunks").join("chunk_0001.tab").exists());
}

#[test]
fn test_keep_chunks_allows_remerge() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");
    let remerged = dir.path().join("again.tab");
    fs::write(&input, "# h\n3 1\n4 2\n1 3\n9 8\n").unwrap();

    let mut cfg = config(dir.path(), 2);
    cfg.keep_chunks = true;
    cfg.strategy = PartitionStrategy::LineCount;
    let processor = EdgeDedupProcessor::new(cfg.clone()).unwrap();
    processor.process(&input, &output).unwrap();

    let chunks = vec![cfg.chunk_path(1), cfg.chunk_path(2)];
    assert!(chunks.iter().all(|c| c.exists()));

    let stats = processor.merge_existing(&chunks, &remerged).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), fs::read_to_string(&remerged).unwrap());
    assert_eq!(stats.unique_records, 3);
}

#[test]
fn test_merging_final_output_is_idempotent() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");
    let again = dir.path().join("again.tab");
    fs::write(&input, "# h\n10 2\n2 10\n7 3\n3 4\n").unwrap();

    let processor = EdgeDedupProcessor::new(config(dir.path(), 1)).unwrap();
    processor.process(&input, &output).unwrap();
    processor.merge_existing(&[output.clone()], &again).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), fs::read_to_string(&again).unwrap());
}

#[test]
fn test_merge_existing_rejects_empty_chunk() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.tab");
    let empty = dir.path().join("empty.tab");
    fs::write(&good, "# nodeId\tnodeId\n1\t2\n").unwrap();
    fs::write(&empty, "# nodeId\tnodeId\n").unwrap();

    let processor = EdgeDedupProcessor::new(config(dir.path(), 2)).unwrap();
    let result = processor.merge_existing(&[good, empty.clone()], &dir.path().join("out.tab"));

    match result {
        Err(EdgeError::DegenerateChunk { chunk }) => assert_eq!(chunk, empty),
        other => panic!("expected DegenerateChunk, got {:?}", other),
    }
}

#[test]
fn test_shutdown_before_merge_produces_no_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");
    fs::write(&input, "# h\n1 2\n").unwrap();

    let processor = EdgeDedupProcessor::new(config(dir.path(), 1))
        .unwrap()
        .with_shutdown_signal(Arc::new(AtomicBool::new(true)));

    assert!(matches!(processor.process(&input, &output), Err(EdgeError::Interrupted)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_sort_and_deduplicate_async() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let output = dir.path().join("out.tab");

    let mut content = String::from("# doctorId\tdoctorId\n");
    for i in 0..200 {
        content.push_str(&format!("{} {}\n", i % 17, 100 + i % 23));
    }
    fs::write(&input, content).unwrap();

    let stats = sort_and_deduplicate(&input, &output, config(dir.path(), 4))
        .await
        .unwrap();

    let lines = data_lines(&output);
    assert_eq!(lines.len(), stats.unique_records);
    // 17 and 23 are coprime so all 200 pairs are distinct
    assert_eq!(stats.unique_records, 200);
    assert_eq!(fs::read_to_string(&output).unwrap().lines().next(), Some("# nodeId\tnodeId"));
}

#[test]
fn test_repeated_runs_produce_identical_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("edges.tab");
    let mut content = String::from("# doctorId\tdoctorId\n");
    for i in 0..400u32 {
        content.push_str(&format!("{}\t{}\n", i % 37, (i * 7) % 41 + 100));
    }
    fs::write(&input, content).unwrap();

    let mut cfg = config(dir.path(), 4);
    cfg.strategy = PartitionStrategy::LineCount;
    let processor = EdgeDedupProcessor::new(cfg).unwrap();

    let first = dir.path().join("first.tab");
    let second = dir.path().join("second.tab");
    let first_stats = processor.process(&input, &first).unwrap();
    let second_stats = processor.process(&input, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    assert_eq!(first_stats.unique_records, second_stats.unique_records);
    assert_eq!(first_stats.chunks_created, 4);
}
