//! Error handling tests

use super::{column_names, csv_source, default_merger};
use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::models::{FileStatus, SkipReason, SourceFile};
use crate::processor::{NoProgress, SheetMerger};

#[test]
fn test_missing_key_column_is_skipped() {
    let merger = default_merger();
    let source = csv_source("stock 11-03(1).csv", "품명,수량\n볼트,3\n");

    let result = merger.process_file(&source);

    assert_eq!(
        result.status,
        FileStatus::Skipped {
            reason: SkipReason::NoKeyColumn
        }
    );
    assert!(result.record.is_none());
}

#[test]
fn test_excluded_unit_is_not_parsed() {
    let config = MergeConfig::default().with_excluded_unit("외주");
    let merger = SheetMerger::new(config).unwrap();
    // Not decodable as anything: proves the file is skipped before reading
    let source = SourceFile::new("orders 11-03(외주A).csv", vec![0xFD, 0x80, 0xFD]);

    let result = merger.process_file(&source);

    assert_eq!(
        result.status,
        FileStatus::Skipped {
            reason: SkipReason::Excluded {
                keyword: "외주".to_string()
            }
        }
    );
    assert_eq!(result.encoding, None);
}

#[test]
fn test_undecodable_text_fails() {
    let config = MergeConfig {
        encodings: vec!["utf-8".to_string()],
        ..Default::default()
    };
    let merger = SheetMerger::new(config).unwrap();
    let source = SourceFile::new("bad 1-1(1).csv", vec![0xFD, 0x80]);

    let result = merger.process_file(&source);

    match result.status {
        FileStatus::Failed { error } => assert!(error.contains("bad 1-1(1).csv")),
        other => panic!("Expected Failed status, got {:?}", other),
    }
}

#[test]
fn test_corrupt_workbook_fails() {
    let merger = default_merger();
    let source = SourceFile::new("broken 1-2(1).xlsx", b"not a zip archive".to_vec());

    let result = merger.process_file(&source);

    assert!(result.status.is_failure());
    assert!(result.record.is_none());
}

#[test]
fn test_unsupported_extension_fails() {
    let merger = default_merger();
    let source = csv_source("notes.txt", "수주NO\n1\n");

    let result = merger.process_file(&source);

    assert!(result.status.is_failure());
}

#[test]
fn test_metadata_column_clash_fails() {
    let merger = default_merger();
    let source = csv_source("clash 1-3(1).csv", "수주NO,unit_tag\nA-1,x\n");

    let result = merger.process_file(&source);

    match result.status {
        FileStatus::Failed { error } => assert!(error.contains("unit_tag")),
        other => panic!("Expected Failed status, got {:?}", other),
    }
}

#[test]
fn test_all_failing_batch_yields_header_only_master() {
    let merger = default_merger();
    let sources = vec![
        csv_source("a.txt", "x"),
        csv_source("b 1-1(1).csv", "품명\n볼트\n"),
        SourceFile::new("c.xlsx", b"garbage".to_vec()),
    ];

    let summary = merger.run(&sources, &mut NoProgress).unwrap();

    assert_eq!(summary.master.height(), 0);
    assert_eq!(column_names(&summary.master), vec!["work_date", "unit_tag"]);
    assert_eq!(summary.log.len(), 3);
    assert_eq!(summary.log.failures().count(), 2);

    let stats = summary.stats();
    assert_eq!(stats.files_failed, 2);
    assert_eq!(stats.files_without_key, 1);
    assert_eq!(stats.total_rows, 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = MergeConfig::default().with_header_threshold(0);
    let result = SheetMerger::new(config);

    match result {
        Err(MergeError::Configuration { message }) => assert!(message.contains("threshold")),
        _ => panic!("Expected Configuration error"),
    }
}

#[test]
fn test_record_failure_is_logged() {
    let merger = default_merger();
    let mut ctx = merger.begin(1, &mut NoProgress).unwrap();
    let err = MergeError::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "denied",
    ));

    ctx.record_failure("locked 1-1(1).xlsx", &err, &mut NoProgress);

    assert_eq!(ctx.log().len(), 1);
    assert!(ctx.log().entries()[0].status.is_failure());
    let summary = ctx.finish(&mut NoProgress).unwrap();
    assert_eq!(summary.master.height(), 0);
}
