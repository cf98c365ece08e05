use serde_json::json;

use super::*;

#[test]
fn parses_namespaced_payload() {
    let payload = json!({
        "dart-analyzer": {
            "scanner": {
                "incremental": false,
                "maxFileSizeKb": 256
            },
            "indexing": {
                "concurrency": 4,
                "excludePaths": ["packages/generated", " /tmp/out "]
            },
            "logging": {
                "level": "debug",
                "file": "/tmp/analyzer.log"
            },
            "threadPool": {
                "workerThreads": 3
            }
        }
    });

    let settings = AnalysisSettings::from_json_payload(Some(&payload));
    assert!(!settings.scanner.incremental);
    assert_eq!(settings.scanner.max_file_size_kb, 256);
    assert_eq!(settings.indexing.concurrency, 4);
    assert_eq!(settings.indexing.exclude_paths, vec!["packages/generated".to_string(), "/tmp/out".to_string()]);
    assert_eq!(settings.logging.level, LogLevel::Debug);
    assert_eq!(settings.logging.file.as_deref(), Some("/tmp/analyzer.log"));
    assert_eq!(settings.thread_pool.worker_threads, 3);
}

#[test]
fn parses_direct_payload() {
    let payload = json!({
        "indexing": { "enable": false },
        "somethingElse": { "ignored": true }
    });

    let settings = AnalysisSettings::from_json_payload(Some(&payload));
    assert!(!settings.indexing.enable);
    assert!(settings.scanner.incremental);
}

#[test]
fn clamps_numeric_values() {
    let payload = json!({
        "scanner": { "maxFileSizeKb": 1 },
        "indexing": { "concurrency": 0 },
        "threadPool": { "workerThreads": 1000 }
    });

    let settings = AnalysisSettings::from_json_payload(Some(&payload));
    assert_eq!(settings.scanner.max_file_size_kb, MIN_MAX_FILE_SIZE_KB);
    assert_eq!(settings.indexing.concurrency, MIN_INDEXING_CONCURRENCY);
    assert_eq!(settings.thread_pool.worker_threads, MAX_WORKER_THREADS);
}

#[test]
fn preserves_existing_values_when_payload_is_partial() {
    let base = AnalysisSettings {
        logging: LoggingSettings {
            level: LogLevel::Trace,
            file: None,
        },
        ..AnalysisSettings::default()
    };
    let merged = base.merged_with_payload(&json!({ "indexing": { "concurrency": 8 } }));
    assert_eq!(merged.logging.level, LogLevel::Trace);
    assert_eq!(merged.indexing.concurrency, 8);
}

#[test]
fn malformed_categories_are_ignored() {
    let payload = json!({ "indexing": { "concurrency": "many" } });
    let settings = AnalysisSettings::from_json_payload(Some(&payload));
    assert_eq!(settings, AnalysisSettings::default());
}

#[test]
fn log_levels_map_to_filter_directives() {
    assert_eq!(LogLevel::default().filter_directive(), "dart_analyzer=info");
    assert_eq!(LogLevel::Warn.filter_directive(), "dart_analyzer=warn");
}

#[test]
fn options_file_is_found_in_an_ancestor() {
    let root = tempfile::tempdir().expect("tempdir");
    let nested = root.path().join("lib/src");
    std::fs::create_dir_all(&nested).expect("mkdir");
    std::fs::write(
        root.path().join(OPTIONS_FILE_NAME),
        "[indexing]\nconcurrency = 6\nexcludePaths = [\"gen\"]\n\n[logging]\nlevel = \"warn\"\n",
    )
    .expect("write options");
    let source = nested.join("main.dart");
    std::fs::write(&source, "main() {}").expect("write source");

    assert_eq!(find_options_file(&source), Some(root.path().join(OPTIONS_FILE_NAME)));
    let settings = AnalysisSettings::discover(&nested);
    assert_eq!(settings.indexing.concurrency, 6);
    assert_eq!(settings.indexing.exclude_paths, vec!["gen".to_string()]);
    assert_eq!(settings.logging.level, LogLevel::Warn);
}

#[test]
fn invalid_options_files_are_reported() {
    let root = tempfile::tempdir().expect("tempdir");
    let path = root.path().join(OPTIONS_FILE_NAME);
    std::fs::write(&path, "[indexing\n").expect("write options");
    let err = AnalysisSettings::from_options_file(&path).expect_err("invalid toml");
    assert!(matches!(err, ConfigError::Toml { .. }), "{err}");
    assert_eq!(AnalysisSettings::discover(root.path()), AnalysisSettings::default());
}
