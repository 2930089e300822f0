//! End-to-end tests for the search core over real directory trees.

use std::fs;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;

use kbsearch::models::{ContentSearchRequest, FileSearchRequest};
use kbsearch::score::ScoringConfig;
use kbsearch::search::{search_content, search_files, SearchConfig};

fn search_config(root: &std::path::Path) -> SearchConfig {
    SearchConfig {
        root: root.to_path_buf(),
        workers: 4,
        deadline: Duration::from_secs(10),
        max_file_bytes: 50 * 1024 * 1024,
        scoring: ScoringConfig::default(),
    }
}

fn content_request(keywords: &str, file_names: &[&str]) -> ContentSearchRequest {
    ContentSearchRequest {
        file_names: file_names.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.to_string(),
        context_lines: 3,
        case_sensitive: false,
        max_results_per_file: 10,
    }
}

fn file_request(keywords: &str) -> FileSearchRequest {
    FileSearchRequest {
        keywords: keywords.to_string(),
        file_types: None,
        max_results: 20,
        search_content: true,
        case_sensitive: false,
    }
}

/// Minimal DOCX (ZIP with word/document.xml) containing the given paragraphs.
fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    buf
}

// Two keywords on the same line: one ContentMatch per keyword, bounded
// context, and a sorted unique-keyword set.
#[tokio::test]
async fn content_search_reports_both_keywords_on_one_line() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.md"),
        "intro line one\nsetup notes\nmore setup\nalmost there\ndeploy the service using config X\n",
    )
    .unwrap();

    let mut req = content_request("deploy config", &["a.md"]);
    req.context_lines = 1;
    let report = search_content(&search_config(dir.path()), &req)
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.results.len(), 1);
    let matches = &report.results[0].content_matches;
    assert_eq!(matches.len(), 2);
    for m in matches {
        assert_eq!(m.line_number, 5);
        assert!(m.context.before.len() <= 1);
        assert!(m.context.after.len() <= 1);
    }
    assert_eq!(
        report.statistics.unique_keywords_matched,
        vec!["config", "deploy"]
    );
    assert_eq!(report.statistics.total_matches_found, 2);
    assert_eq!(report.statistics.files_with_matches, 1);
}

#[tokio::test]
async fn empty_keywords_rejected_without_touching_the_filesystem() {
    // A root that cannot exist: if validation didn't come first, the
    // error would be directory_not_found instead.
    let cfg = search_config(std::path::Path::new("/definitely/not/here"));
    let err = search_content(&cfg, &content_request("", &["a.md"]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "empty_keywords");
}

#[tokio::test]
async fn missing_root_directory_is_reported() {
    let cfg = search_config(std::path::Path::new("/definitely/not/here"));
    let err = search_content(&cfg, &content_request("deploy", &["a.md"]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "directory_not_found");

    let err = search_files(&cfg, &file_request("deploy")).await.unwrap_err();
    assert_eq!(err.code(), "directory_not_found");
}

#[tokio::test]
async fn file_type_filter_keeps_only_requested_extensions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("guide.md"), "how to deploy\n").unwrap();
    fs::write(dir.path().join("guide.txt"), "how to deploy\n").unwrap();

    let mut req = file_request("deploy");
    req.file_types = Some(vec![".md".to_string()]);
    let report = search_files(&search_config(dir.path()), &req)
        .await
        .unwrap();

    assert_eq!(report.matching_files, 1);
    assert_eq!(report.results[0].file_type, ".md");
    // Both files were walked, even though only one was eligible.
    assert_eq!(report.total_files_scanned, 2);
}

#[tokio::test]
async fn undecodable_pdf_counts_as_scanned_but_never_matches() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.pdf"), b"this is not a pdf").unwrap();
    fs::write(dir.path().join("good.md"), "deploy notes\n").unwrap();

    let report = search_content(
        &search_config(dir.path()),
        &content_request("deploy", &["broken", "good"]),
    )
    .await
    .unwrap();

    // Both candidates were scanned; only the markdown file matched.
    assert_eq!(report.statistics.total_files_scanned, 2);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].file_info.name, "good.md");
}

#[tokio::test]
async fn one_bad_file_never_hides_its_siblings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("corrupt.pdf"), b"\x00\x01garbage").unwrap();
    fs::write(dir.path().join("sibling.md"), "deploy here\n").unwrap();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("deep.md"), "deploy there\n").unwrap();

    let report = search_files(&search_config(dir.path()), &file_request("deploy"))
        .await
        .unwrap();

    let names: Vec<&str> = report.results.iter().map(|r| r.file_name.as_str()).collect();
    assert!(names.contains(&"sibling.md"));
    assert!(names.contains(&"deep.md"));
}

#[tokio::test]
async fn repeated_queries_yield_identical_reports() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "deploy a\nconfig a\n").unwrap();
    fs::write(dir.path().join("b.md"), "deploy b\ndeploy again\n").unwrap();
    fs::write(dir.path().join("c.txt"), "config c\n").unwrap();

    let cfg = search_config(dir.path());
    let req = content_request("deploy config", &["*"]);

    let first = serde_json::to_string(&search_content(&cfg, &req).await.unwrap()).unwrap();
    let second = serde_json::to_string(&search_content(&cfg, &req).await.unwrap()).unwrap();
    assert_eq!(first, second);

    let freq = file_request("deploy config");
    let f1 = serde_json::to_string(&search_files(&cfg, &freq).await.unwrap()).unwrap();
    let f2 = serde_json::to_string(&search_files(&cfg, &freq).await.unwrap()).unwrap();
    assert_eq!(f1, f2);
}

#[tokio::test]
async fn scores_stay_in_unit_interval_and_lists_stay_sorted() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dense.md"),
        "deploy deploy deploy deploy deploy deploy\n".repeat(20),
    )
    .unwrap();
    fs::write(dir.path().join("sparse.md"), "one deploy mention\n").unwrap();

    let report = search_content(
        &search_config(dir.path()),
        &content_request("deploy", &["*.md"]),
    )
    .await
    .unwrap();

    for result in &report.results {
        let scores: Vec<f64> = result
            .content_matches
            .iter()
            .map(|m| m.relevance.score)
            .collect();
        for s in &scores {
            assert!((0.0..=1.0).contains(s), "score out of range: {}", s);
        }
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1], "matches not sorted by score");
        }
        assert!(result.summary.avg_relevance_score <= 1.0);
    }

    let averages: Vec<f64> = report
        .results
        .iter()
        .map(|r| r.summary.avg_relevance_score)
        .collect();
    for pair in averages.windows(2) {
        assert!(pair[0] >= pair[1], "files not sorted by average relevance");
    }
}

#[tokio::test]
async fn per_file_cap_bounds_every_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("long.md"),
        (0..50).map(|i| format!("deploy step {}\n", i)).collect::<String>(),
    )
    .unwrap();

    let mut req = content_request("deploy", &["long"]);
    req.max_results_per_file = 3;
    let report = search_content(&search_config(dir.path()), &req)
        .await
        .unwrap();

    assert_eq!(report.results[0].content_matches.len(), 3);
}

#[tokio::test]
async fn glob_patterns_select_files_case_insensitively() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Runbook-01.MD"), "deploy\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "deploy\n").unwrap();

    let report = search_content(
        &search_config(dir.path()),
        &content_request("deploy", &["runbook*"]),
    )
    .await
    .unwrap();

    assert_eq!(report.statistics.total_files_scanned, 1);
    assert_eq!(report.results[0].file_info.name, "Runbook-01.MD");
}

#[tokio::test]
async fn docx_paragraphs_are_searchable() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("plan.docx"),
        docx_bytes(&["requirements overview", "deploy the new build", "closing notes"]),
    )
    .unwrap();

    let mut req = content_request("deploy", &["plan"]);
    req.context_lines = 1;
    let report = search_content(&search_config(dir.path()), &req)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let m = &report.results[0].content_matches[0];
    assert_eq!(m.line_number, 2);
    assert_eq!(m.context.before, vec!["requirements overview"]);
    assert_eq!(m.context.after, vec!["closing notes"]);
}

#[tokio::test]
async fn hidden_entries_are_invisible() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("seen.md"), "deploy\n").unwrap();
    fs::write(dir.path().join(".secret.md"), "deploy\n").unwrap();
    fs::create_dir(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join(".cache").join("inner.md"), "deploy\n").unwrap();

    let report = search_files(&search_config(dir.path()), &file_request("deploy"))
        .await
        .unwrap();

    assert_eq!(report.total_files_scanned, 1);
    assert_eq!(report.matching_files, 1);
    assert_eq!(report.results[0].file_name, "seen.md");
}

#[tokio::test]
async fn recommendations_surface_missing_keywords_and_spread() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "deploy a\n").unwrap();
    fs::write(dir.path().join("b.md"), "deploy b\n").unwrap();

    let report = search_content(
        &search_config(dir.path()),
        &content_request("deploy kubernetes", &["*.md"]),
    )
    .await
    .unwrap();

    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("kubernetes")));
    assert!(report.recommendations.iter().any(|r| r.contains("2 files")));
}

#[tokio::test]
async fn case_sensitive_queries_respect_casing_everywhere() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "Deploy now\ndeploy later\n").unwrap();

    let mut req = content_request("Deploy", &["a.md"]);
    req.case_sensitive = true;
    let report = search_content(&search_config(dir.path()), &req)
        .await
        .unwrap();

    assert_eq!(report.statistics.total_matches_found, 1);
    assert_eq!(report.results[0].content_matches[0].line_number, 1);
}
