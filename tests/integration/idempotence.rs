//! Steps whose outputs already exist do no network or extraction work.

use std::fs;

use stsflow::core::TaskStatus;
use stsflow::pipeline::Scheduler;
use stsflow::tasks::TaskFamily;

use crate::fixtures::{ctx, write_sts_archive, HttpFixture, Workspace, DEV_CSV};

#[test]
fn test_existing_archive_is_not_downloaded_again() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    fs::create_dir_all(ws.data_dir()).unwrap();
    fs::write(ws.archive_path(), b"not really a tarball").unwrap();

    let summary = Scheduler::new(ctx())
        .run(TaskFamily::DownloadStsbenchmark.instantiate(&ws.settings(&server.url)))
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.already_done().len(), 1);
    assert_eq!(server.request_count(), 0);
    assert_eq!(fs::read(ws.archive_path()).unwrap(), b"not really a tarball");
}

#[test]
fn test_existing_splits_skip_extraction_and_download() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    ws.place_extracted(&["train", "dev", "test"]);

    let summary = Scheduler::new(ctx())
        .run(TaskFamily::ExtractStsbenchmark.instantiate(&ws.settings(&server.url)))
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.tasks.len(), 1);
    assert_eq!(server.request_count(), 0);
    assert!(!ws.archive_path().exists());
    assert_eq!(
        fs::read_to_string(ws.extracted("train")).unwrap(),
        "pre-existing"
    );
}

#[test]
fn test_second_run_is_a_no_op() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    let settings = ws.settings(&server.url);

    let first = Scheduler::new(ctx())
        .run(TaskFamily::ExtractStsbenchmark.instantiate(&settings))
        .unwrap();
    assert_eq!(first.completed().len(), 2);
    let modified = fs::metadata(ws.extracted("dev")).unwrap().modified().unwrap();

    let second = Scheduler::new(ctx())
        .run(TaskFamily::ExtractStsbenchmark.instantiate(&settings))
        .unwrap();

    assert!(second.completed().is_empty());
    assert_eq!(second.already_done().len(), 1);
    assert_eq!(server.request_count(), 1);
    assert_eq!(
        fs::metadata(ws.extracted("dev")).unwrap().modified().unwrap(),
        modified
    );
}

#[test]
fn test_partial_splits_reextract_from_local_archive() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    write_sts_archive(&ws.archive_path());
    ws.place_extracted(&["train", "test"]);
    let settings = ws.settings(&server.url);

    let summary = Scheduler::new(ctx())
        .run(TaskFamily::ExtractStsbenchmark.instantiate(&settings))
        .unwrap();

    let download_id = TaskFamily::DownloadStsbenchmark.instantiate(&settings).id();
    assert_eq!(
        summary.status_of(&download_id),
        Some(&TaskStatus::AlreadyDone)
    );
    assert_eq!(summary.completed().len(), 1);
    assert_eq!(server.request_count(), 0);
    assert_eq!(fs::read_to_string(ws.extracted("dev")).unwrap(), DEV_CSV);
}

#[test]
fn test_finetune_with_existing_results_runs_nothing() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    fs::create_dir_all(ws.finetuned_dir()).unwrap();
    fs::write(ws.finetuned_dir().join("eval_results.txt"), "eval_pearson = 0.9\n").unwrap();

    let summary = Scheduler::new(ctx())
        .run(TaskFamily::FinetuneBertForSts.instantiate(&ws.settings(&server.url)))
        .unwrap();

    // The BERT download is unimplemented, but a complete root never reaches it.
    assert!(summary.is_success());
    assert_eq!(summary.tasks.len(), 1);
    assert_eq!(server.request_count(), 0);
}
