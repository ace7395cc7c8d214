//! End-to-end runs of the task graph against a loopback HTTP server.

use std::fs;

use stsflow::core::TaskStatus;
use stsflow::pipeline::Scheduler;
use stsflow::tasks::TaskFamily;

use crate::fixtures::{ctx, HttpFixture, Workspace, DEV_CSV, TEST_CSV, TRAIN_CSV};

#[test]
fn test_extract_downloads_then_extracts() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    let root = TaskFamily::ExtractStsbenchmark.instantiate(&ws.settings(&server.url));

    let summary = Scheduler::new(ctx()).run(root).unwrap();

    assert!(summary.is_success(), "{}", summary.render());
    assert_eq!(summary.completed().len(), 2);
    assert_eq!(server.request_count(), 1);
    assert!(ws.archive_path().is_file());
    assert_eq!(fs::read_to_string(ws.extracted("train")).unwrap(), TRAIN_CSV);
    assert_eq!(fs::read_to_string(ws.extracted("dev")).unwrap(), DEV_CSV);
    assert_eq!(fs::read_to_string(ws.extracted("test")).unwrap(), TEST_CSV);
    assert!(!ws.data_dir().join("stsbenchmark/readme.txt").exists());
    assert!(!ws.data_dir().join("stsbenchmark/sts-train.csv").exists());
}

#[test]
fn test_finetune_halts_on_unimplemented_bert_download() {
    let ws = Workspace::new();
    let server = HttpFixture::archive();
    let settings = ws.settings(&server.url);
    let root = TaskFamily::FinetuneBertForSts.instantiate(&settings);
    let root_id = root.id();

    let summary = Scheduler::new(ctx()).run(root).unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.tasks.len(), 4);

    let bert_id = TaskFamily::DownloadPretrainedBert.instantiate(&settings).id();
    match summary.status_of(&bert_id) {
        Some(TaskStatus::Failed { error }) => assert!(error.starts_with("Not implemented")),
        other => panic!("unexpected status: {:?}", other),
    }
    assert!(matches!(
        summary.status_of(&root_id),
        Some(TaskStatus::NotRun { .. })
    ));
    assert!(!ws.finetuned_dir().join("eval_results.txt").exists());
}

#[test]
fn test_http_error_stops_before_extraction() {
    let ws = Workspace::new();
    let server = HttpFixture::serve("404 Not Found", b"<html>gone</html>".to_vec());
    let settings = ws.settings(&server.url);
    let root = TaskFamily::ExtractStsbenchmark.instantiate(&settings);
    let root_id = root.id();

    let summary = Scheduler::new(ctx()).run(root).unwrap();

    assert_eq!(summary.failed().len(), 1);
    assert!(summary.failed()[0]
        .status
        .to_string()
        .contains("returned 404"));
    assert!(matches!(
        summary.status_of(&root_id),
        Some(TaskStatus::NotRun { .. })
    ));
    assert!(!ws.archive_path().exists());
}

#[test]
fn test_plan_on_empty_workspace() {
    let ws = Workspace::new();
    let plan =
        Scheduler::plan(TaskFamily::FinetuneBertForSts.instantiate(&ws.settings("http://unused")))
            .unwrap();

    assert_eq!(plan.len(), 4);
    assert!(plan.iter().all(|entry| !entry.complete));
    assert_eq!(plan.last().unwrap().id.family(), "FinetuneBertForSts");
    assert_eq!(plan.last().unwrap().requires.len(), 2);

    let bert = plan
        .iter()
        .find(|entry| entry.id.family() == "DownloadPretrainedBert")
        .unwrap();
    assert_eq!(bert.missing.len(), 5);
}

#[cfg(unix)]
mod trainer {
    use super::*;
    use std::path::Path;
    use stsflow::tasks::PipelineSettings;

    const FAKE_TRAINER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --output_dir=*) out="${arg#--output_dir=}" ;;
  esac
done
mkdir -p "$out"
printf '%s\n' "$@" > "$out/args.txt"
echo "eval_pearson = 0.88" > "$out/eval_results.txt"
"#;

    fn with_script(ws: &Workspace, body: &str) -> PipelineSettings {
        let script = ws.root.join("run_reg.sh");
        fs::write(&script, body).unwrap();
        let mut settings = ws.settings("http://unused");
        settings.trainer.python = "sh".to_string();
        settings.trainer.script = script;
        settings
    }

    fn ready_inputs(ws: &Workspace) {
        ws.place_bert_files();
        ws.place_extracted(&["train", "dev", "test"]);
    }

    #[test]
    fn test_finetune_invokes_script_with_derived_paths() {
        let ws = Workspace::new();
        ready_inputs(&ws);
        let settings = with_script(&ws, FAKE_TRAINER);

        let summary = Scheduler::new(ctx())
            .run(TaskFamily::FinetuneBertForSts.instantiate(&settings))
            .unwrap();

        assert!(summary.is_success(), "{}", summary.render());
        assert_eq!(summary.completed().len(), 1);
        assert!(ws.finetuned_dir().join("eval_results.txt").is_file());

        let args = fs::read_to_string(ws.finetuned_dir().join("args.txt")).unwrap();
        let args: Vec<&str> = args.lines().collect();
        let expect = |flag: &str, path: &Path| format!("--{}={}", flag, path.display());
        assert_eq!(args[0], "--task_name=sts-b");
        assert!(args.contains(&expect("data_dir", &ws.data_dir()).as_str()));
        assert!(args.contains(&expect("vocab_file", &ws.pretrained_dir().join("vocab.txt")).as_str()));
        assert!(args.contains(
            &expect("init_checkpoint", &ws.finetuned_dir().join("model.ckpt-28745")).as_str()
        ));
        assert!(args.contains(&"--learning_rate=2e-5"));
        assert_eq!(args.len(), 12);
    }

    #[test]
    fn test_script_failure_is_reported() {
        let ws = Workspace::new();
        ready_inputs(&ws);
        let settings = with_script(&ws, "#!/bin/sh\nexit 3\n");

        let summary = Scheduler::new(ctx())
            .run(TaskFamily::FinetuneBertForSts.instantiate(&settings))
            .unwrap();

        assert_eq!(summary.failed().len(), 1);
        match &summary.failed()[0].status {
            TaskStatus::Failed { error } => {
                assert!(error.contains("exited with"));
                assert!(error.contains("--task_name=sts-b"));
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
