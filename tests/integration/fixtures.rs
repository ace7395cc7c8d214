//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Scratch workspaces with the default directory layout
//! - A loopback HTTP server serving a canned response and counting requests
//! - STS benchmark archives built on the fly

use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use stsflow::fetch::Downloader;
use stsflow::pipeline::RunContext;
use stsflow::tasks::bert::BERT_FILES;
use stsflow::tasks::{PipelineSettings, TrainerSettings};

pub const TRAIN_CSV: &str = "genre\tfile\tyear\t0\t5.000\tA plane is taking off.\tAn air plane is taking off.\n";
pub const DEV_CSV: &str = "main-captions\tMSRvid\t2012test\t0\t5.000\tA man with a hard hat is dancing.\tA man wearing a hard hat is dancing.\n";
pub const TEST_CSV: &str = "main-captions\tMSRvid\t2012test\t0\t2.500\tA girl is styling her hair.\tA girl is brushing her hair.\n";

/// A scratch directory laid out like a pipeline checkout.
pub struct Workspace {
    /// Keeps the directory alive for the duration of the test.
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn pretrained_dir(&self) -> PathBuf {
        self.root.join("model_pretrained").join("BERT")
    }

    pub fn finetuned_dir(&self) -> PathBuf {
        self.root.join("model_finetuned").join("BERT_STS")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir().join("Stsbenchmark.tar.gz")
    }

    pub fn extracted(&self, split: &str) -> PathBuf {
        self.data_dir()
            .join("stsbenchmark")
            .join(format!("sts-{}.tsv", split))
    }

    pub fn settings(&self, url: &str) -> PipelineSettings {
        PipelineSettings {
            data_dir: self.data_dir(),
            bert_pretrained_dir: self.pretrained_dir(),
            bert_ja_pretrained_dir: self.root.join("model_pretrained").join("BERT_ja"),
            bert_finetuned_dir: self.finetuned_dir(),
            dataset_url: url.to_string(),
            trainer: TrainerSettings::default(),
        }
    }

    /// Put empty checkpoint files where the BERT download would leave them.
    pub fn place_bert_files(&self) {
        let dir = self.pretrained_dir();
        fs::create_dir_all(&dir).unwrap();
        for name in BERT_FILES {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    /// Put the extracted splits in place without an archive.
    pub fn place_extracted(&self, splits: &[&str]) {
        for split in splits {
            let path = self.extracted(split);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "pre-existing").unwrap();
        }
    }
}

/// Run context whose HTTP client ignores proxy settings.
pub fn ctx() -> RunContext {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");
    RunContext::new(Downloader::from_client(client))
}

/// Build a gzipped tar shaped like the published STS benchmark.
pub fn sts_archive_bytes() -> Vec<u8> {
    let files = [
        ("stsbenchmark/readme.txt", "STS Benchmark\n"),
        ("stsbenchmark/sts-train.csv", TRAIN_CSV),
        ("stsbenchmark/sts-dev.csv", DEV_CSV),
        ("stsbenchmark/sts-test.csv", TEST_CSV),
        ("stsbenchmark/LICENSE.txt", "license\n"),
    ];
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn write_sts_archive(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path)
        .unwrap()
        .write_all(&sts_archive_bytes())
        .unwrap();
}

/// Loopback HTTP server answering every request with the same response.
pub struct HttpFixture {
    pub url: String,
    requests: Arc<AtomicUsize>,
}

impl HttpFixture {
    pub fn serve(status_line: &'static str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind loopback");
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let header = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status_line,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&body);
            }
        });

        Self {
            url: format!("http://{}/stswiki/images/4/48/Stsbenchmark.tar.gz", addr),
            requests,
        }
    }

    pub fn archive() -> Self {
        Self::serve("200 OK", sts_archive_bytes())
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}
