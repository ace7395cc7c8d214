//! STS benchmark dataset: download the archive, extract the splits.

use std::path::{Path, PathBuf};

use crate::archive;
use crate::core::{LocalFileTarget, LocalFilesTarget, Target, Task};
use crate::pipeline::RunContext;
use crate::{flog, Result};

pub const ARCHIVE_NAME: &str = "Stsbenchmark.tar.gz";

/// Archive members extracted by [`ExtractStsbenchmark`].
pub const MEMBERS: [&str; 3] = [
    "stsbenchmark/sts-train.csv",
    "stsbenchmark/sts-dev.csv",
    "stsbenchmark/sts-test.csv",
];

/// Extracted members get this extension.
pub const EXTRACTED_EXTENSION: &str = "tsv";

#[derive(Debug, Clone)]
pub struct DownloadStsbenchmark {
    pub data_dir: PathBuf,
    pub url: String,
}

impl DownloadStsbenchmark {
    pub fn new(data_dir: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            url: url.into(),
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(ARCHIVE_NAME)
    }
}

impl Task for DownloadStsbenchmark {
    fn family(&self) -> &'static str {
        "DownloadStsbenchmark"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("data_dir", self.data_dir.display().to_string())]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalFileTarget::new(self.archive_path()))
    }

    fn run(&self, ctx: &RunContext) -> Result<()> {
        let dest = self.archive_path();
        flog!("Downloading {} to {}", self.url, dest.display());
        let bytes = ctx.downloader().download_to(&self.url, &dest)?;
        flog!("Downloaded {} ({} bytes)", dest.display(), bytes);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExtractStsbenchmark {
    pub data_dir: PathBuf,
    pub url: String,
}

impl ExtractStsbenchmark {
    pub fn new(data_dir: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            url: url.into(),
        }
    }

    fn download(&self) -> DownloadStsbenchmark {
        DownloadStsbenchmark::new(self.data_dir.clone(), self.url.clone())
    }

    /// `<data_dir>/stsbenchmark/sts-{train,dev,test}.tsv`
    pub fn output_paths(&self) -> Vec<PathBuf> {
        MEMBERS
            .iter()
            .map(|m| self.data_dir.join(extracted_name(Path::new(m))))
            .collect()
    }
}

fn extracted_name(member: &Path) -> PathBuf {
    member.with_extension(EXTRACTED_EXTENSION)
}

impl Task for ExtractStsbenchmark {
    fn family(&self) -> &'static str {
        "ExtractStsbenchmark"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("data_dir", self.data_dir.display().to_string())]
    }

    fn requires(&self) -> Vec<Box<dyn Task>> {
        vec![Box::new(self.download())]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalFilesTarget::new(self.output_paths()))
    }

    fn run(&self, _ctx: &RunContext) -> Result<()> {
        let archive_path = self.download().archive_path();
        flog!(
            "Extracting {} member(s) from {}",
            MEMBERS.len(),
            archive_path.display()
        );
        archive::extract_members(&archive_path, &self.data_dir, &MEMBERS, extracted_name)?;
        Ok(())
    }
}
