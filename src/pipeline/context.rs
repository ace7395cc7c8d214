use crate::fetch::Downloader;

/// Shared resources handed to every `Task::run`.
#[derive(Debug, Clone)]
pub struct RunContext {
    downloader: Downloader,
}

impl RunContext {
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("test HTTP client");
        Self::new(Downloader::from_client(client))
    }
}
