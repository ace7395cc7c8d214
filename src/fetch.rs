//! HTTP downloads into local files.
//!
//! Bodies are streamed to `<dest>.part` and renamed into place once complete,
//! so an interrupted download never satisfies a file target.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use crate::{flog_debug, flog_warn, Error, Result};

const USER_AGENT: &str = concat!("stsflow/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client used by download tasks.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// GET `url` and write the body to `dest`. Returns the number of bytes written.
    ///
    /// Parent directories of `dest` are created. Non-2xx responses are errors
    /// and leave nothing at `dest`.
    pub fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        flog_debug!("Downloader::download_to url={} dest={}", url, dest.display());
        let mut response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let part = part_path(dest);
        let mut file = File::create(&part)?;
        let result = response
            .copy_to(&mut file)
            .map_err(Error::from)
            .and_then(|n| {
                file.sync_all()?;
                drop(file);
                fs::rename(&part, dest)?;
                Ok(n)
            });

        match result {
            Ok(written) => {
                flog_debug!("Downloaded {} bytes to {}", written, dest.display());
                Ok(written)
            }
            Err(e) => {
                discard_part(&part);
                Err(e)
            }
        }
    }
}

fn discard_part(part: &Path) {
    if let Err(rm) = fs::remove_file(part) {
        if rm.kind() != io::ErrorKind::NotFound {
            flog_warn!("Failed to remove {}: {}", part.display(), rm);
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
