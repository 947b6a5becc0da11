// Shared helpers for integration tests.
//
// Provides an isolated home directory, in-memory archive builders and
// scripted collaborators so each integration test can drive the install
// pipeline without network access or real build tools.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use provision_cli::config::Config;
use provision_cli::error::FetchError;
use provision_cli::exec::{ExecResult, Executor};
use provision_cli::logging::{Log, Logger};
use provision_cli::resources::fetch::{ContentStream, Fetcher};
use provision_cli::resources::location::Location;
use provision_cli::tasks::Context;

/// One entry of an in-memory tarball.
pub enum Entry<'a> {
    /// Regular file with contents and mode.
    File(&'a str, &'a [u8], u32),
    /// Directory with mode.
    Dir(&'a str, u32),
}

/// Build a gzip-compressed tarball from `entries`.
pub fn tar_gz(entries: &[Entry<'_>]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            Entry::File(path, data, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, *data)
                    .expect("append file");
            }
            Entry::Dir(path, mode) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(*mode);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .expect("append dir");
            }
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// An isolated home directory with a config rooted inside it.
pub struct TestHome {
    /// Backing directory, removed on drop.
    pub dir: tempfile::TempDir,
}

impl TestHome {
    /// Create an empty home.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp home"),
        }
    }

    /// Path to the home directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default layout for this home.
    pub fn config(&self) -> Config {
        Config::new(self.dir.path(), "tester")
    }

    /// Entries left in the scratch root, if it exists.
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        let scratch = self.config().scratch_root;
        if !scratch.exists() {
            return Vec::new();
        }
        std::fs::read_dir(scratch)
            .expect("read scratch")
            .map(|e| e.expect("scratch entry").path())
            .collect()
    }
}

/// Fetcher serving in-memory archives keyed by URL; unknown URLs are 404s.
#[derive(Debug, Default)]
pub struct ArchiveFetcher {
    archives: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl ArchiveFetcher {
    /// Serve `bytes` for `url`.
    pub fn serve(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.to_string(), bytes);
        self
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Fetcher for ArchiveFetcher {
    fn fetch(&self, location: &Location) -> Result<ContentStream, FetchError> {
        let url = location.to_string();
        self.requests.lock().expect("lock").push(url.clone());
        match self.archives.get(&url) {
            Some(bytes) => Ok(ContentStream::new(url, Cursor::new(bytes.clone()))),
            None => Err(FetchError::BadStatus { url, status: 404 }),
        }
    }
}

/// Executor answering every command with the same outcome and recording
/// the command lines.
#[derive(Debug)]
pub struct ScriptedExecutor {
    success: bool,
    stdout: String,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    /// Every command succeeds with empty output.
    pub fn succeeding() -> Self {
        Self::answering(true, "")
    }

    /// Every command exits with `success` and prints `stdout`.
    pub fn answering(success: bool, stdout: &str) -> Self {
        Self {
            success,
            stdout: stdout.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Command lines seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(
        &self,
        _: Option<&Path>,
        program: &str,
        args: &[&str],
        _: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().expect("lock").push(line);
        Ok(ExecResult {
            stdout: self.stdout.clone(),
            stderr: String::new(),
            success: self.success,
            code: Some(i32::from(!self.success)),
        })
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// Build a [`Context`] for `home` with the given collaborators.
pub fn context(
    home: &TestHome,
    executor: Arc<dyn Executor>,
    fetcher: Arc<dyn Fetcher>,
) -> (Context, Arc<Logger>) {
    let log = Arc::new(Logger::new("test"));
    let ctx = Context::new(home.config(), Arc::clone(&log) as Arc<dyn Log>)
        .with_executor(executor)
        .with_fetcher(fetcher);
    (ctx, log)
}
