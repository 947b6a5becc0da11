//! Content fetching: turn a [`Location`] into a lazily-read byte stream.
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};

use super::location::Location;
use crate::error::FetchError;

/// A single-owner, forward-only byte stream.
///
/// The underlying handle (socket or file) is released when the stream is
/// dropped, so moving it into a consumer releases it on every exit path.
pub struct ContentStream {
    origin: String,
    reader: Box<dyn Read>,
}

impl ContentStream {
    /// Wrap `reader`; `origin` names the source for log and error messages.
    pub fn new(origin: impl Into<String>, reader: impl Read + 'static) -> Self {
        Self {
            origin: origin.into(),
            reader: Box::new(reader),
        }
    }

    /// The location this stream was opened from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("origin", &self.origin)
            .field("reader", &"<dyn Read>")
            .finish()
    }
}

/// Opens content streams for locations.
///
/// Production code uses [`HttpFetcher`]; tests substitute fetchers that serve
/// in-memory archives.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: fmt::Debug {
    /// Open `location` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] for a missing local file,
    /// [`FetchError::BadStatus`] for a non-success HTTP response and
    /// [`FetchError::Transport`] when no response was received.
    fn fetch(&self, location: &Location) -> Result<ContentStream, FetchError>;
}

/// Production [`Fetcher`]: HTTP(S) via [`ureq`], local files via [`std::fs`].
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &Location) -> Result<ContentStream, FetchError> {
        match location {
            Location::Remote(url) => {
                let response = self.agent.get(url.as_str()).call().map_err(|e| match e {
                    ureq::Error::StatusCode(status) => FetchError::BadStatus {
                        url: url.clone(),
                        status,
                    },
                    other => FetchError::Transport {
                        url: url.clone(),
                        reason: other.to_string(),
                    },
                })?;
                tracing::debug!("{url}: HTTP {}", response.status());
                Ok(ContentStream::new(
                    url.clone(),
                    response.into_body().into_reader(),
                ))
            }
            Location::LocalFile(path) => open_local(path),
        }
    }
}

fn open_local(path: &std::path::Path) -> Result<ContentStream, FetchError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            FetchError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FetchError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(ContentStream::new(
        path.display().to_string(),
        BufReader::new(file),
    ))
}
