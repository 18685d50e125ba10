//! Blocking HTTP downloads

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::{Result, fetch};
use crate::progress::DownloadProgress;

const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Stream a response body to `file`, reporting progress as it goes
fn stream_response_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    progress: &DownloadProgress,
    url: &str,
) -> Result<u64> {
    progress.set_length(response.content_length());

    let mut downloaded: u64 = 0;
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| fetch::failed(url, format!("failed to read response: {e}")))?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| fetch::failed(url, format!("failed to write data: {e}")))?;

        downloaded += bytes_read as u64;
        progress.set_position(downloaded);
    }

    file.sync_all()
        .map_err(|e| fetch::failed(url, format!("failed to flush download: {e}")))?;
    Ok(downloaded)
}

/// HTTP client for remote archives
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client; without a timeout requests may block indefinitely
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| fetch::failed("<client>", format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Download `url` to `dest_path`, returning the number of bytes written
    ///
    /// The body is written to a sibling `.part` file and renamed into place
    /// once complete.
    pub fn download(&self, url: &str, dest_path: &Path) -> Result<u64> {
        debug!("Downloading {} to {}", url, dest_path.display());

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch::failed(url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch::failed(url, format!("HTTP {}", response.status())));
        }

        let display_name = crate::link::file_name(url).unwrap_or(url);
        let progress = DownloadProgress::new(display_name);

        let temp_path = dest_path.with_extension("part");
        let mut file = File::create(&temp_path).map_err(|e| {
            fetch::failed(url, format!("failed to create {}: {e}", temp_path.display()))
        })?;

        let downloaded = match stream_response_to_file(response, &mut file, &progress, url) {
            Ok(downloaded) => downloaded,
            Err(e) => {
                progress.abandon();
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };
        progress.finish();

        fs::rename(&temp_path, dest_path).map_err(|e| {
            fetch::failed(
                url,
                format!(
                    "failed to move {} to {}: {e}",
                    temp_path.display(),
                    dest_path.display()
                ),
            )
        })?;

        info!("Downloaded {} bytes from {}", downloaded, url);
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourcemarkError;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    /// Serve one canned HTTP response on a local port
    fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).is_ok_and(|n| n > 2) {
                    line.clear();
                }
                let header = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{addr}/simple-2.0.tar.gz")
    }

    #[test]
    fn test_download_writes_body() {
        let url = serve_once("200 OK", b"archive bytes");
        let temp = crate::test_fixtures::create_temp_dir();
        let dest = temp.path().join("simple-2.0.tar.gz");

        let client = HttpClient::new(Some(Duration::from_secs(10))).unwrap();
        let size = client.download(&url, &dest).unwrap();

        assert_eq!(size, 13);
        assert_eq!(fs::read(&dest).unwrap(), b"archive bytes");
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_download_http_error_is_fetch_failed() {
        let url = serve_once("404 Not Found", b"");
        let temp = crate::test_fixtures::create_temp_dir();
        let dest = temp.path().join("simple-2.0.tar.gz");

        let client = HttpClient::new(Some(Duration::from_secs(10))).unwrap();
        let err = client.download(&url, &dest).unwrap_err();

        assert!(matches!(err, SourcemarkError::FetchFailed { ref reason, .. } if reason.contains("404")));
        assert!(!dest.exists());
    }
}
