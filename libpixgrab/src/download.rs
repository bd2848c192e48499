use crate::errors::PixgrabError;
use crate::search::Hit;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

const LARGE_WIDTH_MARKER: &str = "_1280.";
const SMALL_WIDTH_MARKER: &str = "_300.";

/// Rewrites a webformat rendition URL to its 300px-wide variant. This is a
/// textual rewrite of the service's URL convention, replacing only the first
/// width marker; a URL without the marker is returned unchanged.
pub fn thumbnail_url(webformat_url: &str) -> String {
    webformat_url.replacen(LARGE_WIDTH_MARKER, SMALL_WIDTH_MARKER, 1)
}

/// File extension with the leading dot, taken from the URL path. E.g ".jpg".
/// Empty if the path carries no extension.
pub fn file_extension(webformat_url: &str) -> &str {
    let path = match webformat_url.find(|c| c == '?' || c == '#') {
        Some(idx) => &webformat_url[..idx],
        None => webformat_url,
    };
    let name_start = path.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) => &path[name_start + dot..],
        None => "",
    }
}

/// Destination is `<output_dir>/<id><ext>`, with the extension taken from
/// the original webformat URL, not the rewritten one.
pub fn dest_path(output_dir: &Path, hit: &Hit) -> PathBuf {
    output_dir.join(format!(
        "{}{}",
        hit.id,
        file_extension(&hit.webformat_url)
    ))
}

/// Downloads the 300px rendition of one hit into `output_dir`, streaming the
/// body to disk. On failure the partially written file is removed on a
/// best-effort basis. Returns the file path and the number of bytes written.
#[tracing::instrument(skip(client, hit), fields(id = hit.id))]
pub(crate) async fn download_hit(
    client: &Client,
    hit: &Hit,
    output_dir: &Path,
) -> Result<(PathBuf, u64), PixgrabError> {
    let url = thumbnail_url(&hit.webformat_url);
    let destination = dest_path(output_dir, hit);
    tracing::debug!("Downloading {} from {}", hit.id, url);

    let mut response = match client.get(&url).send().await {
        Err(e) => {
            tracing::error!("Error downloading file from {}", url);
            tracing::error!("{}", e);
            return Err(PixgrabError::NetworkError(e.to_string()));
        }
        Ok(r) => {
            if !r.status().is_success() {
                tracing::error!("Error status code received : {} |{}|", r.status(), url);
                return Err(PixgrabError::ErrorStatusCode {
                    status_code: r.status().to_string(),
                    url,
                });
            }
            r
        }
    };

    // A repeat id under a later color overwrites the earlier file, so truncate.
    let mut dest_file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination.as_path())
        .await
    {
        Err(e) => {
            tracing::error!(
                "Error opening/creating file {}",
                destination.to_string_lossy()
            );
            tracing::error!("{} | {}", e, e.kind());
            return Err(PixgrabError::FileOperationError {
                file_name: destination.to_string_lossy().to_string(),
                message: format!("{} | {}", e, e.kind()),
            });
        }
        Ok(f) => f,
    };

    let mut bytes_written = 0u64;

    while let Some(bytes) = match response.chunk().await {
        Err(e) => {
            tracing::error!("Error downloading resource from {}", url);
            tracing::error!("{}", e);
            remove_partial_file(&destination).await;
            return Err(PixgrabError::NetworkError(e.to_string()));
        }
        Ok(bytes) => bytes,
    } {
        if let Err(e) = dest_file.write_all(&bytes).await {
            tracing::error!(
                "Error writing to destination file {}",
                destination.to_string_lossy()
            );
            tracing::error!("{} | {}", e, e.kind());
            remove_partial_file(&destination).await;
            return Err(PixgrabError::FileOperationError {
                file_name: destination.to_string_lossy().to_string(),
                message: format!("{} | {}", e, e.kind()),
            });
        };
        bytes_written += bytes.len() as u64;
    }

    tracing::debug!(
        "Download completed for {}, file @ {}",
        hit.id,
        destination.to_string_lossy()
    );
    Ok((destination, bytes_written))
}

/// Best-effort removal of a partially written file. A failure to delete is
/// swallowed.
async fn remove_partial_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::debug!(
            "Could not remove partial file {} : {}",
            path.to_string_lossy(),
            e
        );
    }
}
