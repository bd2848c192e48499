use crate::download::download_hit;
use crate::pace::FixedDelay;
use crate::search::search_color;
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tokio::sync::mpsc::Sender;
use tracing::instrument;

mod config;
mod download;
mod errors;
mod pace;
mod search;

pub use config::{
    Color, FetchConfig, DEFAULT_ENDPOINT, DEFAULT_OUTPUT_DIR, DEFAULT_PAUSE_MS, DEFAULT_PER_PAGE,
};
pub use errors::PixgrabError;
pub use search::Hit;

#[derive(Debug)]
pub enum Update {
    MessageUpdate(Message),
    SavedUpdate(Saved),
}

#[derive(Debug)]
pub struct Message {
    pub content: String,
    pub is_error: bool,
}

/// One file landed on disk.
#[derive(Debug)]
pub struct Saved {
    pub id: u64,
    pub file: String,
    pub bytes_written: u64,
}

/// Per-color accounting for the end-of-run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSummary {
    pub color: Color,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// The search itself failed, so no downloads were attempted for this color.
    pub search_failed: bool,
}

impl ColorSummary {
    fn new(color: Color) -> Self {
        ColorSummary {
            color,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            search_failed: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub colors: Vec<ColorSummary>,
}

impl RunSummary {
    pub fn attempted(&self) -> u32 {
        self.colors.iter().map(|c| c.attempted).sum()
    }

    pub fn succeeded(&self) -> u32 {
        self.colors.iter().map(|c| c.succeeded).sum()
    }

    pub fn failed(&self) -> u32 {
        self.colors.iter().map(|c| c.failed).sum()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DirInit {
    Created,
    AlreadyExists,
    Failed(String),
}

/// Non-recursive create of the output directory. An existing directory is
/// fine; any other failure is reported but does not stop the run.
pub(crate) async fn prepare_output_dir(path: &Path) -> DirInit {
    match fs::create_dir(path).await {
        Ok(()) => DirInit::Created,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!(
                "Output directory {} already exists",
                path.to_string_lossy()
            );
            DirInit::AlreadyExists
        }
        Err(e) => {
            tracing::warn!(
                "Failed to create output directory {} : {} | {}",
                path.to_string_lossy(),
                e,
                e.kind()
            );
            DirInit::Failed(format!("{} | {}", e, e.kind()))
        }
    }
}

/// Runs the whole fetch: prepare the output directory, then for each color of
/// the palette search once and download every hit's 300px rendition in the
/// order the service returned them. A failed search skips to the next color;
/// a failed download skips to the next hit. Progress goes over `update_tx`.
#[instrument(skip(config, update_tx))]
pub async fn init_fetch(config: &FetchConfig, update_tx: Sender<Update>) -> RunSummary {
    if let DirInit::Failed(detail) = prepare_output_dir(&config.output_dir).await {
        if (update_tx
            .send(Update::MessageUpdate(Message {
                content: format!(
                    "Could not create output directory {} : {}",
                    config.output_dir.to_string_lossy(),
                    detail
                ),
                is_error: true,
            }))
            .await)
            .is_err()
        {};
    }

    let client = Client::builder()
        .user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36"
        ).build().unwrap();

    let pacer = FixedDelay::new(config.pause);
    let mut summary = RunSummary::default();

    for color in config.colors.iter().copied() {
        let mut color_summary = ColorSummary::new(color);
        if (update_tx
            .send(Update::MessageUpdate(Message {
                content: format!("Searching for {}", color),
                is_error: false,
            }))
            .await)
            .is_err()
        {};

        let hits = match search_color(&client, config, color).await {
            Err(e) => {
                // One color's outage does not stop the rest of the palette.
                color_summary.search_failed = true;
                summary.colors.push(color_summary);
                if (update_tx
                    .send(Update::MessageUpdate(Message {
                        content: format!("Search failed for {} : {}", color, e),
                        is_error: true,
                    }))
                    .await)
                    .is_err()
                {};
                continue;
            }
            Ok(hits) => hits,
        };

        for hit in hits.iter() {
            color_summary.attempted += 1;
            match download_hit(&client, hit, &config.output_dir).await {
                Err(e) => {
                    color_summary.failed += 1;
                    if (update_tx
                        .send(Update::MessageUpdate(Message {
                            content: format!("Error {} : {}", hit.id, e),
                            is_error: true,
                        }))
                        .await)
                        .is_err()
                    {};
                }
                Ok((file, bytes_written)) => {
                    color_summary.succeeded += 1;
                    if (update_tx
                        .send(Update::SavedUpdate(Saved {
                            id: hit.id,
                            file: file.to_string_lossy().to_string(),
                            bytes_written,
                        }))
                        .await)
                        .is_err()
                    {};
                }
            }
            pacer.wait().await;
        }

        if (update_tx
            .send(Update::MessageUpdate(Message {
                content: format!("Saved {}", color),
                is_error: false,
            }))
            .await)
            .is_err()
        {};
        summary.colors.push(color_summary);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::channel;
    use url::Url;

    fn http_response(status_line: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    /// Serves search and image requests for the driver tests. Search requests
    /// return `hit_ids` pointing back at this service, or a 500 when the
    /// query carries `fail_color`. Image requests are counted.
    async fn spawn_stub_service(
        hit_ids: Vec<u64>,
        fail_color: Option<&'static str>,
    ) -> (std::net::SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let image_requests = Arc::new(AtomicUsize::new(0));
        let counter = image_requests.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                let counter = counter.clone();
                let hit_ids = hit_ids.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 2048];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();

                    let response = if request.contains("/api/") {
                        let failed = fail_color
                            .map(|color| request.contains(&format!("colors={}", color)))
                            .unwrap_or(false);
                        if failed {
                            http_response("500 Internal Server Error", b"")
                        } else {
                            let hits: Vec<String> = hit_ids
                                .iter()
                                .map(|id| {
                                    format!(
                                        r#"{{"id":{id},"webformatURL":"http://{addr}/get/{id}_1280.jpg"}}"#
                                    )
                                })
                                .collect();
                            let body = format!(r#"{{"hits":[{}]}}"#, hits.join(","));
                            http_response("200 OK", body.as_bytes())
                        }
                    } else {
                        counter.fetch_add(1, Ordering::SeqCst);
                        http_response("200 OK", b"image bytes")
                    };
                    let _ = socket.write_all(&response).await;
                });
            }
        });

        (addr, image_requests)
    }

    fn stub_config(addr: std::net::SocketAddr, dir: &Path, colors: Vec<Color>) -> FetchConfig {
        let mut config = FetchConfig::new("test-key".into());
        config.endpoint = Url::parse(&format!("http://{}/api/", addr)).unwrap();
        config.output_dir = dir.to_path_buf();
        config.colors = colors;
        config.pause = Duration::from_millis(0);
        config
    }

    #[tokio::test]
    async fn every_hit_yields_exactly_one_download_attempt() {
        let (addr, image_requests) = spawn_stub_service(vec![101, 102], None).await;

        let dir = std::env::temp_dir().join(format!("pixgrab-drv-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = stub_config(addr, &dir, vec![Color::Blue]);

        let (tx, rx) = channel::<Update>(100);
        drop(rx);
        let summary = init_fetch(&config, tx).await;

        assert_eq!(image_requests.load(Ordering::SeqCst), 2);
        assert_eq!(summary.colors.len(), 1);
        assert_eq!(summary.colors[0].attempted, 2);
        assert_eq!(summary.colors[0].succeeded, 2);
        assert_eq!(summary.colors[0].failed, 0);
        assert_eq!(std::fs::read(dir.join("101.jpg")).unwrap(), b"image bytes");
        assert_eq!(std::fs::read(dir.join("102.jpg")).unwrap(), b"image bytes");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn a_failed_search_does_not_stop_the_palette() {
        let (addr, image_requests) = spawn_stub_service(vec![55], Some("red")).await;

        let dir = std::env::temp_dir().join(format!("pixgrab-bnd-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = stub_config(addr, &dir, vec![Color::Red, Color::Orange]);

        let (tx, rx) = channel::<Update>(100);
        drop(rx);
        let summary = init_fetch(&config, tx).await;

        assert_eq!(summary.colors.len(), 2);
        assert_eq!(summary.colors[0].color, Color::Red);
        assert!(summary.colors[0].search_failed);
        assert_eq!(summary.colors[0].attempted, 0);
        assert_eq!(summary.colors[1].color, Color::Orange);
        assert!(!summary.colors[1].search_failed);
        assert_eq!(summary.colors[1].succeeded, 1);
        assert_eq!(image_requests.load(Ordering::SeqCst), 1);
        assert!(dir.join("55.jpg").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn prepare_output_dir_tags_fresh_and_existing() {
        let dir = std::env::temp_dir().join(format!("pixgrab-dir-{}", std::process::id()));
        let _ = std::fs::remove_dir(&dir);

        assert_eq!(prepare_output_dir(&dir).await, DirInit::Created);
        assert_eq!(prepare_output_dir(&dir).await, DirInit::AlreadyExists);

        std::fs::remove_dir(&dir).unwrap();
    }

    #[tokio::test]
    async fn prepare_output_dir_reports_other_failures() {
        // Non-recursive create under a missing parent fails with NotFound.
        let dir = std::env::temp_dir()
            .join(format!("pixgrab-missing-{}", std::process::id()))
            .join("child");

        match prepare_output_dir(&dir).await {
            DirInit::Failed(_) => {}
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn run_summary_totals_span_colors() {
        let mut summary = RunSummary::default();
        summary.colors.push(ColorSummary {
            color: Color::Red,
            attempted: 40,
            succeeded: 38,
            failed: 2,
            search_failed: false,
        });
        summary.colors.push(ColorSummary {
            color: Color::Orange,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            search_failed: true,
        });
        summary.colors.push(ColorSummary {
            color: Color::Yellow,
            attempted: 12,
            succeeded: 12,
            failed: 0,
            search_failed: false,
        });

        assert_eq!(summary.attempted(), 52);
        assert_eq!(summary.succeeded(), 50);
        assert_eq!(summary.failed(), 2);
    }
}
