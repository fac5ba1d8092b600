use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use url::Url;

use super::{MediaBackend, SourceError};
use crate::audio::track::{ResolvedTrack, TrackDescriptor};

/// Formato preferido: m4a primero, cualquier audio después
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// Procesos yt-dlp simultáneos
const MAX_CONCURRENT: usize = 3;

/// Backend de medios que delega en el ejecutable yt-dlp
pub struct YtDlpBackend {
    binary: String,
    timeout: Duration,
    limiter: Semaphore,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    /// URL directa del formato elegido
    url: Option<String>,
    /// Presente en resultados de búsqueda
    entries: Option<Vec<YtDlpInfo>>,
}

impl YtDlpBackend {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            // Limitar procesos concurrentes para evitar rate limiting
            limiter: Semaphore::new(MAX_CONCURRENT),
        }
    }

    /// Versión del ejecutable; sirve como health check
    pub async fn version(&self) -> Result<String, SourceError> {
        let output = Command::new(&self.binary).arg("--version").output().await?;
        if !output.status.success() {
            return Err(SourceError::Backend(stderr_summary(&output.stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, target: &str) -> Result<Vec<u8>, SourceError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;

        let mut command = Command::new(&self.binary);
        command
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "-f",
                AUDIO_FORMAT,
                target,
            ])
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(SourceError::Backend(stderr_summary(&output.stderr)));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    async fn resolve(&self, descriptor: &TrackDescriptor) -> Result<ResolvedTrack, SourceError> {
        let query = descriptor.resolution_query();
        let target = search_target(query);
        info!("🔍 Resolviendo con yt-dlp: {}", target);

        let stdout = self.run(&target).await?;
        let resolved = parse_info(&stdout, query)?;

        debug!("✅ Resuelto '{}' -> {}", query, resolved.title);
        Ok(resolved)
    }
}

/// Texto plano se busca en YouTube; los enlaces http(s) pasan tal cual
fn search_target(query: &str) -> String {
    let query = query.trim();
    match Url::parse(query) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => query.to_string(),
        _ => format!("ytsearch1:{}", query),
    }
}

fn parse_info(stdout: &[u8], query: &str) -> Result<ResolvedTrack, SourceError> {
    let mut info: YtDlpInfo = serde_json::from_slice(stdout)?;

    // Las búsquedas devuelven una lista; usamos el primer resultado
    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NoResults(query.to_string()))?;
    }

    let stream_url = info
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| SourceError::NoStream(query.to_string()))?;

    Ok(ResolvedTrack {
        title: info.title.unwrap_or_else(|| query.to_string()),
        duration: info
            .duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64),
        uploader: info.uploader,
        thumbnail: info.thumbnail,
        page_url: info.webpage_url,
        stream_url,
    })
}

/// Última línea útil de stderr (yt-dlp pone ahí el "ERROR: ...")
fn stderr_summary(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("sin detalles")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_becomes_search() {
        assert_eq!(search_target("A - Song1 audio"), "ytsearch1:A - Song1 audio");
        assert_eq!(
            search_target("https://youtu.be/xyz"),
            "https://youtu.be/xyz"
        );
        // Un esquema que no es http(s) también se busca
        assert_eq!(search_target("ftp://host/file"), "ytsearch1:ftp://host/file");
    }

    #[test]
    fn parses_search_result_entry() {
        let json = br#"{
            "_type": "playlist",
            "entries": [{
                "title": "Song1 (Official Audio)",
                "duration": 215.0,
                "uploader": "A - Topic",
                "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
                "webpage_url": "https://www.youtube.com/watch?v=abc",
                "url": "https://rr1.googlevideo.com/stream"
            }]
        }"#;

        let track = parse_info(json, "A - Song1 audio").unwrap();

        assert_eq!(track.title, "Song1 (Official Audio)");
        assert_eq!(track.duration, Some(Duration::from_secs(215)));
        assert_eq!(track.uploader.as_deref(), Some("A - Topic"));
        assert_eq!(track.stream_url, "https://rr1.googlevideo.com/stream");
    }

    #[test]
    fn parses_direct_video() {
        let json = br#"{"title": "Live", "url": "https://stream/live", "duration": null}"#;
        let track = parse_info(json, "https://youtu.be/live").unwrap();
        assert_eq!(track.duration, None);
        assert_eq!(track.page_url, None);
    }

    #[test]
    fn empty_search_is_no_results() {
        let err = parse_info(br#"{"entries": []}"#, "nada").unwrap_err();
        assert!(matches!(err, SourceError::NoResults(q) if q == "nada"));
    }

    #[test]
    fn missing_stream_url_is_an_error() {
        let err = parse_info(br#"{"title": "x"}"#, "x").unwrap_err();
        assert!(matches!(err, SourceError::NoStream(_)));
    }

    #[test]
    fn stderr_keeps_last_meaningful_line() {
        let stderr = b"WARNING: algo\nERROR: Video unavailable\n\n";
        assert_eq!(stderr_summary(stderr), "ERROR: Video unavailable");
        assert_eq!(stderr_summary(b""), "sin detalles");
    }
}
