use serenity::model::id::UserId;
use std::time::Duration;

/// Valores que los proveedores usan cuando no conocen el título o el artista
const PLACEHOLDERS: &[&str] = &["unknown", "unknown artist", "unknown title", "untitled"];

/// Pista pendiente de resolver.
///
/// Una petición de texto libre o un enlace que no pertenece al proveedor de
/// metadatos se guarda tal cual (`Query`); las pistas obtenidas del catálogo
/// del proveedor llevan su metadata estructurada (`Catalog`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackDescriptor {
    Query(String),
    Catalog(CatalogTrack),
}

/// Pista proveniente de un álbum, playlist o enlace de pista del proveedor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTrack {
    pub title: String,
    pub artist: String,
    /// Texto exacto que se envía al backend de medios
    pub search_query: String,
    pub source_url: Option<String>,
    pub thumbnail: Option<String>,
}

impl CatalogTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        let title = title.into();
        let artist = artist.into();
        let search_query = format!("{} audio", join_artist_title(&artist, &title));

        Self {
            title,
            artist,
            search_query,
            source_url: None,
            thumbnail: None,
        }
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }
}

impl TrackDescriptor {
    /// Texto que recibe el backend de medios
    pub fn resolution_query(&self) -> &str {
        match self {
            Self::Query(raw) => raw,
            Self::Catalog(track) => &track.search_query,
        }
    }

    /// Nombre legible para colas y mensajes de error
    pub fn label(&self) -> String {
        match self {
            Self::Query(raw) => raw.clone(),
            Self::Catalog(track) => join_artist_title(&track.artist, &track.title),
        }
    }

    /// Consulta de autoplay derivada de esta pista.
    ///
    /// Devuelve `None` cuando la pista no tiene datos suficientes para buscar
    /// algo parecido (título y artista vacíos, o texto vacío).
    pub fn autoplay_query(&self) -> Option<String> {
        match self {
            Self::Query(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(format!("{} related", raw))
                }
            }
            Self::Catalog(track) => {
                if is_placeholder(&track.artist) && is_placeholder(&track.title) {
                    return None;
                }
                let seed: Vec<&str> = [track.artist.trim(), track.title.trim()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect();
                Some(format!("{} mix", seed.join(" ")))
            }
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.iter().any(|p| value.eq_ignore_ascii_case(p))
}

fn join_artist_title(artist: &str, title: &str) -> String {
    match (artist.trim(), title.trim()) {
        ("", title) => title.to_string(),
        (artist, "") => artist.to_string(),
        (artist, title) => format!("{} - {}", artist, title),
    }
}

/// Entrada de la cola: la pista y quién la pidió
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub descriptor: TrackDescriptor,
    pub requested_by: UserId,
}

impl QueueItem {
    pub fn new(descriptor: TrackDescriptor, requested_by: UserId) -> Self {
        Self {
            descriptor,
            requested_by,
        }
    }
}

/// Resultado del backend de medios para una pista
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub title: String,
    pub duration: Option<Duration>,
    pub uploader: Option<String>,
    pub thumbnail: Option<String>,
    /// Página pública del video (no el stream)
    pub page_url: Option<String>,
    pub stream_url: String,
}

/// Pista sonando en una guild, con la metadata ya resuelta
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub item: QueueItem,
    pub title: String,
    pub page_url: Option<String>,
    /// Enlace del proveedor de metadatos cuando la pista salió de su catálogo
    pub source_url: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<Duration>,
    pub uploader: Option<String>,
    pub stream_url: String,
}

impl NowPlaying {
    /// Combina la pista pedida con lo que devolvió el backend. La metadata del
    /// catálogo tiene prioridad sobre la del backend.
    pub fn new(item: QueueItem, resolved: ResolvedTrack) -> Self {
        let (title, thumbnail, source_url) = match &item.descriptor {
            TrackDescriptor::Query(_) => (resolved.title, resolved.thumbnail, None),
            TrackDescriptor::Catalog(track) => (
                join_artist_title(&track.artist, &track.title),
                track.thumbnail.clone().or(resolved.thumbnail),
                track.source_url.clone(),
            ),
        };

        Self {
            item,
            title,
            page_url: resolved.page_url,
            source_url,
            thumbnail,
            duration: resolved.duration,
            uploader: resolved.uploader,
            stream_url: resolved.stream_url,
        }
    }

    pub fn requested_by(&self) -> UserId {
        self.item.requested_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolved(title: &str) -> ResolvedTrack {
        ResolvedTrack {
            title: title.to_string(),
            duration: Some(Duration::from_secs(215)),
            uploader: Some("Canal".to_string()),
            thumbnail: Some("https://img/yt.jpg".to_string()),
            page_url: Some("https://youtube.com/watch?v=abc".to_string()),
            stream_url: "https://stream/abc".to_string(),
        }
    }

    #[test]
    fn catalog_track_builds_search_query() {
        let track = CatalogTrack::new("Song1", "A");
        assert_eq!(track.search_query, "A - Song1 audio");
        assert_eq!(
            TrackDescriptor::Catalog(track).resolution_query(),
            "A - Song1 audio"
        );
    }

    #[test]
    fn query_is_resolved_verbatim() {
        let descriptor = TrackDescriptor::Query("https://youtu.be/xyz".to_string());
        assert_eq!(descriptor.resolution_query(), "https://youtu.be/xyz");
        assert_eq!(descriptor.label(), "https://youtu.be/xyz");
    }

    #[test]
    fn autoplay_query_per_shape() {
        let catalog = TrackDescriptor::Catalog(CatalogTrack::new("Song", "Artist"));
        assert_eq!(catalog.autoplay_query().as_deref(), Some("Artist Song mix"));

        let query = TrackDescriptor::Query("lofi beats".to_string());
        assert_eq!(query.autoplay_query().as_deref(), Some("lofi beats related"));
    }

    #[test]
    fn autoplay_rejects_degenerate_seeds() {
        let blank = TrackDescriptor::Catalog(CatalogTrack::new("", "  "));
        assert_eq!(blank.autoplay_query(), None);

        let unknown = TrackDescriptor::Catalog(CatalogTrack::new("Unknown Title", "Unknown Artist"));
        assert_eq!(unknown.autoplay_query(), None);

        let empty = TrackDescriptor::Query("   ".to_string());
        assert_eq!(empty.autoplay_query(), None);

        // Con uno solo de los dos campos todavía hay algo que buscar
        let only_title = TrackDescriptor::Catalog(CatalogTrack::new("Song", ""));
        assert_eq!(only_title.autoplay_query().as_deref(), Some("Song mix"));
    }

    #[test]
    fn now_playing_prefers_catalog_metadata() {
        let track = CatalogTrack::new("Song1", "A")
            .with_source_url(Some("https://open.spotify.com/track/1".to_string()))
            .with_thumbnail(Some("https://img/cover.jpg".to_string()));
        let item = QueueItem::new(TrackDescriptor::Catalog(track), UserId::new(7));

        let np = NowPlaying::new(item, resolved("A - Song1 (Official Video)"));

        assert_eq!(np.title, "A - Song1");
        assert_eq!(np.thumbnail.as_deref(), Some("https://img/cover.jpg"));
        assert_eq!(np.source_url.as_deref(), Some("https://open.spotify.com/track/1"));
        assert_eq!(np.uploader.as_deref(), Some("Canal"));
        assert_eq!(np.requested_by(), UserId::new(7));
    }

    #[test]
    fn now_playing_falls_back_to_backend_metadata() {
        let item = QueueItem::new(TrackDescriptor::Query("song".to_string()), UserId::new(1));
        let np = NowPlaying::new(item, resolved("Backend Title"));

        assert_eq!(np.title, "Backend Title");
        assert_eq!(np.thumbnail.as_deref(), Some("https://img/yt.jpg"));
        assert_eq!(np.source_url, None);
    }
}
