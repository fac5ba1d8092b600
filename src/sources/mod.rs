//! Fuentes de música: el backend que convierte una pista en un stream
//! (yt-dlp) y el proveedor de metadatos que expande enlaces de Spotify.

pub mod resolver;
pub mod spotify;
pub mod youtube;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::audio::track::{ResolvedTrack, TrackDescriptor};

pub use resolver::{BatchInfo, ResolvedRequest, TrackResolver};
pub use spotify::SpotifyClient;
pub use youtube::YtDlpBackend;

/// Errores de resolución y de proveedores externos
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no se pudo ejecutar el backend de medios: {0}")]
    Process(#[from] std::io::Error),

    #[error("el backend tardó más de {0:?}")]
    Timeout(Duration),

    #[error("el backend falló: {0}")]
    Backend(String),

    #[error("respuesta inválida: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sin resultados para '{0}'")]
    NoResults(String),

    #[error("no hay stream reproducible para '{0}'")]
    NoStream(String),

    #[error("error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("autenticación rechazada: {0}")]
    Auth(String),

    #[error("datos incompletos del proveedor: {0}")]
    Incomplete(String),
}

/// Backend que resuelve una pista en un stream reproducible
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn resolve(&self, descriptor: &TrackDescriptor) -> Result<ResolvedTrack, SourceError>;
}

/// Tipo de colección del proveedor de metadatos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Album,
    Playlist,
}

impl CollectionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Album => "Album",
            Self::Playlist => "Playlist",
        }
    }
}

/// Pista tal como la devuelve el proveedor, sin validar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTrack {
    pub name: Option<String>,
    pub artists: Vec<String>,
    pub url: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHeader {
    pub name: String,
    pub image: Option<String>,
}

/// Página de pistas de una colección
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackPage {
    pub tracks: Vec<ProviderTrack>,
    /// Offset de la siguiente página, si la hay
    pub next_offset: Option<u32>,
}

/// Proveedor de metadatos (Spotify)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn lookup_track(&self, id: &str) -> Result<ProviderTrack, SourceError>;

    async fn lookup_collection(
        &self,
        kind: CollectionKind,
        id: &str,
    ) -> Result<CollectionHeader, SourceError>;

    async fn collection_page(
        &self,
        kind: CollectionKind,
        id: &str,
        offset: u32,
    ) -> Result<TrackPage, SourceError>;
}
