use anyhow::Result;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{CollectionKind, MetadataProvider, ProviderTrack, SourceError};
use crate::audio::track::{CatalogTrack, TrackDescriptor};

/// Etiqueta e imagen de un álbum o playlist encolado de una vez
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInfo {
    pub label: String,
    pub thumbnail: Option<String>,
}

/// Resultado de interpretar una petición de `play`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub descriptors: Vec<TrackDescriptor>,
    pub batch: Option<BatchInfo>,
    /// Problema no fatal que hay que mostrar al usuario
    pub warning: Option<String>,
}

impl ResolvedRequest {
    fn plain(raw: &str) -> Self {
        Self {
            descriptors: vec![TrackDescriptor::Query(raw.to_string())],
            batch: None,
            warning: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Track,
    Collection(CollectionKind),
}

/// Convierte el texto de una petición en descriptores de pista.
///
/// Los enlaces de Spotify se expanden con el proveedor de metadatos; todo lo
/// demás (texto libre, enlaces de YouTube) se pasa tal cual al backend.
pub struct TrackResolver {
    provider: Option<Arc<dyn MetadataProvider>>,
    link: Regex,
}

impl TrackResolver {
    pub fn new(provider: Option<Arc<dyn MetadataProvider>>) -> Result<Self> {
        let link = Regex::new(
            r"^https?://open\.spotify\.com/(?:intl-\w+/)?(track|album|playlist)/([a-zA-Z0-9]+)",
        )?;

        Ok(Self { provider, link })
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn resolve(&self, raw: &str) -> ResolvedRequest {
        let raw = raw.trim();

        let (Some(provider), Some((kind, id))) = (&self.provider, self.parse_link(raw)) else {
            return ResolvedRequest::plain(raw);
        };

        let expanded = match kind {
            LinkKind::Track => self.expand_track(provider.as_ref(), &id, raw).await,
            LinkKind::Collection(kind) => {
                self.expand_collection(provider.as_ref(), kind, &id).await
            }
        };

        match expanded {
            Ok(request) => request,
            Err(e) => {
                warn!("⚠️ Spotify falló para '{}': {}", raw, e);
                ResolvedRequest {
                    warning: Some(format!(
                        "No se pudo obtener la info de Spotify ({}). Buscando como texto...",
                        e
                    )),
                    ..ResolvedRequest::plain(raw)
                }
            }
        }
    }

    fn parse_link(&self, raw: &str) -> Option<(LinkKind, String)> {
        let captures = self.link.captures(raw)?;
        let kind = match &captures[1] {
            "track" => LinkKind::Track,
            "album" => LinkKind::Collection(CollectionKind::Album),
            _ => LinkKind::Collection(CollectionKind::Playlist),
        };
        Some((kind, captures[2].to_string()))
    }

    async fn expand_track(
        &self,
        provider: &dyn MetadataProvider,
        id: &str,
        raw: &str,
    ) -> Result<ResolvedRequest, SourceError> {
        let track = provider.lookup_track(id).await?;
        let descriptor = catalog_descriptor(track, None, Some(raw))
            .ok_or_else(|| SourceError::Incomplete(format!("pista {} sin nombre o artista", id)))?;

        debug!("🎵 Pista de Spotify: {}", descriptor.label());
        Ok(ResolvedRequest {
            descriptors: vec![descriptor],
            batch: None,
            warning: None,
        })
    }

    async fn expand_collection(
        &self,
        provider: &dyn MetadataProvider,
        kind: CollectionKind,
        id: &str,
    ) -> Result<ResolvedRequest, SourceError> {
        let header = provider.lookup_collection(kind, id).await?;

        let mut descriptors = Vec::new();
        let mut skipped = 0;
        let mut offset = 0;
        loop {
            let page = provider.collection_page(kind, id, offset).await?;

            for track in page.tracks {
                match catalog_descriptor(track, header.image.as_deref(), None) {
                    Some(descriptor) => descriptors.push(descriptor),
                    None => skipped += 1,
                }
            }

            match page.next_offset {
                Some(next) if next > offset => offset = next,
                _ => break,
            }
        }

        info!(
            "📋 {} '{}': {} pistas ({} omitidas)",
            kind.label(),
            header.name,
            descriptors.len(),
            skipped
        );

        Ok(ResolvedRequest {
            descriptors,
            batch: Some(BatchInfo {
                label: format!("{}: {}", kind.label(), header.name),
                thumbnail: header.image,
            }),
            warning: None,
        })
    }
}

/// Descriptor de catálogo, o `None` si al proveedor le faltan nombre o artistas
fn catalog_descriptor(
    track: ProviderTrack,
    fallback_image: Option<&str>,
    fallback_url: Option<&str>,
) -> Option<TrackDescriptor> {
    let title = track.name.filter(|name| !name.trim().is_empty())?;
    let artist = track.artists.into_iter().find(|a| !a.trim().is_empty())?;

    let catalog = CatalogTrack::new(title, artist)
        .with_source_url(track.url.or_else(|| fallback_url.map(str::to_string)))
        .with_thumbnail(track.image.or_else(|| fallback_image.map(str::to_string)));

    Some(TrackDescriptor::Catalog(catalog))
}
