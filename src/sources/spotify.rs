use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{CollectionHeader, CollectionKind, MetadataProvider, ProviderTrack, SourceError, TrackPage};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

const ALBUM_PAGE: u32 = 50;
const PLAYLIST_PAGE: u32 = 100;
const PLAYLIST_FIELDS: &str = "items(track(name,artists(name),external_urls(spotify),album(images))),next";

/// Margen para renovar el token antes de que expire
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

/// Cliente de la Web API de Spotify con credenciales de aplicación
pub struct SpotifyClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumRef {
    #[serde(default)]
    images: Option<Vec<ApiImage>>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
    album: Option<ApiAlbumRef>,
}

#[derive(Debug, Deserialize)]
struct ApiCollection {
    name: String,
    #[serde(default)]
    images: Option<Vec<ApiImage>>,
}

#[derive(Debug, Deserialize)]
struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<ApiTrack>,
}

fn first_image(images: Option<Vec<ApiImage>>) -> Option<String> {
    images.and_then(|images| images.into_iter().next()).map(|image| image.url)
}

impl From<ApiTrack> for ProviderTrack {
    fn from(track: ApiTrack) -> Self {
        Self {
            name: track.name,
            artists: track.artists.into_iter().filter_map(|a| a.name).collect(),
            url: track.external_urls.and_then(|urls| urls.spotify),
            image: track.album.and_then(|album| first_image(album.images)),
        }
    }
}

impl<T> ApiPage<T> {
    fn next_offset(&self, offset: u32, page_size: u32) -> Option<u32> {
        self.next.as_ref().map(|_| offset + page_size)
    }
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, SourceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        debug!("🔑 Solicitando token de Spotify");
        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .http
            .post(TOKEN_URL)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Auth(format!("token rechazado (HTTP {})", status)));
        }

        let body: TokenResponse = response.json().await?;
        let ttl = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_MARGIN);
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at: Instant::now() + ttl,
        });

        info!("✅ Token de Spotify renovado (válido {:?})", ttl);
        Ok(body.access_token)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Token revocado antes de tiempo: el próximo pedido pide otro
            self.token.lock().await.take();
            return Err(SourceError::Auth("token inválido (HTTP 401)".to_string()));
        }

        Ok(response.error_for_status()?.json().await?)
    }
}

#[async_trait]
impl MetadataProvider for SpotifyClient {
    async fn lookup_track(&self, id: &str) -> Result<ProviderTrack, SourceError> {
        let track: ApiTrack = self.get(&format!("/tracks/{}", id), &[]).await?;
        Ok(track.into())
    }

    async fn lookup_collection(
        &self,
        kind: CollectionKind,
        id: &str,
    ) -> Result<CollectionHeader, SourceError> {
        let collection: ApiCollection = match kind {
            CollectionKind::Album => self.get(&format!("/albums/{}", id), &[]).await?,
            CollectionKind::Playlist => {
                let query = [("fields", "name,images".to_string())];
                self.get(&format!("/playlists/{}", id), &query).await?
            }
        };

        Ok(CollectionHeader {
            name: collection.name,
            image: first_image(collection.images),
        })
    }

    async fn collection_page(
        &self,
        kind: CollectionKind,
        id: &str,
        offset: u32,
    ) -> Result<TrackPage, SourceError> {
        match kind {
            CollectionKind::Album => {
                let query = [
                    ("limit", ALBUM_PAGE.to_string()),
                    ("offset", offset.to_string()),
                ];
                let page: ApiPage<ApiTrack> =
                    self.get(&format!("/albums/{}/tracks", id), &query).await?;
                let next_offset = page.next_offset(offset, ALBUM_PAGE);

                Ok(TrackPage {
                    tracks: page.items.into_iter().map(ProviderTrack::from).collect(),
                    next_offset,
                })
            }
            CollectionKind::Playlist => {
                let query = [
                    ("limit", PLAYLIST_PAGE.to_string()),
                    ("offset", offset.to_string()),
                    ("fields", PLAYLIST_FIELDS.to_string()),
                ];
                let page: ApiPage<PlaylistItem> =
                    self.get(&format!("/playlists/{}/tracks", id), &query).await?;
                let next_offset = page.next_offset(offset, PLAYLIST_PAGE);

                Ok(TrackPage {
                    tracks: page
                        .items
                        .into_iter()
                        .filter_map(|item| item.track)
                        .map(ProviderTrack::from)
                        .collect(),
                    next_offset,
                })
            }
        }
    }
}
