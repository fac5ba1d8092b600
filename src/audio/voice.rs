use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::GuildId;
use songbird::{
    input::{HttpRequest, Input},
    tracks::{PlayMode, TrackHandle},
    Call, Event, Songbird, TrackEvent,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::bot::events::{TrackEndNotifier, TrackErrorNotifier};

/// Aviso de que el stream de una guild terminó (bien o con error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCompletion {
    pub guild_id: GuildId,
    /// Generación de la guild cuando arrancó el stream
    pub generation: u64,
    pub error: Option<String>,
}

/// Gancho que el subsistema de audio dispara al terminar un stream.
///
/// Solo cruza el canal de finalización hacia el controlador; nunca toca el
/// estado de la guild. Se dispara una sola vez aunque lleguen varios eventos.
#[derive(Debug, Clone)]
pub struct CompletionHook {
    guild_id: GuildId,
    generation: u64,
    tx: mpsc::UnboundedSender<TrackCompletion>,
    fired: Arc<AtomicBool>,
}

impl CompletionHook {
    pub fn new(guild_id: GuildId, generation: u64, tx: mpsc::UnboundedSender<TrackCompletion>) -> Self {
        Self {
            guild_id,
            generation,
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn complete(&self, error: Option<String>) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }

        let completion = TrackCompletion {
            guild_id: self.guild_id,
            generation: self.generation,
            error,
        };
        if self.tx.send(completion).is_err() {
            warn!("Canal de finalización cerrado para guild {}", self.guild_id);
        }
    }
}

/// Sesión de voz de una guild tal como la ve el controlador
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Empieza a transmitir `stream_url`; `hook` se dispara al terminar
    async fn play(&self, stream_url: &str, hook: CompletionHook) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn resume(&self) -> Result<()>;
    /// Detiene el stream actual; el gancho del stream se dispara igualmente
    async fn stop(&self) -> Result<()>;
    async fn is_playing(&self) -> bool;
    async fn is_paused(&self) -> bool;
    async fn disconnect(&self) -> Result<()>;
}

/// Sesión de voz respaldada por un `Call` de Songbird
pub struct SongbirdSession {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    http: reqwest::Client,
    volume: f32,
    current: SyncMutex<Option<TrackHandle>>,
}

impl SongbirdSession {
    pub fn new(
        guild_id: GuildId,
        manager: Arc<Songbird>,
        call: Arc<Mutex<Call>>,
        http: reqwest::Client,
        volume: f32,
    ) -> Self {
        Self {
            guild_id,
            manager,
            call,
            http,
            volume,
            current: SyncMutex::new(None),
        }
    }

    fn current_track(&self) -> Option<TrackHandle> {
        self.current.lock().clone()
    }

    async fn play_mode(&self) -> Option<PlayMode> {
        let track = self.current_track()?;
        track.get_info().await.ok().map(|info| info.playing)
    }
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play(&self, stream_url: &str, hook: CompletionHook) -> Result<()> {
        let input: Input = HttpRequest::new(self.http.clone(), stream_url.to_string()).into();

        let track = {
            let mut call = self.call.lock().await;
            call.play_input(input)
        };

        let _ = track.set_volume(self.volume);

        let registered = track
            .add_event(Event::Track(TrackEvent::End), TrackEndNotifier { hook: hook.clone() })
            .and_then(|_| track.add_event(Event::Track(TrackEvent::Error), TrackErrorNotifier { hook }));
        if let Err(e) = registered {
            // Sin gancho nadie avanzaría la cola al terminar este stream
            let _ = track.stop();
            anyhow::bail!("Error al agregar event handler: {}", e);
        }

        *self.current.lock() = Some(track);
        debug!("▶️ Stream iniciado en guild {}", self.guild_id);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        if let Some(track) = self.current_track() {
            track.pause()?;
            info!("⏸️ Reproducción pausada en guild {}", self.guild_id);
        }
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        if let Some(track) = self.current_track() {
            track.play()?;
            info!("▶️ Reproducción reanudada en guild {}", self.guild_id);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let current = self.current.lock().take();
        if let Some(track) = current {
            // Un track ya terminado devuelve error al detenerlo; no importa
            let _ = track.stop();
        }
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        matches!(self.play_mode().await, Some(PlayMode::Play))
    }

    async fn is_paused(&self) -> bool {
        matches!(self.play_mode().await, Some(PlayMode::Pause))
    }

    async fn disconnect(&self) -> Result<()> {
        self.manager.remove(self.guild_id).await?;
        info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hook_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let hook = CompletionHook::new(GuildId::new(1), 4, tx);

        hook.clone().complete(Some("boom".to_string()));
        hook.complete(None);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.generation, 4);
        assert_eq!(first.error.as_deref(), Some("boom"));
        assert!(rx.try_recv().is_err());
    }
}
