//! Dobles de prueba para el controlador de reproducción

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, MessageId};
use std::{
    collections::HashSet,
    sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};
use tokio::sync::Notify;

use super::{
    controls::ControlSet,
    notice::{Notice, Notifier, Retirement},
    track::{ResolvedTrack, TrackDescriptor},
    voice::{CompletionHook, VoiceSession},
};
use crate::sources::{MediaBackend, SourceError};

/// Backend que resuelve cualquier consulta salvo las marcadas como fallidas
#[derive(Default)]
pub struct FakeBackend {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl FakeBackend {
    pub fn fail_on(&self, query: &str) {
        self.failing.lock().insert(query.to_string());
    }

    /// Cada resolución espera a `release` después de avisar por `entered`
    pub fn gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn resolve(&self, descriptor: &TrackDescriptor) -> Result<ResolvedTrack, SourceError> {
        let query = descriptor.resolution_query().to_string();
        self.calls.lock().push(query.clone());

        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        if self.failing.lock().contains(&query) {
            return Err(SourceError::NoResults(query));
        }

        Ok(ResolvedTrack {
            title: query.clone(),
            duration: Some(Duration::from_secs(180)),
            uploader: None,
            thumbnail: None,
            page_url: None,
            stream_url: format!("stream://{}", query),
        })
    }
}

/// Sesión de voz en memoria. Detener el stream dispara su gancho, igual que
/// el evento `End` de Songbird.
#[derive(Default)]
pub struct FakeVoice {
    hooks: Mutex<Vec<CompletionHook>>,
    played: Mutex<Vec<String>>,
    pub fail_play: AtomicBool,
    pub disconnected: AtomicBool,
    paused: AtomicBool,
    pause_calls: AtomicUsize,
    resume_calls: AtomicUsize,
}

impl FakeVoice {
    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }

    /// Cambia la pausa del stream sin pasar por el controlador
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Llamadas a `pause` y `resume` recibidas hasta ahora
    pub fn pause_resume_calls(&self) -> (usize, usize) {
        (
            self.pause_calls.load(Ordering::SeqCst),
            self.resume_calls.load(Ordering::SeqCst),
        )
    }

    /// Simula el fin natural del stream actual
    pub fn finish_current(&self, error: Option<String>) {
        let hook = self.hooks.lock().last().cloned();
        if let Some(hook) = hook {
            hook.complete(error);
        }
    }
}

#[async_trait]
impl VoiceSession for FakeVoice {
    async fn play(&self, stream_url: &str, hook: CompletionHook) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            anyhow::bail!("fallo de voz simulado");
        }
        self.played.lock().push(stream_url.to_string());
        self.hooks.lock().push(hook);
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.finish_current(None);
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        !self.hooks.lock().is_empty() && !self.paused.load(Ordering::SeqCst)
    }

    async fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier que guarda todo lo que recibe
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    retired: Mutex<Vec<(MessageId, Retirement)>>,
    refreshed: Mutex<Vec<ControlSet>>,
    next_id: AtomicU64,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn retired(&self) -> Vec<(MessageId, Retirement)> {
        self.retired.lock().clone()
    }

    pub fn refreshed(&self) -> Vec<ControlSet> {
        self.refreshed.lock().clone()
    }

    pub fn now_playing_titles(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter_map(|notice| match notice {
                Notice::NowPlaying { track, .. } => Some(track.title.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _channel: ChannelId, notice: Notice) -> Result<Option<MessageId>> {
        self.notices.lock().push(notice);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(MessageId::new(id)))
    }

    async fn retire(&self, _channel: ChannelId, message: MessageId, how: Retirement) -> Result<()> {
        self.retired.lock().push((message, how));
        Ok(())
    }

    async fn refresh_controls(
        &self,
        _channel: ChannelId,
        _message: MessageId,
        controls: ControlSet,
    ) -> Result<()> {
        self.refreshed.lock().push(controls);
        Ok(())
    }
}
