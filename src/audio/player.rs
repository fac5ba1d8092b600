use anyhow::Result;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use super::{
    controls::{self, ControlSet, FeatureSet},
    notice::{ExhaustedReason, Notice, Notifier, QueuedSummary, Retirement, SUMMARY_PREVIEW},
    state::{GuildPlaybackState, GuildRegistry, GuildSlot, MessageRef, PlaybackPhase},
    track::{NowPlaying, QueueItem, TrackDescriptor},
    voice::{CompletionHook, TrackCompletion, VoiceSession},
};
use crate::sources::{BatchInfo, MediaBackend};

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub max_queue_size: usize,
    /// Pausa entre detener el stream y salir del canal de voz
    pub disconnect_grace: Duration,
    pub features: FeatureSet,
}

/// Qué provocó un avance de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    PlayRequest,
    Replay,
    TrackFinished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Started { title: String },
    Exhausted(ExhaustedReason),
    /// La guild se detuvo mientras se resolvía la pista
    Discarded,
    /// Ya hay una reproducción en curso
    Busy,
    NoSession,
}

/// Resultado de una acción de control (comando o botón)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Paused,
    Resumed,
    Skipped { title: String },
    Stopped,
    Replaying,
    Autoplay(bool),
    NothingPlaying,
    NotPaused,
    NothingToReplay,
    NotConnected,
    FeatureDisabled,
}

/// Petición de reproducción ya resuelta en descriptores
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub requested_by: UserId,
    pub descriptors: Vec<TrackDescriptor>,
    pub batch: Option<BatchInfo>,
    /// Aviso del resolvedor (p. ej. enlace de Spotify buscado como texto)
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub queued: usize,
    /// Pistas que no entraron por el límite de la cola
    pub dropped: usize,
    pub advance: Option<AdvanceOutcome>,
}

/// Vista de la cola para el comando `queue`
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub now_playing: Option<NowPlaying>,
    pub paused: bool,
    pub upcoming: Vec<String>,
    pub total: usize,
    pub autoplay: bool,
}

struct Candidate {
    item: QueueItem,
    /// Etiqueta de la pista semilla cuando el candidato sale del autoplay
    autoplay_seed: Option<String>,
    generation: u64,
}

enum NextStep {
    Candidate(Candidate),
    Exhausted(ExhaustedReason),
    NoSession,
}

enum Attempt {
    Started(String),
    Failed,
    AutoplayFailed,
    Discarded,
}

/// Máquina de estados de reproducción de todas las guilds.
///
/// Toda transición de reproducción pasa por `advance` bajo el lock de avance
/// de la guild. Los controles solo mutan la cola o detienen el stream; el
/// gancho de finalización se encarga de volver a entrar en `advance`.
pub struct PlaybackController {
    registry: GuildRegistry,
    backend: Arc<dyn MediaBackend>,
    notifier: Arc<dyn Notifier>,
    settings: PlayerSettings,
    completions: mpsc::UnboundedSender<TrackCompletion>,
}

impl PlaybackController {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        notifier: Arc<dyn Notifier>,
        settings: PlayerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<TrackCompletion>) {
        let (completions, rx) = mpsc::unbounded_channel();
        let controller = Self {
            registry: GuildRegistry::new(settings.max_queue_size),
            backend,
            notifier,
            settings,
            completions,
        };
        (controller, rx)
    }

    /// Consume las finalizaciones que envían los ganchos de audio
    pub fn spawn_completion_loop(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<TrackCompletion>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(completion) = rx.recv().await {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.on_track_complete(completion).await;
                });
            }
            debug!("📪 Canal de finalizaciones cerrado");
        })
    }

    /// Asocia la sesión de voz recién conectada a la guild
    pub fn attach_session(
        &self,
        guild_id: GuildId,
        session: Arc<dyn VoiceSession>,
        announce_channel: Option<ChannelId>,
    ) {
        let slot = self.registry.get_or_create(guild_id);
        let mut state = slot.state.lock();
        state.voice = Some(session);
        if announce_channel.is_some() {
            state.announce_channel = announce_channel;
        }
        info!("🔗 Sesión de voz asociada a guild {}", guild_id);
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.registry
            .get(guild_id)
            .is_some_and(|slot| slot.state.lock().voice.is_some())
    }

    /// Encola las pistas de una petición y arranca la reproducción si la
    /// guild estaba libre
    pub async fn enqueue(&self, request: PlayRequest) -> EnqueueOutcome {
        let guild_id = request.guild_id;
        let slot = self.registry.get_or_create(guild_id);

        if let Some(text) = request.warning {
            self.announce(Some(request.channel_id), Notice::Warning(text))
                .await;
        }

        let (queued, dropped, mut waiting, queue_len) = {
            let mut state = slot.state.lock();
            state.announce_channel = Some(request.channel_id);
            let starts_now = state.phase == PlaybackPhase::Idle && state.queue.peek_is_empty();

            let mut queued = 0;
            let mut dropped = 0;
            let mut waiting = Vec::new();
            for descriptor in request.descriptors {
                let label = descriptor.label();
                match state.queue.enqueue(QueueItem::new(descriptor, request.requested_by)) {
                    Ok(()) => {
                        queued += 1;
                        if !(starts_now && queued == 1) {
                            waiting.push(label);
                        }
                    }
                    Err(_) => dropped += 1,
                }
            }
            (queued, dropped, waiting, state.queue.len())
        };

        if dropped > 0 {
            warn!(
                "⚠️ Cola llena en guild {}: {} canciones descartadas",
                guild_id, dropped
            );
        }

        let has_batch = request.batch.is_some() && queued > 0;
        if !waiting.is_empty() || dropped > 0 || has_batch {
            let more = waiting.len().saturating_sub(SUMMARY_PREVIEW);
            waiting.truncate(SUMMARY_PREVIEW);
            let (batch_label, thumbnail) = match request.batch {
                Some(batch) => (Some(batch.label), batch.thumbnail),
                None => (None, None),
            };
            let summary = QueuedSummary {
                batch_label,
                thumbnail,
                queued,
                preview: waiting,
                more,
                dropped,
                queue_len,
            };
            self.announce(Some(request.channel_id), Notice::Queued(summary))
                .await;
        }

        let advance = if queued > 0 {
            Some(self.advance(guild_id, AdvanceTrigger::PlayRequest).await)
        } else {
            None
        };

        EnqueueOutcome {
            queued,
            dropped,
            advance,
        }
    }

    /// Punto de entrada único para pasar a la siguiente pista
    pub async fn advance(&self, guild_id: GuildId, trigger: AdvanceTrigger) -> AdvanceOutcome {
        let Some(slot) = self.registry.get(guild_id) else {
            debug!("Sin estado para guild {}, nada que avanzar", guild_id);
            return AdvanceOutcome::NoSession;
        };

        let _guard = slot.advance_lock.lock().await;

        if trigger != AdvanceTrigger::TrackFinished {
            let phase = slot.state.lock().phase;
            if phase != PlaybackPhase::Idle {
                debug!(
                    "⏳ Guild {} ocupada ({:?}), se ignora {:?}",
                    guild_id, phase, trigger
                );
                return AdvanceOutcome::Busy;
            }
        }

        self.run_advance(guild_id, &slot).await
    }

    /// Recorre candidatos hasta arrancar uno o agotar la cola.
    /// Debe llamarse con el lock de avance tomado.
    async fn run_advance(&self, guild_id: GuildId, slot: &GuildSlot) -> AdvanceOutcome {
        loop {
            let (previous, channel) = {
                let mut state = slot.state.lock();
                (state.now_playing_message.take(), state.announce_channel)
            };
            if let Some(message) = previous {
                self.retire(message, Retirement::Superseded).await;
            }

            let step = {
                let mut state = slot.state.lock();
                next_candidate(&mut state)
            };

            let candidate = match step {
                NextStep::Candidate(candidate) => candidate,
                NextStep::NoSession => {
                    debug!("🔇 Guild {} sin sesión de voz", guild_id);
                    return AdvanceOutcome::NoSession;
                }
                NextStep::Exhausted(reason) => {
                    info!("📭 Cola terminada en guild {} ({:?})", guild_id, reason);
                    self.announce(channel, Notice::Exhausted(reason)).await;
                    return AdvanceOutcome::Exhausted(reason);
                }
            };

            if let Some(seed) = &candidate.autoplay_seed {
                info!("🔁 Autoplay en guild {}: buscando algo como {}", guild_id, seed);
                self.announce(channel, Notice::AutoplaySearching { seed: seed.clone() })
                    .await;
            }

            match self.start(guild_id, slot, candidate).await {
                Attempt::Started(title) => return AdvanceOutcome::Started { title },
                Attempt::Discarded => return AdvanceOutcome::Discarded,
                Attempt::Failed => continue,
                Attempt::AutoplayFailed => {
                    let reason = ExhaustedReason::AutoplayFailed;
                    self.announce(channel, Notice::Exhausted(reason)).await;
                    return AdvanceOutcome::Exhausted(reason);
                }
            }
        }
    }

    async fn start(&self, guild_id: GuildId, slot: &GuildSlot, candidate: Candidate) -> Attempt {
        let label = candidate.item.descriptor.label();
        debug!("🔍 Resolviendo '{}' para guild {}", label, guild_id);

        let resolved = match self.backend.resolve(&candidate.item.descriptor).await {
            Ok(resolved) => resolved,
            Err(e) => {
                return self
                    .fail(slot, &candidate, candidate.generation, e.to_string())
                    .await
            }
        };

        let started = {
            let mut state = slot.state.lock();
            match state.voice.clone() {
                Some(voice) if state.generation == candidate.generation => {
                    Some((voice, state.bump_generation()))
                }
                _ => None,
            }
        };
        let Some((voice, generation)) = started else {
            debug!(
                "🗑️ Resolución de '{}' descartada: guild {} detenida",
                label, guild_id
            );
            return Attempt::Discarded;
        };

        let hook = CompletionHook::new(guild_id, generation, self.completions.clone());
        if let Err(e) = voice.play(&resolved.stream_url, hook).await {
            return self
                .fail(slot, &candidate, generation, format!("{:#}", e))
                .await;
        }

        let now_playing = NowPlaying::new(candidate.item.clone(), resolved);
        let title = now_playing.title.clone();

        let announced = {
            let mut state = slot.state.lock();
            if state.generation != generation {
                None
            } else {
                state.phase = PlaybackPhase::Playing;
                state.now_playing = Some(now_playing.clone());
                state.last_played = Some(candidate.item);
                Some((
                    controls::render(&state, self.settings.features),
                    state.announce_channel,
                ))
            }
        };
        let Some((controls, channel)) = announced else {
            debug!("🗑️ Guild {} detenida al arrancar '{}'", guild_id, title);
            return Attempt::Discarded;
        };

        info!("🎵 Reproduciendo: {} en guild {}", title, guild_id);

        let notice = Notice::NowPlaying {
            track: Box::new(now_playing),
            controls,
        };
        if let (Some(channel_id), Some(message_id)) = (channel, self.announce(channel, notice).await) {
            let message = MessageRef {
                channel_id,
                message_id,
            };
            let current = {
                let mut state = slot.state.lock();
                let current = state.generation == generation;
                if current {
                    state.now_playing_message = Some(message);
                }
                current
            };
            if !current {
                self.retire(message, Retirement::Superseded).await;
            }
        }

        Attempt::Started(title)
    }

    async fn fail(
        &self,
        slot: &GuildSlot,
        candidate: &Candidate,
        generation: u64,
        reason: String,
    ) -> Attempt {
        let label = candidate.item.descriptor.label();

        let channel = {
            let mut state = slot.state.lock();
            if state.generation != generation {
                None
            } else {
                if candidate.autoplay_seed.is_some() {
                    state.phase = PlaybackPhase::Idle;
                    state.now_playing = None;
                }
                Some(state.announce_channel)
            }
        };
        let Some(channel) = channel else {
            debug!("🗑️ Fallo de '{}' ignorado: guild detenida", label);
            return Attempt::Discarded;
        };

        warn!("⚠️ No se pudo reproducir '{}': {}", label, reason);
        self.announce(channel, Notice::ResolutionFailed { label, reason })
            .await;

        if candidate.autoplay_seed.is_some() {
            Attempt::AutoplayFailed
        } else {
            Attempt::Failed
        }
    }

    /// Procesa el aviso de fin de stream. Devuelve el avance resultante, o
    /// `None` si el aviso era obsoleto.
    pub async fn on_track_complete(&self, completion: TrackCompletion) -> Option<AdvanceOutcome> {
        let guild_id = completion.guild_id;
        let Some(slot) = self.registry.get(guild_id) else {
            debug!("🗑️ Finalización para guild {} sin estado, ignorada", guild_id);
            return None;
        };

        let _guard = slot.advance_lock.lock().await;

        let channel = {
            let mut state = slot.state.lock();
            if state.generation != completion.generation || !state.phase.is_active() {
                debug!(
                    "🗑️ Finalización obsoleta en guild {} (gen {} vs {})",
                    guild_id, completion.generation, state.generation
                );
                return None;
            }
            state.phase = PlaybackPhase::Idle;
            state.announce_channel
        };

        if let Some(reason) = completion.error {
            warn!("⚠️ Error de reproducción en guild {}: {}", guild_id, reason);
            self.announce(channel, Notice::PlaybackError { reason }).await;
        }

        Some(self.run_advance(guild_id, &slot).await)
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let voice = {
            let state = slot.state.lock();
            let Some(voice) = state.voice.clone() else {
                return Ok(ControlOutcome::NotConnected);
            };
            if state.phase != PlaybackPhase::Playing {
                return Ok(ControlOutcome::NothingPlaying);
            }
            voice
        };

        if voice.is_paused().await {
            debug!("⏸️ El stream de guild {} ya estaba en pausa", guild_id);
        } else {
            voice.pause().await?;
        }
        {
            let mut state = slot.state.lock();
            if state.phase == PlaybackPhase::Playing {
                state.phase = PlaybackPhase::Paused;
            }
        }
        self.refresh_controls(&slot).await;
        Ok(ControlOutcome::Paused)
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let voice = {
            let state = slot.state.lock();
            let Some(voice) = state.voice.clone() else {
                return Ok(ControlOutcome::NotConnected);
            };
            if state.phase != PlaybackPhase::Paused {
                return Ok(ControlOutcome::NotPaused);
            }
            voice
        };

        if voice.is_playing().await {
            debug!("▶️ El stream de guild {} ya estaba sonando", guild_id);
        } else {
            voice.resume().await?;
        }
        {
            let mut state = slot.state.lock();
            if state.phase == PlaybackPhase::Paused {
                state.phase = PlaybackPhase::Playing;
            }
        }
        self.refresh_controls(&slot).await;
        Ok(ControlOutcome::Resumed)
    }

    /// Pausa o reanuda según el estado actual (botón de pausa)
    pub async fn toggle_pause(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        let phase = self.registry.get(guild_id).map(|slot| slot.state.lock().phase);

        match phase {
            None => Ok(ControlOutcome::NotConnected),
            Some(PlaybackPhase::Paused) => self.resume(guild_id).await,
            Some(PlaybackPhase::Playing) => self.pause(guild_id).await,
            Some(_) => Ok(ControlOutcome::NothingPlaying),
        }
    }

    /// Detiene el stream actual; el gancho de finalización avanza la cola
    pub async fn skip(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let (voice, title) = {
            let state = slot.state.lock();
            let Some(voice) = state.voice.clone() else {
                return Ok(ControlOutcome::NotConnected);
            };
            if !state.phase.is_active() {
                return Ok(ControlOutcome::NothingPlaying);
            }
            let title = state
                .now_playing
                .as_ref()
                .map(|np| np.title.clone())
                .unwrap_or_else(|| "Canción actual".to_string());
            (voice, title)
        };

        voice.stop().await?;
        info!("⏭️ Saltando: {} en guild {}", title, guild_id);
        Ok(ControlOutcome::Skipped { title })
    }

    /// Vacía todo, sale del canal de voz y olvida la guild
    pub async fn stop(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let (voice, message) = {
            let mut state = slot.state.lock();
            let message = state.reset();
            (state.voice.take(), message)
        };

        if let Some(message) = message {
            self.retire(message, Retirement::Stopped).await;
        }

        let Some(voice) = voice else {
            self.registry.remove_slot(guild_id, &slot);
            return Ok(ControlOutcome::NotConnected);
        };

        if let Err(e) = voice.stop().await {
            warn!("⚠️ Error al detener el stream en guild {}: {:?}", guild_id, e);
        }

        tokio::time::sleep(self.settings.disconnect_grace).await;

        // Alguien volvió a conectar el bot durante la espera: la llamada de
        // Songbird es la misma, así que desconectar cortaría la nueva pista
        if self.has_session(guild_id) {
            info!(
                "🔁 Guild {} volvió a conectarse antes de salir; se conserva la sesión",
                guild_id
            );
            return Ok(ControlOutcome::Stopped);
        }

        if let Err(e) = voice.disconnect().await {
            warn!("⚠️ Error al desconectar en guild {}: {:?}", guild_id, e);
        }
        self.registry.remove_slot(guild_id, &slot);

        info!("⏹️ Reproducción detenida en guild {}", guild_id);
        Ok(ControlOutcome::Stopped)
    }

    /// El bot quedó fuera del canal de voz sin pasar por `stop`
    pub async fn teardown(&self, guild_id: GuildId) {
        let Some(slot) = self.registry.remove(guild_id) else {
            return;
        };

        let message = {
            let mut state = slot.state.lock();
            let message = state.reset();
            state.voice = None;
            message
        };

        if let Some(message) = message {
            self.retire(message, Retirement::Stopped).await;
        }
        info!("🔌 Estado de guild {} descartado tras desconexión", guild_id);
    }

    /// Vuelve a poner la última pista al frente de la cola
    pub async fn replay(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        if !self.settings.features.replay {
            return Ok(ControlOutcome::FeatureDisabled);
        }
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let (voice, active) = {
            let mut state = slot.state.lock();
            let Some(last) = state.last_played.clone() else {
                return Ok(ControlOutcome::NothingToReplay);
            };
            let Some(voice) = state.voice.clone() else {
                return Ok(ControlOutcome::NotConnected);
            };

            let active = state.phase.is_active();
            if active {
                let current = state.now_playing.as_ref().map(|np| np.item.clone());
                if let Some(current) = current.filter(|item| *item != last) {
                    state.queue.insert_front(current);
                }
            }
            state.queue.insert_front(last);
            (voice, active)
        };

        info!("⏪ Repitiendo última canción en guild {}", guild_id);
        if active {
            voice.stop().await?;
        } else {
            let outcome = self.advance(guild_id, AdvanceTrigger::Replay).await;
            debug!("Replay en guild {}: {:?}", guild_id, outcome);
        }
        Ok(ControlOutcome::Replaying)
    }

    pub async fn toggle_autoplay(&self, guild_id: GuildId) -> Result<ControlOutcome> {
        if !self.settings.features.autoplay {
            return Ok(ControlOutcome::FeatureDisabled);
        }
        let Some(slot) = self.registry.get(guild_id) else {
            return Ok(ControlOutcome::NotConnected);
        };

        let enabled = {
            let mut state = slot.state.lock();
            state.autoplay_enabled = !state.autoplay_enabled;
            state.autoplay_enabled
        };

        info!(
            "🔁 Autoplay {} en guild {}",
            if enabled { "activado" } else { "desactivado" },
            guild_id
        );
        self.refresh_controls(&slot).await;
        Ok(ControlOutcome::Autoplay(enabled))
    }

    /// Quita las pistas pendientes sin tocar la actual
    pub fn clear_queue(&self, guild_id: GuildId) -> usize {
        self.registry.clear(guild_id)
    }

    pub fn snapshot(&self, guild_id: GuildId) -> Option<QueueSnapshot> {
        let slot = self.registry.get(guild_id)?;
        let state = slot.state.lock();

        Some(QueueSnapshot {
            now_playing: state.now_playing.clone(),
            paused: state.phase == PlaybackPhase::Paused,
            upcoming: state
                .queue
                .iter()
                .take(SUMMARY_PREVIEW)
                .map(|item| item.descriptor.label())
                .collect(),
            total: state.queue.len(),
            autoplay: state.autoplay_enabled,
        })
    }

    pub fn controls(&self, guild_id: GuildId) -> Option<ControlSet> {
        let slot = self.registry.get(guild_id)?;
        let state = slot.state.lock();
        Some(controls::render(&state, self.settings.features))
    }

    /// Quien pidió la canción que está sonando
    pub fn requester(&self, guild_id: GuildId) -> Option<UserId> {
        let slot = self.registry.get(guild_id)?;
        let state = slot.state.lock();
        state.now_playing.as_ref().map(NowPlaying::requested_by)
    }

    pub fn active_guilds(&self) -> usize {
        self.registry.active_guilds()
    }

    async fn refresh_controls(&self, slot: &GuildSlot) {
        let (message, controls) = {
            let state = slot.state.lock();
            (
                state.now_playing_message,
                controls::render(&state, self.settings.features),
            )
        };

        if let Some(message) = message {
            if let Err(e) = self
                .notifier
                .refresh_controls(message.channel_id, message.message_id, controls)
                .await
            {
                warn!("⚠️ No se pudieron actualizar los controles: {:?}", e);
            }
        }
    }

    async fn announce(&self, channel: Option<ChannelId>, notice: Notice) -> Option<MessageId> {
        let channel = channel?;
        match self.notifier.notify(channel, notice).await {
            Ok(message) => message,
            Err(e) => {
                warn!("⚠️ No se pudo enviar aviso al canal {}: {:?}", channel, e);
                None
            }
        }
    }

    async fn retire(&self, message: MessageRef, how: Retirement) {
        if let Err(e) = self
            .notifier
            .retire(message.channel_id, message.message_id, how)
            .await
        {
            debug!("No se pudo retirar el mensaje {}: {:?}", message.message_id, e);
        }
    }
}

/// Elige el siguiente candidato y deja la fase acorde
fn next_candidate(state: &mut GuildPlaybackState) -> NextStep {
    if state.voice.is_none() {
        state.now_playing = None;
        state.phase = PlaybackPhase::Idle;
        return NextStep::NoSession;
    }

    if let Some(item) = state.queue.dequeue_front() {
        state.phase = PlaybackPhase::Resolving;
        return NextStep::Candidate(Candidate {
            item,
            autoplay_seed: None,
            generation: state.generation,
        });
    }

    let seed = if state.autoplay_enabled {
        state.last_played.as_ref().map(|last| {
            (
                last.descriptor.autoplay_query(),
                last.descriptor.label(),
                last.requested_by,
            )
        })
    } else {
        None
    };

    state.now_playing = None;
    match seed {
        Some((Some(query), label, requested_by)) => {
            state.phase = PlaybackPhase::Resolving;
            NextStep::Candidate(Candidate {
                item: QueueItem::new(TrackDescriptor::Query(query), requested_by),
                autoplay_seed: Some(label),
                generation: state.generation,
            })
        }
        Some((None, _, _)) => {
            state.phase = PlaybackPhase::Idle;
            NextStep::Exhausted(ExhaustedReason::AutoplaySeedUnavailable)
        }
        None => {
            state.phase = PlaybackPhase::Idle;
            NextStep::Exhausted(ExhaustedReason::QueueEmpty)
        }
    }
}
