use dashmap::DashMap;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info};

use super::{
    queue::TrackQueue,
    track::{NowPlaying, QueueItem},
    voice::VoiceSession,
};

/// Fase del ciclo de reproducción de una guild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Resolving,
    Playing,
    Paused,
}

impl PlaybackPhase {
    /// Hay un stream cargado en la sesión de voz
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Referencia al último mensaje de "Now Playing"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Estado de reproducción de una guild.
///
/// Nunca se mantiene bloqueado a través de un `.await`: quien necesita la
/// sesión de voz clona el `Arc` y suelta el lock antes de llamarla.
pub struct GuildPlaybackState {
    pub queue: TrackQueue,
    pub now_playing: Option<NowPlaying>,
    /// Último item que arrancó con éxito (historial de profundidad 1)
    pub last_played: Option<QueueItem>,
    pub autoplay_enabled: bool,
    pub now_playing_message: Option<MessageRef>,
    /// Canal de texto donde se publican los avisos de la guild
    pub announce_channel: Option<ChannelId>,
    pub phase: PlaybackPhase,
    pub generation: u64,
    pub voice: Option<Arc<dyn VoiceSession>>,
    generations: Arc<AtomicU64>,
}

impl GuildPlaybackState {
    fn new(max_queue_size: usize, generations: Arc<AtomicU64>) -> Self {
        let generation = generations.load(Ordering::SeqCst);
        Self {
            queue: TrackQueue::new(max_queue_size),
            now_playing: None,
            last_played: None,
            autoplay_enabled: false,
            now_playing_message: None,
            announce_channel: None,
            phase: PlaybackPhase::Idle,
            generation,
            voice: None,
            generations,
        }
    }

    /// Invalida cualquier stream o resolución en curso.
    ///
    /// El contador es compartido por todo el registro, así que una guild
    /// recreada nunca reutiliza una generación de su vida anterior.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        self.generation
    }

    /// Deja la guild como recién creada (salvo la sesión de voz) e invalida
    /// lo que esté en vuelo. Devuelve el mensaje de "Now Playing" pendiente.
    pub fn reset(&mut self) -> Option<MessageRef> {
        self.queue.clear();
        self.now_playing = None;
        self.last_played = None;
        self.autoplay_enabled = false;
        self.phase = PlaybackPhase::Idle;
        self.bump_generation();
        self.now_playing_message.take()
    }
}

/// Entrada del registro: estado más el lock de avance de la guild
pub struct GuildSlot {
    pub state: Mutex<GuildPlaybackState>,
    /// Garantiza un solo intento de reproducción activo por guild
    pub advance_lock: tokio::sync::Mutex<()>,
}

/// Registro de estados por guild
pub struct GuildRegistry {
    slots: DashMap<GuildId, Arc<GuildSlot>>,
    max_queue_size: usize,
    generations: Arc<AtomicU64>,
}

impl GuildRegistry {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            slots: DashMap::new(),
            max_queue_size,
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<GuildSlot>> {
        self.slots.get(&guild_id).map(|slot| slot.clone())
    }

    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<GuildSlot> {
        self.slots
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("🆕 Estado creado para guild {}", guild_id);
                Arc::new(GuildSlot {
                    state: Mutex::new(GuildPlaybackState::new(
                        self.max_queue_size,
                        self.generations.clone(),
                    )),
                    advance_lock: tokio::sync::Mutex::new(()),
                })
            })
            .clone()
    }

    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<GuildSlot>> {
        let removed = self.slots.remove(&guild_id).map(|(_, slot)| slot);
        if removed.is_some() {
            info!("🧹 Estado eliminado para guild {}", guild_id);
        }
        removed
    }

    /// Quita la guild solo si sigue siendo la misma entrada
    pub fn remove_slot(&self, guild_id: GuildId, slot: &Arc<GuildSlot>) {
        if self
            .slots
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, slot))
            .is_some()
        {
            info!("🧹 Estado eliminado para guild {}", guild_id);
        }
    }

    pub fn active_guilds(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&self, guild_id: GuildId) -> usize {
        self.get(guild_id)
            .map(|slot| slot.state.lock().queue.clear())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::TrackDescriptor;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;

    fn item(raw: &str) -> QueueItem {
        QueueItem::new(TrackDescriptor::Query(raw.to_string()), UserId::new(1))
    }

    #[test]
    fn guilds_are_isolated() {
        let registry = GuildRegistry::new(10);
        let a = GuildId::new(1);
        let b = GuildId::new(2);

        for raw in ["a1", "a2"] {
            registry.get_or_create(a).state.lock().queue.enqueue(item(raw)).unwrap();
        }
        registry.get_or_create(b).state.lock().queue.enqueue(item("b1")).unwrap();

        let slot_b = registry.get(b).unwrap();
        assert_eq!(slot_b.state.lock().queue.dequeue_front(), Some(item("b1")));
        assert!(slot_b.state.lock().queue.peek_is_empty());
        assert_eq!(registry.clear(a), 2);
        assert_eq!(registry.active_guilds(), 2);
    }

    #[test]
    fn missing_guild_behaves_as_empty() {
        let registry = GuildRegistry::new(10);
        let guild = GuildId::new(9);

        assert!(registry.get(guild).is_none());
        assert_eq!(registry.clear(guild), 0);
        assert_eq!(registry.active_guilds(), 0);
    }

    #[test]
    fn stale_slot_is_not_removed() {
        let registry = GuildRegistry::new(10);
        let guild = GuildId::new(3);

        let old = registry.get_or_create(guild);
        registry.remove(guild);
        let current = registry.get_or_create(guild);

        registry.remove_slot(guild, &old);
        assert!(registry.get(guild).is_some_and(|slot| Arc::ptr_eq(&slot, &current)));

        registry.remove_slot(guild, &current);
        assert!(registry.get(guild).is_none());
    }

    #[test]
    fn recreated_guild_never_reuses_a_generation() {
        let registry = GuildRegistry::new(10);
        let guild = GuildId::new(4);

        let old = {
            let slot = registry.get_or_create(guild);
            let mut state = slot.state.lock();
            state.bump_generation();
            state.bump_generation()
        };
        registry.remove(guild);

        let slot = registry.get_or_create(guild);
        let mut state = slot.state.lock();
        assert!(state.bump_generation() > old);
    }

    #[test]
    fn reset_clears_everything_but_the_session() {
        let registry = GuildRegistry::new(10);
        let guild = GuildId::new(5);

        let slot = registry.get_or_create(guild);
        let mut state = slot.state.lock();
        state.queue.enqueue(item("a")).unwrap();
        state.last_played = Some(item("b"));
        state.autoplay_enabled = true;
        state.phase = PlaybackPhase::Playing;
        state.now_playing_message = Some(MessageRef {
            channel_id: ChannelId::new(10),
            message_id: MessageId::new(11),
        });
        let before = state.generation;

        let message = state.reset();

        assert!(message.is_some());
        assert!(state.queue.peek_is_empty());
        assert_eq!(state.last_played, None);
        assert!(!state.autoplay_enabled);
        assert_eq!(state.phase, PlaybackPhase::Idle);
        assert!(state.generation > before);
        assert_eq!(state.now_playing_message, None);
    }
}
