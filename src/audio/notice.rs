use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, MessageId};

use super::{controls::ControlSet, track::NowPlaying};

/// Cantidad de pistas listadas en el resumen de encolado
pub const SUMMARY_PREVIEW: usize = 10;

/// Resumen de lo que se agregó a la cola
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedSummary {
    /// "Album: X" / "Playlist: Y" cuando viene de un enlace múltiple
    pub batch_label: Option<String>,
    pub thumbnail: Option<String>,
    /// Pistas aceptadas en la cola, incluida la que arranca ya
    pub queued: usize,
    /// Primeras pistas que esperan turno
    pub preview: Vec<String>,
    /// Pistas que esperan turno y no entran en `preview`
    pub more: usize,
    /// Pistas descartadas por la cola llena
    pub dropped: usize,
    pub queue_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedReason {
    QueueEmpty,
    /// La pista anterior no da para buscar algo relacionado
    AutoplaySeedUnavailable,
    AutoplayFailed,
}

/// Avisos que el controlador publica en el canal de la guild
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NowPlaying {
        track: Box<NowPlaying>,
        controls: ControlSet,
    },
    Queued(QueuedSummary),
    AutoplaySearching {
        seed: String,
    },
    ResolutionFailed {
        label: String,
        reason: String,
    },
    PlaybackError {
        reason: String,
    },
    Exhausted(ExhaustedReason),
    Warning(String),
}

/// Cómo se despide un mensaje de "Now Playing"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retirement {
    /// Empezó otra pista: solo se quitan los controles
    Superseded,
    /// El usuario detuvo la reproducción
    Stopped,
}

/// Capa de presentación vista desde el controlador.
///
/// Los errores que devuelve se registran y nunca alteran la reproducción.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel: ChannelId, notice: Notice) -> Result<Option<MessageId>>;

    async fn retire(&self, channel: ChannelId, message: MessageId, how: Retirement) -> Result<()>;

    async fn refresh_controls(
        &self,
        channel: ChannelId,
        message: MessageId,
        controls: ControlSet,
    ) -> Result<()>;
}
