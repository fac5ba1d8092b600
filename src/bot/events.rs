use serenity::async_trait;
use songbird::{Event as VoiceEvent, EventContext, EventHandler as VoiceEventHandler};
use tracing::{error, info};

use crate::audio::voice::CompletionHook;

/// Handler para el fin natural (o forzado) de un track
pub struct TrackEndNotifier {
    pub hook: CompletionHook,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<VoiceEvent> {
        info!("🎵 Track terminó (generación {})", self.hook.generation());
        self.hook.complete(None);
        None
    }
}

/// Handler para errores de tracks
pub struct TrackErrorNotifier {
    pub hook: CompletionHook,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<VoiceEvent> {
        let mut reason = String::from("error desconocido del reproductor");

        if let EventContext::Track(track_list) = ctx {
            for (state, _handle) in *track_list {
                error!("❌ Error en track: {:?}", state.playing);
                reason = format!("{:?}", state.playing);
            }
        }

        self.hook.complete(Some(reason));
        None
    }
}
