use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    all::Http,
    builder::{CreateActionRow, CreateEmbed, CreateMessage, EditMessage},
    model::id::{ChannelId, MessageId},
};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use super::{buttons::control_rows, embeds};
use crate::audio::{
    controls::ControlSet,
    notice::{Notice, Notifier, Retirement},
};

/// Tiempo que sobrevive el aviso de "buscando autoplay"
const AUTOPLAY_NOTICE_TTL: Duration = Duration::from_secs(10);

/// Publica los avisos del reproductor como embeds en Discord
pub struct DiscordNotifier {
    http: Arc<Http>,
    footer: String,
}

struct Rendered {
    embed: CreateEmbed,
    components: Vec<CreateActionRow>,
    delete_after: Option<Duration>,
}

impl Rendered {
    fn plain(embed: CreateEmbed) -> Self {
        Self {
            embed,
            components: Vec::new(),
            delete_after: None,
        }
    }
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>, footer: impl Into<String>) -> Self {
        Self {
            http,
            footer: footer.into(),
        }
    }

    fn render(&self, notice: Notice) -> Rendered {
        let footer = self.footer.as_str();
        match notice {
            Notice::NowPlaying { track, controls } => Rendered {
                embed: embeds::now_playing_embed(&track, footer),
                components: control_rows(&controls),
                delete_after: None,
            },
            Notice::Queued(summary) => Rendered::plain(embeds::queued_embed(&summary, footer)),
            Notice::AutoplaySearching { seed } => Rendered {
                embed: embeds::autoplay_embed(&seed, footer),
                components: Vec::new(),
                delete_after: Some(AUTOPLAY_NOTICE_TTL),
            },
            Notice::ResolutionFailed { label, reason } => {
                Rendered::plain(embeds::resolution_failed_embed(&label, &reason, footer))
            }
            Notice::PlaybackError { reason } => {
                Rendered::plain(embeds::playback_error_embed(&reason, footer))
            }
            Notice::Exhausted(reason) => Rendered::plain(embeds::exhausted_embed(reason, footer)),
            Notice::Warning(text) => Rendered::plain(embeds::warning_embed(&text, footer)),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, channel: ChannelId, notice: Notice) -> Result<Option<MessageId>> {
        let rendered = self.render(notice);

        let mut message = CreateMessage::new().embed(rendered.embed);
        if !rendered.components.is_empty() {
            message = message.components(rendered.components);
        }

        let sent = channel.send_message(self.http.as_ref(), message).await?;

        if let Some(ttl) = rendered.delete_after {
            let http = self.http.clone();
            let message_id = sent.id;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Err(e) = channel.delete_message(&http, message_id).await {
                    debug!("🧹 No se pudo borrar el aviso temporal: {:?}", e);
                }
            });
        }

        Ok(Some(sent.id))
    }

    async fn retire(&self, channel: ChannelId, message: MessageId, how: Retirement) -> Result<()> {
        let edit = match how {
            Retirement::Superseded => EditMessage::new().components(Vec::new()),
            Retirement::Stopped => EditMessage::new()
                .embed(embeds::stopped_embed(&self.footer))
                .components(Vec::new()),
        };

        channel.edit_message(self.http.as_ref(), message, edit).await?;
        Ok(())
    }

    async fn refresh_controls(
        &self,
        channel: ChannelId,
        message: MessageId,
        controls: ControlSet,
    ) -> Result<()> {
        let edit = EditMessage::new().components(control_rows(&controls));
        channel.edit_message(self.http.as_ref(), message, edit).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        controls::ControlButton,
        notice::ExhaustedReason,
        track::{NowPlaying, QueueItem, ResolvedTrack, TrackDescriptor},
    };
    use serenity::model::id::UserId;

    fn notifier() -> DiscordNotifier {
        DiscordNotifier::new(Arc::new(Http::new("")), "Guild Jukebox")
    }

    fn control(label: &'static str) -> ControlButton {
        ControlButton {
            label,
            disabled: false,
            active: false,
        }
    }

    #[test]
    fn autoplay_notice_is_temporary() {
        let rendered = notifier().render(Notice::AutoplaySearching {
            seed: "Artist - Song".to_string(),
        });
        assert_eq!(rendered.delete_after, Some(AUTOPLAY_NOTICE_TTL));
        assert!(rendered.components.is_empty());
    }

    #[test]
    fn only_now_playing_carries_controls() {
        let exhausted = notifier().render(Notice::Exhausted(ExhaustedReason::QueueEmpty));
        assert!(exhausted.components.is_empty());
        assert_eq!(exhausted.delete_after, None);

        let controls = ControlSet {
            replay: None,
            pause_resume: control("Pause"),
            skip: control("Skip"),
            stop: control("Stop"),
            autoplay: None,
        };
        let item = QueueItem::new(TrackDescriptor::Query("song".to_string()), UserId::new(1));
        let track = NowPlaying::new(
            item,
            ResolvedTrack {
                title: "Song".to_string(),
                duration: None,
                uploader: None,
                thumbnail: None,
                page_url: None,
                stream_url: "https://stream/song".to_string(),
            },
        );
        let playing = notifier().render(Notice::NowPlaying {
            track: Box::new(track),
            controls,
        });
        assert_eq!(playing.components.len(), 1);
    }
}
