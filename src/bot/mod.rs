//! # Bot Module
//!
//! Discord side of Guild Jukebox.
//!
//! [`MusicBot`] implements Serenity's [`EventHandler`] and turns gateway events
//! into calls on the [`PlaybackController`]:
//!
//! - prefix commands arrive through `message` and are parsed by [`commands`]
//! - button presses arrive through `interaction_create`
//! - `voice_state_update` notices when the bot is kicked out of its channel
//!
//! Every command runs behind a single error boundary: user mistakes
//! ([`CommandError`]) become an orange warning, anything else is logged with
//! its full chain and answered with a generic error embed.

use anyhow::Result;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Interaction, Message, Ready, UserId, VoiceState},
    async_trait,
    builder::CreateMessage,
};
use songbird::Songbird;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{
    audio::{player::PlaybackController, voice::SongbirdSession},
    config::Config,
    sources::TrackResolver,
    ui::embeds,
};
use commands::Parsed;

/// Errores causados por el usuario; se responden con un aviso y no cambian
/// el estado de reproducción
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Este comando solo funciona dentro de un servidor")]
    NotInGuild,
    #[error("Tienes que estar en un canal de voz")]
    NotInVoice,
    #[error("Tienes que estar en mi mismo canal de voz")]
    WrongChannel,
    #[error("Falta un argumento. Uso: `{0}`")]
    MissingArgument(String),
    #[error("No pude conectarme al canal de voz: {0}")]
    JoinFailed(String),
}

pub struct MusicBot {
    config: Arc<Config>,
    controller: Arc<PlaybackController>,
    resolver: Arc<TrackResolver>,
    songbird: Arc<Songbird>,
    /// Cliente HTTP que usan los streams de Songbird
    http_client: reqwest::Client,
}

impl MusicBot {
    pub fn new(
        config: Arc<Config>,
        controller: Arc<PlaybackController>,
        resolver: Arc<TrackResolver>,
        songbird: Arc<Songbird>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            controller,
            resolver,
            songbird,
            http_client,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn resolver(&self) -> &TrackResolver {
        &self.resolver
    }

    pub fn footer(&self) -> &str {
        &self.config.embed_footer
    }

    /// Connects the bot to a voice channel and hands the session to the
    /// playback controller.
    ///
    /// `text_channel` becomes the channel where playback notices are posted.
    pub async fn join_voice_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        text_channel: ChannelId,
    ) -> Result<()> {
        let call = self.songbird.join(guild_id, channel_id).await.map_err(|e| {
            warn!("⚠️ Error al conectar al canal de voz en guild {}: {:?}", guild_id, e);
            CommandError::JoinFailed(e.to_string())
        })?;

        let session = SongbirdSession::new(
            guild_id,
            self.songbird.clone(),
            call,
            self.http_client.clone(),
            self.config.default_volume,
        );
        self.controller
            .attach_session(guild_id, Arc::new(session), Some(text_channel));

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
        Ok(())
    }

    /// Canal de voz donde está el bot en esta guild
    pub async fn bot_voice_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let call = self.songbird.get(guild_id)?;
        let channel = call.lock().await.current_channel()?;
        Some(ChannelId::from(channel.0))
    }

    /// Sale del canal de voz aunque el controlador no tenga sesión
    pub async fn leave_voice_channel(&self, guild_id: GuildId) -> Result<()> {
        if self.songbird.get(guild_id).is_some() {
            self.songbird.remove(guild_id).await?;
            info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        }
        Ok(())
    }

    async fn report_error(&self, ctx: &Context, channel: ChannelId, err: anyhow::Error) {
        let embed = match err.downcast_ref::<CommandError>() {
            Some(user_error) => embeds::warning_embed(&user_error.to_string(), self.footer()),
            None => {
                error!("❌ Error manejando comando: {:?}", err);
                embeds::error_embed(
                    "Error interno",
                    "Algo salió mal al procesar el comando. Inténtalo de nuevo.",
                    self.footer(),
                )
            }
        };

        if let Err(e) = channel
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await
        {
            warn!("⚠️ No se pudo responder en el canal {}: {:?}", channel, e);
        }
    }
}

/// Canal de voz en el que está un usuario, según la caché
pub fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
}

#[async_trait]
impl EventHandler for MusicBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!("⌨️ Prefijo de comandos: {}", self.config.command_prefix);
        if !self.resolver.has_provider() {
            info!("⚪ Los enlaces de Spotify se buscarán como texto");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let invocation = match commands::parse(&self.config.command_prefix, &msg.content) {
            Parsed::NotACommand => return,
            Parsed::Unknown(name) => {
                debug!("Comando desconocido: {}", name);
                let text = format!(
                    "No existe el comando `{}`. Usa `{}help` para ver la lista.",
                    name, self.config.command_prefix
                );
                let embed = embeds::warning_embed(&text, self.footer());
                if let Err(e) = msg
                    .channel_id
                    .send_message(&ctx.http, CreateMessage::new().embed(embed))
                    .await
                {
                    warn!("⚠️ No se pudo responder en el canal {}: {:?}", msg.channel_id, e);
                }
                return;
            }
            Parsed::Command(invocation) => invocation,
        };

        info!(
            "📝 Comando {:?} usado por {} en guild {:?}",
            invocation.command, msg.author.name, msg.guild_id
        );

        if let Err(e) = handlers::handle_command(&ctx, &msg, invocation, self).await {
            self.report_error(&ctx, msg.channel_id, e).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if let Err(e) = handlers::handle_component(&ctx, &component, self).await {
                error!("❌ Error manejando componente: {:?}", e);
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }

        if let Some(guild_id) = new.guild_id {
            info!("🔌 Bot desconectado en guild {}", guild_id);
            self.controller.teardown(guild_id).await;
        }
    }
}
