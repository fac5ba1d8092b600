use anyhow::Result;
use serenity::{
    builder::{
        CreateEmbed, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateMessage, EditMessage,
    },
    model::{
        application::ComponentInteraction,
        channel::Message,
        id::{ChannelId, GuildId},
    },
    prelude::Context,
};
use tracing::{debug, info};

use super::{
    commands::{self, Command, Invocation},
    user_voice_channel, CommandError, MusicBot,
};
use crate::{
    audio::{
        controls::may_control,
        player::{ControlOutcome, PlayRequest},
    },
    ui::{buttons::ControlAction, embeds},
};

/// Ejecuta un comando de prefijo ya parseado
pub async fn handle_command(
    ctx: &Context,
    msg: &Message,
    invocation: Invocation,
    bot: &MusicBot,
) -> Result<()> {
    match invocation.command {
        Command::Play => handle_play(ctx, msg, &invocation.args, bot).await,
        Command::Queue => handle_queue(ctx, msg, bot).await,
        Command::Skip | Command::Pause | Command::Resume | Command::Stop => {
            handle_transport(ctx, msg, invocation.command, bot).await
        }
        Command::ClearQueue => handle_clear_queue(ctx, msg, bot).await,
        Command::Join => handle_join(ctx, msg, bot).await,
        Command::Leave => handle_leave(ctx, msg, bot).await,
        Command::Ping => handle_ping(ctx, msg, bot).await,
        Command::Help => handle_help(ctx, msg, &invocation.args, bot).await,
    }
}

async fn reply(ctx: &Context, channel: ChannelId, embed: CreateEmbed) -> Result<Message> {
    Ok(channel
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?)
}

fn guild_of(msg: &Message) -> Result<GuildId, CommandError> {
    msg.guild_id.ok_or(CommandError::NotInGuild)
}

/// El autor del mensaje puede controlar la reproducción: pidió la canción
/// actual o está en el mismo canal de voz que el bot
async fn ensure_can_control(ctx: &Context, msg: &Message, guild_id: GuildId, bot: &MusicBot) -> Result<()> {
    let invoker_channel = user_voice_channel(ctx, guild_id, msg.author.id);
    let bot_channel = bot.bot_voice_channel(guild_id).await;
    let requester = bot.controller().requester(guild_id);

    if bot_channel.is_none() || may_control(msg.author.id, requester, invoker_channel, bot_channel) {
        Ok(())
    } else {
        Err(CommandError::WrongChannel.into())
    }
}

async fn handle_play(ctx: &Context, msg: &Message, query: &str, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    if query.trim().is_empty() {
        return Err(CommandError::MissingArgument(format!(
            "{}play <canción | URL>",
            bot.config().command_prefix
        ))
        .into());
    }

    let user_channel =
        user_voice_channel(ctx, guild_id, msg.author.id).ok_or(CommandError::NotInVoice)?;

    let bot_channel = bot.bot_voice_channel(guild_id).await;
    match bot_channel {
        Some(channel) if channel != user_channel && bot.controller().has_session(guild_id) => {
            return Err(CommandError::WrongChannel.into());
        }
        Some(_) if bot.controller().has_session(guild_id) => {}
        _ => {
            bot.join_voice_channel(guild_id, user_channel, msg.channel_id)
                .await?;
        }
    }

    // Resolver un álbum grande puede tardar unos segundos
    if let Err(e) = msg.channel_id.broadcast_typing(&ctx.http).await {
        debug!("No se pudo mostrar 'escribiendo': {:?}", e);
    }

    let resolved = bot.resolver().resolve(query).await;

    if resolved.descriptors.is_empty() {
        let text = resolved
            .warning
            .unwrap_or_else(|| "No encontré canciones para esa petición.".to_string());
        return reply(ctx, msg.channel_id, embeds::warning_embed(&text, bot.footer()))
            .await
            .map(|_| ());
    }

    let outcome = bot
        .controller()
        .enqueue(PlayRequest {
            guild_id,
            channel_id: msg.channel_id,
            requested_by: msg.author.id,
            descriptors: resolved.descriptors,
            batch: resolved.batch,
            warning: resolved.warning,
        })
        .await;

    info!(
        "🎵 {} canciones encoladas en guild {} ({} descartadas): {:?}",
        outcome.queued, guild_id, outcome.dropped, outcome.advance
    );
    Ok(())
}

async fn handle_queue(ctx: &Context, msg: &Message, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    let snapshot = bot.controller().snapshot(guild_id);
    let embed = embeds::queue_embed(
        snapshot.as_ref(),
        &bot.config().command_prefix,
        bot.footer(),
    );
    reply(ctx, msg.channel_id, embed).await?;
    Ok(())
}

async fn handle_transport(ctx: &Context, msg: &Message, command: Command, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    ensure_can_control(ctx, msg, guild_id, bot).await?;

    let controller = bot.controller();
    let outcome = match command {
        Command::Skip => controller.skip(guild_id).await?,
        Command::Pause => controller.pause(guild_id).await?,
        Command::Resume => controller.resume(guild_id).await?,
        _ => {
            let outcome = controller.stop(guild_id).await?;
            if outcome == ControlOutcome::NotConnected {
                // El controlador no conocía la sesión pero Songbird sí
                bot.leave_voice_channel(guild_id).await?;
            }
            outcome
        }
    };

    reply(ctx, msg.channel_id, outcome_embed(&outcome, bot.footer())).await?;
    Ok(())
}

async fn handle_clear_queue(ctx: &Context, msg: &Message, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    ensure_can_control(ctx, msg, guild_id, bot).await?;

    let removed = bot.controller().clear_queue(guild_id);
    let embed = if removed == 0 {
        embeds::info_embed("📭 La cola ya estaba vacía.", bot.footer())
    } else {
        info!("🗑️ Cola vaciada en guild {} ({} canciones)", guild_id, removed);
        embeds::success_embed(
            &format!("🗑️ Se quitaron **{}** canciones de la cola.", removed),
            bot.footer(),
        )
    };
    reply(ctx, msg.channel_id, embed).await?;
    Ok(())
}

async fn handle_join(ctx: &Context, msg: &Message, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    let user_channel =
        user_voice_channel(ctx, guild_id, msg.author.id).ok_or(CommandError::NotInVoice)?;

    if bot.bot_voice_channel(guild_id).await == Some(user_channel)
        && bot.controller().has_session(guild_id)
    {
        reply(
            ctx,
            msg.channel_id,
            embeds::info_embed("🔊 Ya estoy en tu canal de voz.", bot.footer()),
        )
        .await?;
        return Ok(());
    }

    bot.join_voice_channel(guild_id, user_channel, msg.channel_id)
        .await?;
    reply(
        ctx,
        msg.channel_id,
        embeds::success_embed(&format!("🔊 Conectado a <#{}>", user_channel), bot.footer()),
    )
    .await?;
    Ok(())
}

async fn handle_leave(ctx: &Context, msg: &Message, bot: &MusicBot) -> Result<()> {
    let guild_id = guild_of(msg)?;
    ensure_can_control(ctx, msg, guild_id, bot).await?;

    if bot.bot_voice_channel(guild_id).await.is_none() && !bot.controller().has_session(guild_id) {
        reply(
            ctx,
            msg.channel_id,
            embeds::warning_embed("No estoy en un canal de voz.", bot.footer()),
        )
        .await?;
        return Ok(());
    }

    if bot.controller().stop(guild_id).await? == ControlOutcome::NotConnected {
        bot.leave_voice_channel(guild_id).await?;
    }
    reply(
        ctx,
        msg.channel_id,
        embeds::success_embed("👋 Salí del canal de voz.", bot.footer()),
    )
    .await?;
    Ok(())
}

async fn handle_ping(ctx: &Context, msg: &Message, bot: &MusicBot) -> Result<()> {
    let started = std::time::Instant::now();
    let mut sent = reply(ctx, msg.channel_id, embeds::info_embed("🏓 Pong!", bot.footer())).await?;

    let latency = started.elapsed();
    let embed = embeds::info_embed(
        &format!("🏓 Pong! `{} ms`", latency.as_millis()),
        bot.footer(),
    );
    sent.edit(&ctx.http, EditMessage::new().embed(embed)).await?;
    Ok(())
}

async fn handle_help(ctx: &Context, msg: &Message, args: &str, bot: &MusicBot) -> Result<()> {
    let prefix = &bot.config().command_prefix;
    let topic = args.split_whitespace().next();

    let embed = match topic {
        None => embeds::help_embed(prefix, bot.footer()),
        Some(name) => match commands::find(name.trim_start_matches(prefix.as_str())) {
            Some(spec) => embeds::command_help_embed(spec, prefix, bot.footer()),
            None => embeds::warning_embed(
                &format!("No existe el comando `{}`. Usa `{}help`.", name, prefix),
                bot.footer(),
            ),
        },
    };
    reply(ctx, msg.channel_id, embed).await?;
    Ok(())
}

/// Maneja los botones del mensaje "Now Playing"
pub async fn handle_component(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &MusicBot,
) -> Result<()> {
    let Some(action) = ControlAction::from_custom_id(&component.data.custom_id) else {
        debug!("Componente ignorado: {}", component.data.custom_id);
        return Ok(());
    };

    let Some(guild_id) = component.guild_id else {
        return respond_ephemeral(ctx, component, &CommandError::NotInGuild.to_string()).await;
    };

    info!(
        "🔘 Botón {:?} presionado por {} en guild {}",
        action, component.user.name, guild_id
    );

    let invoker_channel = user_voice_channel(ctx, guild_id, component.user.id);
    let bot_channel = bot.bot_voice_channel(guild_id).await;
    let requester = bot.controller().requester(guild_id);

    if !may_control(component.user.id, requester, invoker_channel, bot_channel) {
        return respond_ephemeral(
            ctx,
            component,
            "Solo quien pidió la canción o alguien en mi canal de voz puede usar estos controles.",
        )
        .await;
    }

    // Replay puede resolver una pista; hay que confirmar antes de los 3 segundos
    component.defer_ephemeral(&ctx.http).await?;

    let controller = bot.controller();
    let outcome = match action {
        ControlAction::Replay => controller.replay(guild_id).await?,
        ControlAction::PauseResume => controller.toggle_pause(guild_id).await?,
        ControlAction::Skip => controller.skip(guild_id).await?,
        ControlAction::Stop => controller.stop(guild_id).await?,
        ControlAction::Autoplay => controller.toggle_autoplay(guild_id).await?,
    };

    component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .embed(outcome_embed(&outcome, bot.footer()))
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn respond_ephemeral(ctx: &Context, component: &ComponentInteraction, text: &str) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(format!("⚠️ {}", text))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Texto de respuesta para el resultado de un control y si fue un éxito
fn outcome_message(outcome: &ControlOutcome) -> (bool, String) {
    match outcome {
        ControlOutcome::Paused => (true, "⏸️ Reproducción pausada.".to_string()),
        ControlOutcome::Resumed => (true, "▶️ Reproducción reanudada.".to_string()),
        ControlOutcome::Skipped { title } => (true, format!("⏭️ Saltada: **{}**", title)),
        ControlOutcome::Stopped => (
            true,
            "⏹️ Reproducción detenida y cola vaciada.".to_string(),
        ),
        ControlOutcome::Replaying => (true, "⏪ Repitiendo la última canción.".to_string()),
        ControlOutcome::Autoplay(true) => (true, "🔁 Autoplay activado.".to_string()),
        ControlOutcome::Autoplay(false) => (true, "🔁 Autoplay desactivado.".to_string()),
        ControlOutcome::NothingPlaying => (false, "No hay nada sonando.".to_string()),
        ControlOutcome::NotPaused => (false, "La reproducción no está pausada.".to_string()),
        ControlOutcome::NothingToReplay => {
            (false, "No hay una canción anterior para repetir.".to_string())
        }
        ControlOutcome::NotConnected => (false, "No estoy en un canal de voz.".to_string()),
        ControlOutcome::FeatureDisabled => {
            (false, "Esta función está deshabilitada.".to_string())
        }
    }
}

fn outcome_embed(outcome: &ControlOutcome, footer: &str) -> CreateEmbed {
    match outcome_message(outcome) {
        (true, text) => embeds::success_embed(&text, footer),
        (false, text) => embeds::warning_embed(&text, footer),
    }
}
