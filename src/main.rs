use anyhow::Result;
use serenity::{all::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod sources;
mod ui;

use crate::audio::player::{PlaybackController, PlayerSettings};
use crate::bot::MusicBot;
use crate::config::Config;
use crate::sources::{MetadataProvider, SpotifyClient, TrackResolver, YtDlpBackend};
use crate::ui::notifier::DiscordNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guild_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Guild Jukebox v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    let backend = Arc::new(YtDlpBackend::new(
        config.ytdlp_path.clone(),
        config.resolve_timeout,
    ));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&backend).await;
    }

    match backend.version().await {
        Ok(version) => info!("✅ yt-dlp {} disponible", version),
        Err(e) => warn!("⚠️ yt-dlp no responde ({}); las canciones no podrán resolverse", e),
    }

    let http_client = reqwest::Client::new();

    // Spotify es opcional: sin credenciales los enlaces se tratan como texto
    let provider: Option<Arc<dyn MetadataProvider>> = match config.spotify_credentials() {
        Some((client_id, client_secret)) => {
            info!("🟢 Integración con Spotify activada");
            Some(Arc::new(SpotifyClient::new(
                http_client.clone(),
                client_id,
                client_secret,
            )))
        }
        None => {
            info!("⚪ Spotify sin credenciales; enlaces de Spotify desactivados");
            None
        }
    };
    let resolver = Arc::new(TrackResolver::new(provider)?);

    let notifier = Arc::new(DiscordNotifier::new(
        Arc::new(Http::new(&config.discord_token)),
        config.embed_footer.clone(),
    ));

    let (controller, completions) = PlaybackController::new(
        backend,
        notifier,
        PlayerSettings {
            max_queue_size: config.max_queue_size,
            disconnect_grace: config.disconnect_grace,
            features: config.features(),
        },
    );
    let controller = Arc::new(controller);
    let _completion_loop = controller.clone().spawn_completion_loop(completions);

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let songbird = Songbird::serenity();
    let handler = MusicBot::new(
        config.clone(),
        controller.clone(),
        resolver,
        songbird.clone(),
        http_client,
    );

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!(
            "⚠️ Señal de shutdown recibida, cerrando ({} guilds activas)...",
            controller.active_guilds()
        );
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(backend: &YtDlpBackend) -> Result<()> {
    match backend.version().await {
        Ok(version) => {
            println!("OK (yt-dlp {})", version);
            Ok(())
        }
        Err(e) => anyhow::bail!("Dependencias faltantes: {}", e),
    }
}
