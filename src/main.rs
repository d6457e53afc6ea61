use std::sync::Arc;

use poise::serenity_prelude as serenity;
use radio_bot::radio::announce::Announcer;
use radio_bot::radio::playlist::PlaylistStore;
use radio_bot::radio::resolver::StreamResolver;
use radio_bot::radio::speech::HttpSpeech;
use radio_bot::radio::{broadcast, Radio};
use radio_bot::{commands, config, events, Data};
use songbird::SerenityInit;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenvy::dotenv_override().ok();
    let config = Arc::new(config::Config::from_env());

    let cookies = config::prepare_cookies(config.cookies_content.as_deref(), &config.cookie_path);
    let http = reqwest::Client::new();

    let playlist = PlaylistStore::load(config.playlist_path.clone());
    tracing::info!(
        "loaded {} playlist entries from {}",
        playlist.entries().len(),
        playlist.path().display()
    );

    let resolver = StreamResolver::from_config(&config, http.clone(), cookies);
    tracing::info!("stream backends: {}", resolver.backend_names().join(", "));

    let announcer = Announcer::new(http.clone(), config.cities.clone(), config.news_feed.clone());
    let speech = HttpSpeech::new(
        http,
        config.tts_url.clone(),
        config.tts_voice.clone(),
        config.tts_api_key.clone(),
        config.tts_file.clone(),
    );
    let radio = Radio::new(
        playlist,
        resolver,
        announcer,
        Arc::new(speech),
        config.broadcast_file.clone(),
    );

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let setup_config = Arc::clone(&config);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!("logged in as {}", ready.user.name);

                broadcast::spawn_daily(ctx.clone(), radio.clone(), Arc::clone(&setup_config));

                Ok(Data {
                    radio,
                    config: setup_config,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .register_songbird()
        .await
        .expect("failed to build client");

    if let Err(e) = client.start().await {
        tracing::error!("client error: {e}");
    }
}
