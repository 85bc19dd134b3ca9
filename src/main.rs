mod artist_image;
mod config;
mod error;
mod handlers;
mod lastfm;
mod line;
mod reply;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::artist_image::{ArtistImageSource, LastFmPageScraper, StaticImage};
use crate::config::{Config, ImageSourceKind};
use crate::handlers::{router, AppState};
use crate::lastfm::LastFmClient;
use crate::line::LineClient;
use crate::reply::{ReplyFormatter, ReplySettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        reply_style = ?config.reply_style,
        image_source = ?config.image_source,
        artist_limit = config.artist_limit,
        max_columns = config.carousel_max_columns,
        "starting"
    );

    let lastfm = LastFmClient::new(config.lastfm_api_key, config.artist_limit);
    let images: Arc<dyn ArtistImageSource> = match config.image_source {
        ImageSourceKind::Static => Arc::new(StaticImage),
        ImageSourceKind::Scrape => Arc::new(LastFmPageScraper::new()?),
    };
    let formatter = ReplyFormatter::new(
        Arc::new(lastfm),
        images,
        ReplySettings {
            style: config.reply_style,
            max_columns: config.carousel_max_columns,
        },
    );
    let line = Arc::new(LineClient::new(config.line_channel_token));

    let state = AppState {
        channel_secret: Arc::from(config.line_channel_secret),
        formatter: Arc::new(formatter),
        sender: line.clone(),
        content: line,
    };

    let app = router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
