// Framework bootstrap for the battle client runtime.

use crate::domain::assets::MANIFEST;
use crate::domain::ports::AuthProvider;
use crate::domain::tuning::RenderTuning;
use crate::frameworks::config::{self, ConfigError};
use crate::interface_adapters::assets::load_assets;
use crate::interface_adapters::clients::{LoginRequest, RestAuthClient, RoomsClient};
use crate::interface_adapters::keyboard::spawn_stdin_keys;
use crate::interface_adapters::notifier::LogNotifier;
use crate::interface_adapters::raster::RasterCanvas;
use crate::interface_adapters::ws::WsConnector;
use crate::use_cases::{
    BattleOutcome, BattleView, BattleViewConfig, TransportSession, acquire_credential,
};

use std::io::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Which battle to open: a known battle id, or a room to join first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleTarget {
    Battle(String),
    Room(u64),
}

/// Everything the client needs for one run, resolved from the environment.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub ws_base_url: String,
    pub asset_dir: PathBuf,
    pub target: BattleTarget,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub login: Option<(String, String)>,
    pub local_player_id: Option<u64>,
    pub http_timeout: Duration,
    pub frame_dump_path: Option<PathBuf>,
}

impl ClientSettings {
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let target = match (config::battle_id(), config::room_id()?) {
            (Some(battle_id), _) => BattleTarget::Battle(battle_id),
            (None, Some(room_id)) => BattleTarget::Room(room_id),
            (None, None) => return Err(ConfigError::MissingBattle),
        };
        let login = config::auth_username().zip(config::auth_password());

        Ok(Self {
            api_base_url: config::api_base_url()?,
            ws_base_url: config::ws_base_url()?,
            asset_dir: config::asset_dir(),
            target,
            access_token: config::access_token(),
            refresh_token: config::refresh_token(),
            login,
            local_player_id: config::local_player_id()?,
            http_timeout: config::http_timeout(),
            frame_dump_path: config::frame_dump_path(),
        })
    }
}

pub async fn run_with_config() -> Result<BattleOutcome> {
    init_runtime();

    let settings = ClientSettings::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))
        .map_err(Error::other)?;

    let (keys_tx, keys_rx) = mpsc::channel(config::KEY_CHANNEL_CAPACITY);
    let keyboard = spawn_stdin_keys(keys_tx);
    let outcome = run(settings, keys_rx).await;
    keyboard.abort();
    outcome
}

/// Runs one battle end to end with key names taken from `keys`.
pub async fn run(settings: ClientSettings, keys: mpsc::Receiver<String>) -> Result<BattleOutcome> {
    let auth = Arc::new(
        RestAuthClient::new(settings.api_base_url.clone(), settings.http_timeout)
            .map_err(|e| Error::other(format!("failed to initialize auth client: {e}")))?
            .with_tokens(settings.access_token.clone(), settings.refresh_token.clone()),
    );
    let rooms = RoomsClient::new(settings.api_base_url.clone(), settings.http_timeout)
        .map_err(|e| Error::other(format!("failed to initialize rooms client: {e}")))?;
    tracing::debug!(
        api_base_url = %settings.api_base_url,
        http_timeout_ms = settings.http_timeout.as_millis(),
        "rest clients configured"
    );

    let local_player_id = resolve_local_player(&auth, &settings).await?;

    // Sprites first: nothing is connected when they cannot all be loaded.
    let assets = load_assets(&settings.asset_dir, MANIFEST)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to load sprites"))
        .map_err(Error::other)?;

    let (battle_id, joined_room) = match &settings.target {
        BattleTarget::Battle(battle_id) => (battle_id.clone(), false),
        BattleTarget::Room(room_id) => {
            let credential = acquire_credential(auth.as_ref()).await.map_err(Error::other)?;
            let battle_id = rooms
                .join_room(&credential, *room_id)
                .await
                .inspect_err(|e| tracing::error!(room_id, error = %e, "failed to join room"))
                .map_err(Error::other)?;
            (battle_id, true)
        }
    };

    let connector = WsConnector::new(&settings.ws_base_url, config::INBOUND_CHANNEL_CAPACITY)
        .map_err(Error::other)?;
    let session = TransportSession::connect(auth.as_ref(), &connector, &battle_id)
        .await
        .inspect_err(|e| tracing::error!(%battle_id, error = %e, "failed to open battle"))
        .map_err(Error::other)?;

    let shutdown = Arc::new(Notify::new());
    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; leaving battle");
                shutdown.notify_one();
            }
        })
    };

    let mut view = BattleView::new(
        session,
        RasterCanvas::new(assets),
        Arc::new(LogNotifier),
        BattleViewConfig {
            local_player_id,
            tuning: RenderTuning::default(),
        },
    );
    let outcome = view.run(keys, shutdown).await;
    ctrl_c.abort();

    if joined_room {
        leave_room(&auth, &rooms).await;
    }

    let canvas = view.into_canvas();
    if let Some(path) = &settings.frame_dump_path {
        match canvas.save_png(path) {
            Ok(()) => tracing::info!(path = %path.display(), "last frame saved"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save last frame"),
        }
    }

    Ok(outcome)
}

// Login when credentials are configured, then ask the backend who we are.
async fn resolve_local_player(
    auth: &RestAuthClient,
    settings: &ClientSettings,
) -> Result<Option<u64>> {
    if let Some((username, password)) = &settings.login {
        let user = auth
            .login(&LoginRequest {
                username: username.clone(),
                password: password.clone(),
            })
            .await
            .inspect_err(|e| tracing::error!(%username, error = %e, "login failed"))
            .map_err(Error::other)?;
        return Ok(Some(user.id));
    }

    if settings.local_player_id.is_some() {
        return Ok(settings.local_player_id);
    }

    if auth.is_credential_expired() && !auth.has_refresh_token() {
        tracing::warn!("no usable credential; every tank is drawn as an enemy");
        return Ok(None);
    }
    if let Err(e) = acquire_credential(auth).await {
        tracing::warn!(error = %e, "could not refresh credential before profile lookup");
        return Ok(None);
    }
    match auth.user_info().await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "profile loaded");
            Ok(Some(user.id))
        }
        Err(e) => {
            tracing::warn!(error = %e, "profile lookup failed; every tank is drawn as an enemy");
            Ok(None)
        }
    }
}

async fn leave_room(auth: &RestAuthClient, rooms: &RoomsClient) {
    let Some(credential) = auth.current_credential() else {
        return;
    };
    if let Err(e) = rooms.leave_room(&credential).await {
        tracing::warn!(error = %e, "failed to leave room");
    }
}
