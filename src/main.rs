use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use viewx_client::api::ApiClient;
use viewx_client::api::auth::{AuthApi, LoginRequest};
use viewx_client::api::chat::ChatApi;
use viewx_client::api::notification::{NotificationApi, NotificationQuery};
use viewx_client::api::system::SystemApi;
use viewx_client::common::{ServerId, UserId};
use viewx_client::config::{self, ClientConfig};
use viewx_client::notify::Notifier;
use viewx_client::storage::{self, KvStore};
use viewx_client::store::{
    NotificationSource, NotificationStore, PlayerPreferences, SessionStore, ViewMode,
};
use viewx_client::ui::{ChatApp, TerminalNotifier, render};
use viewx_client::version::VersionChecker;
use viewx_client::{ClientError, ClientSession};

#[derive(Parser)]
#[command(name = "viewx", version, about = "ViewX terminal client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Sign in and store the token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Interactive chat (default)
    Chat,
    Conversations,
    History {
        peer: UserId,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Notifications {
        #[command(subcommand)]
        action: NotificationCmd,
    },
    CheckUpdate,
    /// Player and layout preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsCmd>,
    },
}

#[derive(Subcommand)]
enum NotificationCmd {
    List {
        #[arg(long)]
        unread_only: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    Unread,
    Read { id: String },
    ReadAll,
    Delete { id: String },
}

#[derive(Subcommand)]
enum PrefsCmd {
    Volume { value: f64 },
    Rate { value: f64 },
    Mute,
    /// Set `grid` or `feed`; toggles when omitted
    View { mode: Option<ViewMode> },
}

struct Context {
    config: ClientConfig,
    kv: Arc<KvStore>,
    notifier: Arc<dyn Notifier>,
    api: ApiClient,
}

impl Context {
    fn new(config: ClientConfig) -> Result<Self, ClientError> {
        storage::ensure_data_dir(&config.data_dir)?;
        let kv = Arc::new(KvStore::open(config.database_path())?);
        let notifier: Arc<dyn Notifier> =
            Arc::new(TerminalNotifier::new(config.desktop_notifications));
        let api = ApiClient::new(
            &config.api_base_url,
            config.request_timeout(),
            SessionStore::new(Arc::clone(&kv)),
            Arc::clone(&notifier),
        )?;
        Ok(Self {
            config,
            kv,
            notifier,
            api,
        })
    }

    fn require_login(&self) -> Result<(), ClientError> {
        if self.api.session().is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::NotLoggedIn)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    log::debug!("API base {}", app_config.api_base_url);

    run(cli.command.unwrap_or(Cmd::Chat), app_config).await
}

async fn run(command: Cmd, config: ClientConfig) -> Result<(), ClientError> {
    let ctx = Context::new(config)?;

    match command {
        Cmd::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let response = AuthApi::new(ctx.api.clone())
                .login(&LoginRequest {
                    username: Some(username),
                    password: Some(password),
                    email: None,
                })
                .await?;
            let session = ctx.api.session();
            session.set_token(&response.token)?;
            session.set_user_info(&response.user_info)?;
            println!("Logged in as {}", response.user_info.display_name());
        }
        Cmd::Logout => {
            if let Err(err) = AuthApi::new(ctx.api.clone()).logout().await {
                log::debug!("Server logout failed: {err}");
            }
            ctx.api.session().logout()?;
            println!("Logged out");
        }
        Cmd::Whoami => {
            ctx.require_login()?;
            let me = AuthApi::new(ctx.api.clone()).me().await?;
            ctx.api.session().set_user_info(&me)?;
            println!("{} (id {})", me.display_name(), me.id);
        }
        Cmd::Chat => {
            let session =
                ClientSession::start(ctx.config.clone(), Arc::clone(&ctx.kv), Arc::clone(&ctx.notifier))
                    .await?;
            let poller = VersionChecker::new(
                SystemApi::new(ctx.api.clone()),
                ctx.config.index_url(),
                ctx.config.client_version.clone(),
                Arc::clone(&ctx.notifier),
                ctx.config.request_timeout(),
            )?
            .spawn(ctx.config.version_check_interval());
            let result = ChatApp::new(session).run().await;
            poller.stop();
            result?;
        }
        Cmd::Conversations => {
            ctx.require_login()?;
            let conversations = ChatApi::new(ctx.api.clone()).conversations().await?;
            if conversations.is_empty() {
                println!("No conversations yet");
            }
            for conversation in &conversations {
                println!("{}", render::conversation_line(conversation, false));
            }
        }
        Cmd::History { peer, page } => {
            ctx.require_login()?;
            let mut messages = ChatApi::new(ctx.api.clone())
                .history(peer, page, ctx.config.history_page_size)
                .await?;
            messages.reverse();
            for message in &messages {
                println!("{}", render::message_line(message));
            }
        }
        Cmd::Notifications { action } => {
            ctx.require_login()?;
            notifications(&ctx, action).await?;
        }
        Cmd::CheckUpdate => {
            let checker = VersionChecker::new(
                SystemApi::new(ctx.api.clone()),
                ctx.config.index_url(),
                ctx.config.client_version.clone(),
                Arc::clone(&ctx.notifier),
                ctx.config.request_timeout(),
            )?;
            checker.manual_check().await?;
        }
        Cmd::Prefs { action } => prefs(&ctx, action)?,
    }
    Ok(())
}

async fn notifications(ctx: &Context, action: NotificationCmd) -> Result<(), ClientError> {
    let mut store = NotificationStore::new(
        Arc::new(NotificationApi::new(ctx.api.clone())) as Arc<dyn NotificationSource>,
    );
    match action {
        NotificationCmd::List {
            unread_only,
            page,
            size,
        } => {
            let query = NotificationQuery {
                unread_only: unread_only.then_some(true),
                page: Some(page),
                page_size: Some(size),
                ..NotificationQuery::default()
            };
            for notification in store.fetch_notifications(Some(query)).await? {
                println!("{}", render::notification_line(notification));
            }
        }
        NotificationCmd::Unread => println!("{}", store.fetch_unread_count().await),
        NotificationCmd::Read { id } => store.mark_as_read(&ServerId::new(id)).await?,
        NotificationCmd::ReadAll => store.mark_all_as_read().await?,
        NotificationCmd::Delete { id } => store.delete_notification(&ServerId::new(id)).await?,
    }
    Ok(())
}

fn prefs(ctx: &Context, action: Option<PrefsCmd>) -> Result<(), ClientError> {
    let mut player = PlayerPreferences::load(Arc::clone(&ctx.kv));
    match action {
        None => {}
        Some(PrefsCmd::Volume { value }) => player.set_volume(value)?,
        Some(PrefsCmd::Rate { value }) => player.set_playback_rate(value)?,
        Some(PrefsCmd::Mute) => {
            player.toggle_mute()?;
        }
        Some(PrefsCmd::View { mode: Some(mode) }) => mode.save(&ctx.kv)?,
        Some(PrefsCmd::View { mode: None }) => {
            ViewMode::toggle(&ctx.kv)?;
        }
    }
    println!("volume:        {}", player.volume());
    println!("playback rate: {}", player.playback_rate());
    println!("muted:         {}", player.is_muted());
    println!("view mode:     {}", ViewMode::load(&ctx.kv));
    Ok(())
}

fn read_password() -> io::Result<String> {
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
