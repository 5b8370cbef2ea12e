mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::{load_config_file, Overrides, Settings};
use rsvp_contract::notice::STATUS_REFRESH_FAILED;
use rsvp_contract::{CacheStore, HostContext, Notice, PlatformUser, RsvpChoice};
use rsvp_store_adapters::{FileCacheStore, HttpGateway};
use rsvp_sync::{
    resolve_identity, FamilySync, LocalCache, ProfileEdit, ProfileSync, SessionGuards,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "wedding-guest", about = "Run one wedding guest session")]
struct Args {
    #[arg(long, env = "WEDDING_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "WEDDING_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[arg(long, env = "WEDDING_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Signed init payload from the host platform.
    #[arg(long, env = "WEDDING_INIT_DATA")]
    init_data: Option<String>,

    /// Personal invite token, for use outside the platform.
    #[arg(long, env = "WEDDING_INVITE_TOKEN")]
    invite_token: Option<String>,

    #[arg(long, env = "WEDDING_TELEGRAM_ID")]
    telegram_id: Option<i64>,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print profile, banners, family and members.
    Show,
    /// Select a new RSVP status, optionally confirming it.
    Rsvp {
        choice: ChoiceArg,
        #[arg(long)]
        confirm: bool,
    },
    /// Save the profile, applying any given field values first.
    Save {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        birth_date: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    DismissWelcome,
    CheckUsername { username: String },
    Invite { username: String },
    FamilyStatus,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChoiceArg {
    Yes,
    No,
    Maybe,
}

impl From<ChoiceArg> for RsvpChoice {
    fn from(value: ChoiceArg) -> Self {
        match value {
            ChoiceArg::Yes => RsvpChoice::Yes,
            ChoiceArg::No => RsvpChoice::No,
            ChoiceArg::Maybe => RsvpChoice::Maybe,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("rsvp_sync=debug,rsvp_store_adapters=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file = match args.config.as_ref() {
        Some(path) => match load_config_file(path) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        },
        None => None,
    };
    let settings = Settings::resolve(
        Overrides {
            api_base_url: args.api_url,
            cache_dir: args.cache_dir,
            request_timeout_secs: args.timeout_secs,
        },
        file,
    );

    let host = HostContext {
        user: args.telegram_id.map(|id| PlatformUser {
            id: Some(id),
            first_name: args.first_name,
            last_name: args.last_name,
            username: None,
        }),
        init_data: args.init_data,
        invite_token: args.invite_token,
    };

    let store: Arc<dyn CacheStore> = Arc::new(FileCacheStore::new(&settings.cache_dir));
    let guest_id = resolve_identity(&host, store.as_ref());
    let gateway = match HttpGateway::new(settings.api_base_url.clone(), settings.request_timeout)
    {
        Ok(gw) => gw,
        Err(e) => {
            eprintln!("failed to create gateway: {e}");
            std::process::exit(2);
        }
    };
    let credential = host.credential();
    info!(guest_id = %guest_id, api = %settings.api_base_url, "session started");

    let cache = LocalCache::new(store);
    let mut guards = SessionGuards::new();
    let mut profile = ProfileSync::mount(guest_id, cache.clone(), &mut guards, &host);
    let mut family = FamilySync::mount(guest_id, cache);
    profile.hydrate(&gateway, credential.as_ref()).await;
    family.hydrate(&gateway, credential.as_ref()).await;

    let notice: Option<Notice> = match args.command {
        Command::Show => None,
        Command::Rsvp { choice, confirm } => {
            profile.select_rsvp(choice.into());
            if confirm {
                profile.confirm_rsvp(&gateway, credential.as_ref()).await
            } else {
                None
            }
        }
        Command::Save {
            full_name,
            birth_date,
            phone,
        } => {
            if let Some(name) = full_name {
                profile.edit(ProfileEdit::FullName(name));
            }
            if let Some(date) = birth_date {
                profile.edit(ProfileEdit::BirthDate(date));
            }
            if let Some(phone) = phone {
                profile.edit(ProfileEdit::Phone(phone));
            }
            Some(profile.save(&gateway, credential.as_ref()).await)
        }
        Command::DismissWelcome => {
            profile
                .dismiss_welcome(&gateway, credential.as_ref())
                .await;
            None
        }
        Command::CheckUsername { username } => Some(
            family
                .check_username(&gateway, credential.as_ref(), &username)
                .await,
        ),
        Command::Invite { username } => Some(
            family
                .send_invite(&gateway, credential.as_ref(), &username)
                .await,
        ),
        Command::FamilyStatus => match family.refresh_status(&gateway, credential.as_ref()).await
        {
            Ok(_) => None,
            Err(e) => Some(e.notice(STATUS_REFRESH_FAILED)),
        },
    };

    let flow = profile.rsvp_flow();
    let banners = profile.banners();
    let report = json!({
        "guest_id": guest_id,
        "profile": profile.profile(),
        "status": profile.profile().rsvp.summary(),
        "pending_rsvp": flow.pending_target(),
        "confirm_label": flow.confirm_label(),
        "banners": {
            "first_time": banners.first_time,
            "welcome": banners.welcome,
        },
        "optional_expanded": profile.optional_expanded(),
        "family": family.family(),
        "members": family.members(),
        "notice": notice,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("failed to render report: {e}");
            std::process::exit(1);
        }
    }
}
