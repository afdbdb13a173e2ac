use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use actfolio::auth::Session;
use actfolio::client::ActivityClient;
use actfolio::config;
use actfolio::model::ActivityId;
use actfolio::navigation::{Params, Route, StackNavigator, Tap, MAIN_ROUTE};
use actfolio::screen::{ActivityScreen, ViewState};

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse, like and attend activities from the terminal")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Resource kind from the config's `resources` table
    #[arg(long, default_value = "external")]
    resource: String,

    /// Bearer token of the logged-in session
    #[arg(long, env = "ACTFOLIO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// User name of the logged-in session
    #[arg(long, env = "ACTFOLIO_USER", default_value = "")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the example configuration
    ExampleConfig,
    /// Load an activity with its recommendations
    Show { id: i64 },
    /// Toggle the like flag of an activity
    Like { id: i64 },
    /// Toggle the attendance flag of an activity
    Attend { id: i64 },
    /// Open an activity, then follow its first recommendations `depth` times
    Browse {
        id: i64,
        #[arg(long, default_value = "3")]
        depth: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match &args.command {
        Command::ExampleConfig => print!("{}", config::example()),
        Command::Show { id } => {
            let (_, client) = connect(&args)?;
            let screen = open(&client, ActivityId(*id)).await;
            render(&screen.snapshot().await);
        }
        Command::Like { id } => {
            let (_, client) = connect(&args)?;
            let screen = ActivityScreen::new(ActivityId(*id), client);
            screen.refresh_detail().await;
            let state = screen.toggle_like().await;
            println!("liked: {}", state.as_str());
        }
        Command::Attend { id } => {
            let (_, client) = connect(&args)?;
            let screen = ActivityScreen::new(ActivityId(*id), client);
            screen.refresh_detail().await;
            let state = screen.toggle_attend().await;
            println!("attended: {}", state.as_str());
        }
        Command::Browse { id, depth } => {
            let (cfg, client) = connect(&args)?;
            browse(&client, ActivityId(*id), *depth, cfg.navigation.max_depth).await;
        }
    }

    Ok(())
}

/// Load the config and build a client for the selected resource and session.
fn connect(args: &Args) -> Result<(config::Config, Arc<ActivityClient>)> {
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let endpoints = cfg.resource(&args.resource)?.clone();
    let token = args
        .token
        .clone()
        .context("no session token; pass --token or set ACTFOLIO_TOKEN")?;
    let session = Session::new(args.user.clone(), token);
    let client = Arc::new(ActivityClient::new(&cfg.api, endpoints, session)?);
    Ok((cfg, client))
}

/// Mount a screen and wait until both of its fetches have settled.
async fn open(client: &Arc<ActivityClient>, id: ActivityId) -> Arc<ActivityScreen> {
    let screen = ActivityScreen::new(id, Arc::clone(client));
    let mounted = screen.mount();
    let (detail, recs) = futures::future::join(mounted.detail, mounted.recommendations).await;
    if let Err(err) = detail.and(recs) {
        warn!(?err, "fetch task aborted");
    }
    screen
}

async fn browse(client: &Arc<ActivityClient>, start: ActivityId, depth: usize, max_depth: usize) {
    let mut nav = StackNavigator::new(Route::new(MAIN_ROUTE, Params::new()), max_depth);
    let mut screen = open(client, start).await;
    screen.tap(&mut nav, Tap::Activity(start));

    for _ in 0..depth {
        let view = screen.snapshot().await;
        render(&view);
        let Some(next) = view.recommendations.first() else {
            info!("no recommendations left to follow");
            break;
        };
        screen.tap(&mut nav, Tap::Recommendation(next.id));
        let id = match nav.current().activity_id() {
            Some(id) => id,
            None => break,
        };
        screen = open(client, id).await;
    }

    println!("-- history ({} screens)", nav.depth());
    for route in nav.routes() {
        match route.activity_id() {
            Some(id) => println!("  {} #{}", route.name, id),
            None => println!("  {}", route.name),
        }
    }
}

fn render(view: &ViewState) {
    match &view.activity {
        Some(activity) => {
            println!("# {}", activity.title.as_deref().unwrap_or(""));
            if let Some(link) = activity.link.as_deref() {
                println!("{}", link);
            }
            println!();
            println!("{}", view.formatted_content());
        }
        None => println!("(activity not loaded)"),
    }
    println!();
    println!("liked: {}  attended: {}", view.liked.as_str(), view.attended.as_str());
    if !view.recommendations.is_empty() {
        println!("recommended:");
        for entry in &view.recommendations {
            println!("  [{}] {}", entry.id, entry.title);
        }
    }
    println!();
}
