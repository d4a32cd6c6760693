#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use orderboard::{
    engine::{spawn_ticker, BoardSettings, Engine, EngineHandle, Interaction},
    model::{Availability, ChannelId, ParticipantId, Roster},
    platform::{MemoryPlatform, Posted},
    render::{BoardRenderer, TextBoard},
    Config, DailyReset,
};
use std::sync::Arc;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Tableau des commandes du jour (pilote console)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de configuration
    #[arg(long, global = true, default_value = "orderboard.json")]
    config: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Valider la configuration et afficher les réglages effectifs
    CheckConfig,

    /// Afficher un tableau sans plateforme
    Preview {
        /// liste "nom=commande,nom=commande"
        #[arg(long)]
        orders: Option<String>,
        /// liste "article,article"
        #[arg(long)]
        unavailable: Option<String>,
        /// heure locale du pied de page (HH:MM)
        #[arg(long)]
        at: Option<String>,
    },

    /// Prochaine remise à zéro dans le fuseau configuré
    NextReset,

    /// Pilote console : une interaction par ligne sur stdin
    Run {
        /// Pas de tick automatique ; seulement `tick HH:MM`
        #[arg(long)]
        manual_clock: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    match cli.cmd {
        Commands::CheckConfig => {
            println!("target channel: {}", config.target_channel);
            println!("reset: daily at {} ({})", config.reset, config.timezone);
            println!("poll interval: {}s", config.poll_interval.as_secs());
            match &config.help_image {
                Some(path) => println!("help image: {}", path.display()),
                None => println!("help image: -"),
            }
            println!("show unavailable: {}", config.show_unavailable);
            println!("OK");
        }
        Commands::Preview {
            orders,
            unavailable,
            at,
        } => {
            let mut roster = Roster::new();
            if let Some(list) = orders {
                for pair in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let Some((name, selection)) = pair.split_once('=') else {
                        bail!("invalid order {pair:?}, expected name=selection");
                    };
                    roster.submit(ParticipantId::new(name.trim()), selection.trim());
                }
            }
            let mut availability = Availability::new();
            if let Some(list) = unavailable {
                for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    availability.toggle(item);
                }
            }
            let at = match at {
                Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
                    .with_context(|| format!("invalid time {raw}, expected HH:MM"))?,
                None => Utc::now().with_timezone(&config.timezone).time(),
            };
            let board = TextBoard::new(config.reset)
                .with_unavailable(config.show_unavailable)
                .render(roster.snapshot(), availability.snapshot(), at);
            println!("{}", board.to_text());
        }
        Commands::NextReset => {
            let now = Utc::now();
            let reset = DailyReset::new(config.reset, config.timezone);
            let next = reset
                .next_after(now)
                .context("no upcoming reset found")?;
            let wait = next.with_timezone(&Utc) - now;
            println!(
                "next reset: {} (in {}h {:02}m)",
                next.format("%Y-%m-%d %H:%M %Z"),
                wait.num_hours(),
                wait.num_minutes() % 60
            );
        }
        Commands::Run { manual_clock } => run_console(config, manual_clock).await?,
    }

    Ok(())
}

async fn run_console(config: Config, manual_clock: bool) -> Result<()> {
    let platform = Arc::new(MemoryPlatform::new());
    let settings = BoardSettings::from(&config);
    let (handle, engine) = Engine::new(platform.clone(), settings).spawn();
    let ticker =
        (!manual_clock).then(|| spawn_ticker(handle.clone(), config.poll_interval, Utc::now));

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(err) = console_line(line, &config, &handle, &platform).await {
            println!("! {err:#}");
        }
    }

    handle.shutdown().await;
    engine.await.context("engine task")?;
    if let Some(ticker) = ticker {
        ticker.abort();
    }
    Ok(())
}

async fn console_line(
    line: &str,
    config: &Config,
    handle: &EngineHandle,
    platform: &MemoryPlatform,
) -> Result<()> {
    let channel = config.target_channel.clone();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let interaction = match verb {
        "start" => Interaction::Start {
            channel: if rest.is_empty() {
                channel.clone()
            } else {
                ChannelId::new(rest)
            },
        },
        "order" => {
            let (name, selection) = rest.split_once(' ').unwrap_or((rest, ""));
            if name.is_empty() {
                bail!("usage: order <name> <selection>");
            }
            Interaction::Order {
                participant: ParticipantId::new(name),
                selection: selection.trim().to_string(),
                channel: channel.clone(),
            }
        }
        "toggle" => Interaction::ToggleAvailability {
            item: rest.to_string(),
            channel: channel.clone(),
        },
        "help" => Interaction::Help {
            channel: channel.clone(),
        },
        "tick" => {
            let at = NaiveTime::parse_from_str(rest, "%H:%M")
                .with_context(|| format!("usage: tick HH:MM (got {rest:?})"))?;
            let today = Utc::now().with_timezone(&config.timezone).date_naive();
            let now = config
                .timezone
                .from_local_datetime(&today.and_time(at))
                .earliest()
                .context("local time does not exist today")?
                .with_timezone(&Utc);
            let outcome = handle.tick(now).await?;
            if outcome.announced {
                if let Some(text) = platform.texts(&channel).last() {
                    println!("# {text}");
                }
            }
            if outcome.fired {
                println!("> reset: {} order(s) cleared", outcome.cleared);
                print_board(platform, &channel);
            } else {
                println!("> no reset at {rest}");
            }
            return Ok(());
        }
        "board" => {
            print_board(platform, &channel);
            return Ok(());
        }
        other => bail!("unknown command {other:?} (start, order, toggle, help, tick, board)"),
    };

    let reply = handle.interact(interaction).await?;
    println!("> {}", reply.text);
    if let Some(attachment) = reply.attachment {
        println!("> (attachment: {})", attachment.filename);
    }
    if verb != "help" {
        print_board(platform, &channel);
    }
    Ok(())
}

fn print_board(platform: &MemoryPlatform, channel: &ChannelId) {
    let board = platform
        .messages(channel)
        .into_iter()
        .rev()
        .find_map(|m| match m.content {
            Posted::Board(board) => Some(board),
            Posted::Text(_) => None,
        });
    match board {
        Some(board) => println!("{}", board.to_text()),
        None => println!("(no board yet, use `start`)"),
    }
}
