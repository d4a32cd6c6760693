//! Moteur à écrivain unique.
//!
//! Le roster, les disponibilités et la référence du tableau appartiennent au
//! [`Engine`]. Interactions et ticks arrivent dans une seule file et sont
//! traités jusqu'au bout (mutation + rafraîchissement) l'un après l'autre :
//! aucun verrou n'est nécessaire.

mod handlers;
mod publisher;
mod reset;
mod types;

pub use publisher::BoardPublisher;
pub use reset::{spawn_ticker, DailyReset};
pub use types::{Attachment, BoardError, Interaction, Reply, Responder, TickOutcome};

use crate::config::Config;
use crate::model::{Availability, ChannelId, MessageRef, ParticipantId, ResetTime, Roster};
use crate::platform::Platform;
use crate::render::{BoardRenderer, TextBoard};
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const QUEUE_DEPTH: usize = 64;

/// Réglages du moteur, dérivés de la configuration.
#[derive(Debug, Clone)]
pub struct BoardSettings {
    pub admin_channel: ChannelId,
    pub reset: ResetTime,
    pub timezone: Tz,
    pub help_image: Option<PathBuf>,
    pub help_link: Option<String>,
    pub show_unavailable: bool,
}

impl BoardSettings {
    pub fn new(admin_channel: ChannelId, reset: ResetTime, timezone: Tz) -> Self {
        Self {
            admin_channel,
            reset,
            timezone,
            help_image: None,
            help_link: None,
            show_unavailable: true,
        }
    }
}

impl From<&Config> for BoardSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            admin_channel: cfg.target_channel.clone(),
            reset: cfg.reset,
            timezone: cfg.timezone,
            help_image: cfg.help_image.clone(),
            help_link: cfg.help_link.clone(),
            show_unavailable: cfg.show_unavailable,
        }
    }
}

/// Message de la file du moteur.
#[derive(Debug)]
pub enum Command {
    Interaction {
        interaction: Interaction,
        reply_to: Responder,
    },
    Tick {
        now: DateTime<Utc>,
        done: Option<oneshot::Sender<TickOutcome>>,
    },
    Shutdown,
}

pub struct Engine<R = TextBoard> {
    platform: Arc<dyn Platform>,
    settings: BoardSettings,
    roster: Roster,
    availability: Availability,
    publisher: BoardPublisher<R>,
    reset: DailyReset,
}

impl Engine<TextBoard> {
    pub fn new(platform: Arc<dyn Platform>, settings: BoardSettings) -> Self {
        let renderer = TextBoard::new(settings.reset).with_unavailable(settings.show_unavailable);
        Self::with_renderer(platform, settings, renderer)
    }
}

impl<R: BoardRenderer> Engine<R> {
    pub fn with_renderer(platform: Arc<dyn Platform>, settings: BoardSettings, renderer: R) -> Self {
        let reset = DailyReset::new(settings.reset, settings.timezone);
        Self {
            platform,
            settings,
            roster: Roster::new(),
            availability: Availability::new(),
            publisher: BoardPublisher::new(renderer),
            reset,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn live_board(&self) -> Option<&MessageRef> {
        self.publisher.live()
    }

    /// Traite une interaction et répond une seule fois sur `reply_to`.
    ///
    /// Les erreurs deviennent une réponse privée ; la mutation déjà faite
    /// n'est pas annulée.
    pub async fn handle(&mut self, interaction: Interaction, now: DateTime<Utc>, reply_to: Responder) {
        let outcome = match handlers::dispatch(self, interaction, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "interaction rejected");
                handlers::Outcome {
                    reply: Reply::text(err.user_notice()),
                    refresh: false,
                }
            }
        };
        if reply_to.send(outcome.reply).is_err() {
            debug!("interaction reply dropped by the platform");
        }
        if outcome.refresh {
            self.refresh(now).await;
        }
    }

    /// Variante directe de [`Engine::handle`] qui renvoie la réponse.
    pub async fn interact(&mut self, interaction: Interaction, now: DateTime<Utc>) -> Reply {
        let (tx, rx) = oneshot::channel();
        self.handle(interaction, now, tx).await;
        rx.await
            .unwrap_or_else(|_| Reply::text(BoardError::Stopped.user_notice()))
    }

    /// Un tick du planificateur : annonce, vidage puis rafraîchissement, une
    /// fois par jour à la minute configurée.
    pub async fn on_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.reset.poll(now) {
            return TickOutcome::default();
        }
        let mut outcome = TickOutcome {
            fired: true,
            ..TickOutcome::default()
        };
        if !self.roster.is_empty() {
            let text = announcement(self.settings.reset);
            match self
                .platform
                .send_text(&self.settings.admin_channel, &text)
                .await
            {
                Ok(()) => outcome.announced = true,
                Err(err) => warn!(error = %err, "could not announce daily reset"),
            }
        }
        outcome.cleared = self.roster.clear();
        info!(cleared = outcome.cleared, "daily reset");
        self.refresh(now).await;
        outcome
    }

    /// Rafraîchit le tableau ; un échec est journalisé, pas réessayé.
    async fn refresh(&self, now: DateTime<Utc>) -> bool {
        match self
            .publisher
            .refresh(
                self.platform.as_ref(),
                &self.roster,
                &self.availability,
                self.local_time(now),
            )
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "board refresh failed, display may be stale");
                false
            }
        }
    }

    fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.settings.timezone).time()
    }

    /// Boucle principale : une commande à la fois jusqu'à `Shutdown` ou la
    /// fermeture de la file.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Interaction {
                    interaction,
                    reply_to,
                } => self.handle(interaction, Utc::now(), reply_to).await,
                Command::Tick { now, done } => {
                    let outcome = self.on_tick(now).await;
                    if let Some(done) = done {
                        let _ = done.send(outcome);
                    }
                }
                Command::Shutdown => {
                    info!("order engine shutting down");
                    break;
                }
            }
        }
    }
}

impl<R: BoardRenderer + 'static> Engine<R> {
    /// Lance la boucle sur le runtime courant.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let task = tokio::spawn(self.run(rx));
        (EngineHandle { commands: tx }, task)
    }
}

/// Texte public posté quand des commandes sont effacées.
pub fn announcement(reset: ResetTime) -> String {
    format!("🕒 **{reset}!** Today's orders have been cleared.")
}

/// Côté émetteur de la file du moteur, clonable.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
}

impl EngineHandle {
    pub async fn interact(&self, interaction: Interaction) -> Result<Reply, BoardError> {
        let (reply_to, reply) = oneshot::channel();
        self.commands
            .send(Command::Interaction {
                interaction,
                reply_to,
            })
            .await
            .map_err(|_| BoardError::Stopped)?;
        reply.await.map_err(|_| BoardError::Stopped)
    }

    pub async fn order<S: Into<String>>(
        &self,
        participant: ParticipantId,
        selection: S,
        channel: ChannelId,
    ) -> Result<Reply, BoardError> {
        self.interact(Interaction::Order {
            participant,
            selection: selection.into(),
            channel,
        })
        .await
    }

    pub async fn toggle_availability<S: Into<String>>(
        &self,
        item: S,
        channel: ChannelId,
    ) -> Result<Reply, BoardError> {
        self.interact(Interaction::ToggleAvailability {
            item: item.into(),
            channel,
        })
        .await
    }

    pub async fn help(&self, channel: ChannelId) -> Result<Reply, BoardError> {
        self.interact(Interaction::Help { channel }).await
    }

    pub async fn start(&self, channel: ChannelId) -> Result<Reply, BoardError> {
        self.interact(Interaction::Start { channel }).await
    }

    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, BoardError> {
        let (done, outcome) = oneshot::channel();
        self.commands
            .send(Command::Tick {
                now,
                done: Some(done),
            })
            .await
            .map_err(|_| BoardError::Stopped)?;
        outcome.await.map_err(|_| BoardError::Stopped)
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}
