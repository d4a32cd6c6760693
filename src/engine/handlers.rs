use super::types::{Attachment, BoardError, Interaction, Reply};
use super::Engine;
use crate::model::{ChannelId, ParticipantId};
use crate::render::{help_text, BoardRenderer};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Résultat d'un handler : réponse privée et besoin de rafraîchir.
pub(super) struct Outcome {
    pub reply: Reply,
    pub refresh: bool,
}

pub(super) async fn dispatch<R: BoardRenderer>(
    engine: &mut Engine<R>,
    interaction: Interaction,
    now: DateTime<Utc>,
) -> Result<Outcome, BoardError> {
    match interaction {
        Interaction::Order {
            participant,
            selection,
            channel,
        } => Ok(order(engine, participant, selection, &channel)),
        Interaction::ToggleAvailability { item, channel } => {
            Ok(toggle_availability(engine, &item, &channel))
        }
        Interaction::Help { .. } => help(engine).map(|reply| Outcome {
            reply,
            refresh: false,
        }),
        Interaction::Start { channel } => start(engine, &channel, now).await,
    }
}

/// Commande : n'importe quel salon, dernière écriture gagnante.
fn order<R: BoardRenderer>(
    engine: &mut Engine<R>,
    participant: ParticipantId,
    selection: String,
    channel: &ChannelId,
) -> Outcome {
    debug!(%participant, %channel, "order submitted");
    let reply = Reply::text(format!("✅ Your order **{selection}** has been received!"));
    engine.roster.submit(participant, selection);
    Outcome {
        reply,
        refresh: true,
    }
}

// Pas de contrôle de rôle ni de salon ici, contrairement à `start`.
fn toggle_availability<R: BoardRenderer>(
    engine: &mut Engine<R>,
    item: &str,
    channel: &ChannelId,
) -> Outcome {
    let item = item.trim();
    let unavailable = engine.availability.toggle(item);
    debug!(item, unavailable, %channel, "availability toggled");
    let text = if unavailable {
        format!("🚫 **'{item}'** is now marked unavailable.")
    } else {
        format!("✅ **'{item}'** is available again.")
    };
    Outcome {
        reply: Reply::text(text),
        refresh: true,
    }
}

fn help<R: BoardRenderer>(engine: &Engine<R>) -> Result<Reply, BoardError> {
    let settings = &engine.settings;
    let text = help_text(settings.reset, settings.help_link.as_deref());
    let attachment = match &settings.help_image {
        Some(path) if path.is_file() => Some(Attachment {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "menu.png".to_string()),
            path: path.clone(),
        }),
        Some(path) => return Err(BoardError::MissingAsset(path.clone())),
        None => None,
    };
    Ok(Reply { text, attachment })
}

async fn start<R: BoardRenderer>(
    engine: &mut Engine<R>,
    channel: &ChannelId,
    now: DateTime<Utc>,
) -> Result<Outcome, BoardError> {
    if channel != &engine.settings.admin_channel {
        return Err(BoardError::WrongChannel {
            expected: engine.settings.admin_channel.clone(),
        });
    }
    let platform = engine.platform.clone();
    engine.publisher.start(platform.as_ref(), channel).await?;
    engine
        .publisher
        .refresh(
            platform.as_ref(),
            &engine.roster,
            &engine.availability,
            engine.local_time(now),
        )
        .await?;
    Ok(Outcome {
        reply: Reply::text("📋 Order board is live."),
        refresh: false,
    })
}
