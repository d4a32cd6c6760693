use crate::model::{Availability, ChannelId, MessageRef, Roster};
use crate::platform::{MessageKind, OwnMessage, Platform, TransportError};
use crate::render::{Board, BoardRenderer};
use chrono::NaiveTime;
use tracing::{debug, info, warn};

/// Détient la seule référence vivante vers le tableau publié.
///
/// `Unset -> Live` au premier `start`, puis `Live -> Live` (nouvelle
/// identité) à chaque `start` suivant ; jamais de retour à `Unset`.
pub struct BoardPublisher<R> {
    renderer: R,
    live: Option<MessageRef>,
}

impl<R: BoardRenderer> BoardPublisher<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            live: None,
        }
    }

    pub fn live(&self) -> Option<&MessageRef> {
        self.live.as_ref()
    }

    /// Publie un tableau provisoire et en fait la référence vivante.
    ///
    /// Si le dernier message du salon est le tableau vivant, il est supprimé
    /// avant. Sans tableau vivant (redémarrage), un tableau à nous laissé en
    /// fin de salon l'est aussi. Une annonce n'est jamais supprimée.
    /// Nettoyage cosmétique : un échec est seulement journalisé.
    pub async fn start(
        &mut self,
        platform: &dyn Platform,
        channel: &ChannelId,
    ) -> Result<MessageRef, TransportError> {
        match platform.trailing_own_message(channel).await {
            Ok(Some(previous)) if self.is_stale_board(&previous) => {
                if let Err(err) = platform.delete_message(&previous.message).await {
                    warn!(%channel, error = %err, "could not remove trailing board");
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%channel, error = %err, "could not inspect channel history"),
        }

        let message = platform.send_board(channel, &Board::loading()).await?;
        info!(%channel, message = %message.id, "order board published");
        self.live = Some(message.clone());
        Ok(message)
    }

    fn is_stale_board(&self, trailing: &OwnMessage) -> bool {
        match &self.live {
            Some(live) => live == &trailing.message,
            None => trailing.kind == MessageKind::Board,
        }
    }

    /// Re-rend le tableau et l'édite sur place. Sans tableau vivant : rien.
    pub async fn refresh(
        &self,
        platform: &dyn Platform,
        roster: &Roster,
        availability: &Availability,
        now: NaiveTime,
    ) -> Result<(), TransportError> {
        let Some(message) = &self.live else {
            debug!("no live board, refresh skipped");
            return Ok(());
        };
        let board = self
            .renderer
            .render(roster.snapshot(), availability.snapshot(), now);
        platform.edit_board(message, &board).await
    }
}
