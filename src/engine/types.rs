use crate::model::{ChannelId, ParticipantId};
use crate::platform::TransportError;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::oneshot;

/// Événement d'interaction livré par la plateforme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Formulaire de commande soumis.
    Order {
        participant: ParticipantId,
        selection: String,
        channel: ChannelId,
    },
    /// Formulaire de disponibilité soumis.
    ToggleAvailability { item: String, channel: ChannelId },
    /// Bouton d'aide.
    Help { channel: ChannelId },
    /// Commande d'administration : (re)publier le tableau.
    Start { channel: ChannelId },
}

/// Pièce jointe d'une réponse privée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub filename: String,
}

/// Accusé de réception privé, visible seulement par l'auteur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Reply {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }
}

/// Canal de réponse utilisable une seule fois.
pub type Responder = oneshot::Sender<Reply>;

/// Résultat d'une évaluation du planificateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub fired: bool,
    pub cleared: usize,
    pub announced: bool,
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("this command can only be used in <#{expected}>")]
    WrongChannel { expected: ChannelId },
    #[error("menu image {} is missing on the server", .0.display())]
    MissingAsset(PathBuf),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("order engine is not running")]
    Stopped,
}

impl BoardError {
    /// Message privé renvoyé à l'auteur de l'interaction.
    pub fn user_notice(&self) -> String {
        match self {
            BoardError::Transport(_) => {
                "❌ Something went wrong talking to the chat server, please try again.".to_string()
            }
            other => format!("❌ {other}"),
        }
    }
}
