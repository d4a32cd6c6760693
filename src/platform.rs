use crate::model::{ChannelId, MessageRef};
use crate::render::Board;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

/// Échec d'un appel à la plateforme (envoi, édition, suppression).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{action} failed: {reason}")]
pub struct TransportError {
    pub action: &'static str,
    pub reason: String,
}

impl TransportError {
    pub fn new<S: Into<String>>(action: &'static str, reason: S) -> Self {
        Self {
            action,
            reason: reason.into(),
        }
    }
}

/// Contrat de l'adaptateur de messagerie. Un nouveau connecteur n'a qu'à
/// implémenter ce trait.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Publie un tableau dans un salon et renvoie sa référence.
    async fn send_board(&self, channel: &ChannelId, board: &Board)
        -> Result<MessageRef, TransportError>;

    /// Remplace le contenu d'un tableau déjà publié.
    async fn edit_board(&self, message: &MessageRef, board: &Board) -> Result<(), TransportError>;

    /// Message texte public (annonce de remise à zéro).
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError>;

    /// Dernier message du salon, s'il a été posté par nous.
    async fn trailing_own_message(
        &self,
        channel: &ChannelId,
    ) -> Result<Option<OwnMessage>, TransportError>;

    async fn delete_message(&self, message: &MessageRef) -> Result<(), TransportError>;
}

/// Nature d'un message que nous avons posté.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Board,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnMessage {
    pub message: MessageRef,
    pub kind: MessageKind,
}

/// Appels de [`MemoryPlatform`] que l'on peut faire échouer un par un.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SendBoard,
    EditBoard,
    SendText,
    History,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::SendBoard,
        Action::EditBoard,
        Action::SendText,
        Action::History,
        Action::Delete,
    ];

    fn name(self) -> &'static str {
        match self {
            Action::SendBoard => "send",
            Action::EditBoard => "edit",
            Action::SendText => "send text",
            Action::History => "history",
            Action::Delete => "delete",
        }
    }
}

/// Contenu d'un message enregistré par [`MemoryPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Posted {
    Board(Board),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub message: MessageRef,
    pub content: Posted,
    pub edits: usize,
}

impl Posted {
    fn kind(&self) -> MessageKind {
        match self {
            Posted::Board(_) => MessageKind::Board,
            Posted::Text(_) => MessageKind::Text,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    messages: Vec<PostedMessage>,
    failing: HashSet<Action>,
}

impl MemoryState {
    fn check(&self, action: Action) -> Result<(), TransportError> {
        if self.failing.contains(&action) {
            return Err(TransportError::new(action.name(), "platform unavailable"));
        }
        Ok(())
    }
}

/// Plateforme en mémoire : conserve chaque message par salon, dans l'ordre.
/// Sert au pilote console et aux tests.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    state: Mutex<MemoryState>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fait échouer (ou non) tous les appels suivants.
    pub fn set_failing(&self, failing: bool) {
        for action in Action::ALL {
            self.set_action_failing(action, failing);
        }
    }

    /// Fait échouer (ou non) un seul type d'appel.
    pub fn set_action_failing(&self, action: Action, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(action);
        } else {
            state.failing.remove(&action);
        }
    }

    /// Messages encore présents dans un salon, du plus ancien au plus récent.
    pub fn messages(&self, channel: &ChannelId) -> Vec<PostedMessage> {
        self.lock()
            .messages
            .iter()
            .filter(|m| &m.message.channel == channel)
            .cloned()
            .collect()
    }

    pub fn board(&self, message: &MessageRef) -> Option<Board> {
        self.lock()
            .messages
            .iter()
            .find(|m| &m.message == message)
            .and_then(|m| match &m.content {
                Posted::Board(b) => Some(b.clone()),
                Posted::Text(_) => None,
            })
    }

    pub fn edit_count(&self, message: &MessageRef) -> usize {
        self.lock()
            .messages
            .iter()
            .find(|m| &m.message == message)
            .map_or(0, |m| m.edits)
    }

    /// Textes publics envoyés dans un salon.
    pub fn texts(&self, channel: &ChannelId) -> Vec<String> {
        self.messages(channel)
            .into_iter()
            .filter_map(|m| match m.content {
                Posted::Text(t) => Some(t),
                Posted::Board(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // un panic ailleurs ne rend pas l'historique inutilisable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn post(
        &self,
        channel: &ChannelId,
        content: Posted,
        action: Action,
    ) -> Result<MessageRef, TransportError> {
        let mut state = self.lock();
        state.check(action)?;
        let message = MessageRef::new(channel.clone(), Uuid::new_v4().to_string());
        state.messages.push(PostedMessage {
            message: message.clone(),
            content,
            edits: 0,
        });
        Ok(message)
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn send_board(
        &self,
        channel: &ChannelId,
        board: &Board,
    ) -> Result<MessageRef, TransportError> {
        self.post(channel, Posted::Board(board.clone()), Action::SendBoard)
    }

    async fn edit_board(&self, message: &MessageRef, board: &Board) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.check(Action::EditBoard)?;
        let posted = state
            .messages
            .iter_mut()
            .find(|m| &m.message == message)
            .ok_or_else(|| TransportError::new("edit", format!("unknown message {}", message.id)))?;
        posted.content = Posted::Board(board.clone());
        posted.edits += 1;
        Ok(())
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError> {
        self.post(channel, Posted::Text(text.to_string()), Action::SendText)
            .map(|_| ())
    }

    async fn trailing_own_message(
        &self,
        channel: &ChannelId,
    ) -> Result<Option<OwnMessage>, TransportError> {
        let state = self.lock();
        state.check(Action::History)?;
        Ok(state
            .messages
            .iter()
            .rev()
            .find(|m| &m.message.channel == channel)
            .map(|m| OwnMessage {
                message: m.message.clone(),
                kind: m.content.kind(),
            }))
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.check(Action::Delete)?;
        let before = state.messages.len();
        state.messages.retain(|m| &m.message != message);
        if state.messages.len() == before {
            return Err(TransportError::new(
                "delete",
                format!("unknown message {}", message.id),
            ));
        }
        Ok(())
    }
}
