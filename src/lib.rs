#![forbid(unsafe_code)]
//! Orderboard — tableau des commandes du jour pour un salon de discussion.
//!
//! - État volatile en mémoire (roster + articles indisponibles).
//! - Un seul tableau vivant, édité sur place à chaque mutation.
//! - Remise à zéro quotidienne à heure locale fixe (fuseau IANA configuré).
//! - La plateforme de messagerie est un adaptateur derrière [`Platform`].

pub mod config;
pub mod engine;
pub mod model;
pub mod platform;
pub mod render;

pub use config::{Config, ConfigError};
pub use engine::{
    announcement, spawn_ticker, BoardError, BoardPublisher, BoardSettings, DailyReset, Engine,
    EngineHandle, Interaction, Reply, TickOutcome,
};
pub use model::{Availability, ChannelId, MessageRef, OrderEntry, ParticipantId, ResetTime, Roster};
pub use platform::{MemoryPlatform, Platform, TransportError};
pub use render::{Affordance, Board, BoardRenderer, Prompt, TextBoard};
