use crate::model::{OrderEntry, ResetTime};
use chrono::NaiveTime;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Couleur d'accent du tableau (vert).
pub const BOARD_COLOR: u32 = 0x57F287;

/// Texte affiché quand personne n'a encore commandé.
pub const EMPTY_PLACEHOLDER: &str = "No orders yet. Nothing here! 🥲";

/// Boutons attachés au tableau. Identifiants stables côté plateforme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    Order,
    Help,
    ToggleAvailability,
}

impl Affordance {
    /// Jeu fixe, indépendant du contenu du roster.
    pub const ALL: [Affordance; 3] = [
        Affordance::Order,
        Affordance::Help,
        Affordance::ToggleAvailability,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            Affordance::Order => "order",
            Affordance::Help => "help",
            Affordance::ToggleAvailability => "toggle-availability",
        }
    }

    pub fn from_custom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.custom_id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Affordance::Order => "Order / change",
            Affordance::Help => "Menu / help",
            Affordance::ToggleAvailability => "Admin: mark unavailable",
        }
    }

    /// Formulaire à un champ que la plateforme ouvre avant de livrer
    /// l'interaction. `None` : le bouton répond directement.
    pub fn prompt(self) -> Option<Prompt> {
        match self {
            Affordance::Order => Some(Prompt {
                title: "🥗 Lunch order",
                label: "What would you like today?",
                placeholder: "e.g. chicken salad, salmon poke",
            }),
            Affordance::ToggleAvailability => Some(Prompt {
                title: "🚫 Unavailable items",
                label: "Item to mark or unmark as unavailable",
                placeholder: "e.g. salmon (submitting toggles its state)",
            }),
            Affordance::Help => None,
        }
    }
}

/// Description d'une fenêtre de saisie (modal) à un seul champ texte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub title: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
}

/// Section titrée du tableau.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: String,
}

/// Artefact d'affichage : contenu structuré + boutons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub sections: Vec<Section>,
    pub footer: Option<String>,
    pub actions: Vec<Affordance>,
}

impl Board {
    /// Message provisoire envoyé par `start`, avant le premier rendu.
    pub fn loading() -> Self {
        Self {
            title: String::new(),
            description: "Loading the order board...".to_string(),
            color: BOARD_COLOR,
            sections: Vec::new(),
            footer: None,
            actions: Affordance::ALL.to_vec(),
        }
    }

    /// Rendu texte brut (console, journaux, tests).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.title.is_empty() {
            let _ = writeln!(out, "{}", self.title);
        }
        let _ = writeln!(out, "{}", self.description);
        for section in &self.sections {
            let _ = writeln!(out);
            let _ = writeln!(out, "[{}]", section.name);
            let _ = writeln!(out, "{}", section.body);
        }
        if let Some(footer) = &self.footer {
            let _ = writeln!(out);
            let _ = writeln!(out, "-- {footer}");
        }
        let buttons: Vec<String> = self
            .actions
            .iter()
            .map(|a| format!("[{}]", a.label()))
            .collect();
        let _ = write!(out, "{}", buttons.join(" "));
        out
    }
}

/// Permet de customiser le rendu du tableau.
pub trait BoardRenderer: Send + Sync {
    fn render(
        &self,
        orders: &[OrderEntry],
        unavailable: &BTreeSet<String>,
        now: NaiveTime,
    ) -> Board;
}

/// Rendu par défaut : une ligne par commande, pied de page horodaté.
#[derive(Debug, Clone, Copy)]
pub struct TextBoard {
    pub reset_at: ResetTime,
    pub show_unavailable: bool,
}

impl TextBoard {
    pub fn new(reset_at: ResetTime) -> Self {
        Self {
            reset_at,
            show_unavailable: true,
        }
    }

    pub fn with_unavailable(mut self, show: bool) -> Self {
        self.show_unavailable = show;
        self
    }
}

impl BoardRenderer for TextBoard {
    fn render(
        &self,
        orders: &[OrderEntry],
        unavailable: &BTreeSet<String>,
        now: NaiveTime,
    ) -> Board {
        let mut sections = Vec::with_capacity(2);

        if orders.is_empty() {
            sections.push(Section {
                name: "Current orders".to_string(),
                body: EMPTY_PLACEHOLDER.to_string(),
            });
        } else {
            let body = orders
                .iter()
                .map(|e| format!("👤 **{}**: {}", e.participant, e.selection))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(Section {
                name: format!("{} ordering right now", orders.len()),
                body,
            });
        }

        if self.show_unavailable && !unavailable.is_empty() {
            let items: Vec<&str> = unavailable.iter().map(String::as_str).collect();
            sections.push(Section {
                name: "Unavailable today".to_string(),
                body: format!("🚫 {}", items.join(", ")),
            });
        }

        Board {
            title: "🥗 Today's order board".to_string(),
            description: "Press the button below to place your order.".to_string(),
            color: BOARD_COLOR,
            sections,
            footer: Some(format!(
                "Last update: {} | resets daily at {}",
                now.format("%H:%M"),
                self.reset_at
            )),
            actions: Affordance::ALL.to_vec(),
        }
    }
}

/// Texte d'aide envoyé en privé par le bouton `help`.
pub fn help_text(reset_at: ResetTime, link: Option<&str>) -> String {
    let mut text = format!(
        "**[ 🥗 Order board help ]**\n\
         1. Press 'Order / change' and type what you would like.\n\
         2. To change your order, press it again: the new text replaces the old one.\n\
         3. The board above is updated live.\n\
         4. Orders are cleared automatically every day at {reset_at}."
    );
    if let Some(link) = link {
        let _ = write!(text, "\n\n{link}");
    }
    text
}
