use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Identifiant d'un participant : son nom affiché, unique pour la journée.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant de salon côté plateforme de messagerie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Référence opaque vers un message publié (le tableau, typiquement).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub id: String,
}

impl MessageRef {
    pub fn new<S: Into<String>>(channel: ChannelId, id: S) -> Self {
        Self {
            channel,
            id: id.into(),
        }
    }
}

/// Commande d'un participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub participant: ParticipantId,
    pub selection: String,
}

/// Commandes du jour, dans l'ordre de première soumission.
///
/// Une seule entrée par participant : une nouvelle soumission remplace la
/// sélection sans déplacer l'entrée.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<OrderEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insère ou remplace la commande de `participant`.
    pub fn submit<S: Into<String>>(&mut self, participant: ParticipantId, selection: S) {
        let selection = selection.into();
        match self.find_mut(&participant) {
            Some(entry) => entry.selection = selection,
            None => self.entries.push(OrderEntry {
                participant,
                selection,
            }),
        }
    }

    /// Vide le roster et renvoie le nombre d'entrées présentes juste avant.
    pub fn clear(&mut self) -> usize {
        let previous = self.entries.len();
        self.entries.clear();
        previous
    }

    pub fn snapshot(&self) -> &[OrderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find<'a>(&'a self, participant: &ParticipantId) -> Option<&'a OrderEntry> {
        self.entries.iter().find(|e| &e.participant == participant)
    }

    fn find_mut(&mut self, participant: &ParticipantId) -> Option<&mut OrderEntry> {
        self.entries
            .iter_mut()
            .find(|e| &e.participant == participant)
    }
}

/// Articles marqués indisponibles (information d'affichage seulement).
#[derive(Debug, Clone, Default)]
pub struct Availability {
    unavailable: BTreeSet<String>,
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bascule l'article : `true` s'il devient indisponible, `false` s'il
    /// redevient disponible.
    pub fn toggle<S: Into<String>>(&mut self, item: S) -> bool {
        let item = item.into();
        if self.unavailable.remove(&item) {
            false
        } else {
            self.unavailable.insert(item);
            true
        }
    }

    pub fn snapshot(&self) -> &BTreeSet<String> {
        &self.unavailable
    }

    pub fn is_unavailable(&self, item: &str) -> bool {
        self.unavailable.contains(item)
    }
}

/// Heure locale (heure, minute) de remise à zéro quotidienne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResetTime {
    pub hour: u8,
    pub minute: u8,
}

impl ResetTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, String> {
        if hour > 23 || minute > 59 {
            return Err(format!("invalid reset time {hour}:{minute}"));
        }
        Ok(Self { hour, minute })
    }
}

impl Default for ResetTime {
    fn default() -> Self {
        Self {
            hour: 12,
            minute: 30,
        }
    }
}

impl fmt::Display for ResetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    #[test]
    fn resubmission_replaces_in_place() {
        let mut roster = Roster::new();
        roster.submit(pid("Alice"), "Salad");
        roster.submit(pid("Bob"), "Poke");
        roster.submit(pid("Alice"), "Soup");

        let got: Vec<(&str, &str)> = roster
            .snapshot()
            .iter()
            .map(|e| (e.participant.as_str(), e.selection.as_str()))
            .collect();
        assert_eq!(got, vec![("Alice", "Soup"), ("Bob", "Poke")]);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn blank_selection_is_accepted() {
        let mut roster = Roster::new();
        roster.submit(pid("Carol"), "   ");
        assert_eq!(roster.find(&pid("Carol")).unwrap().selection, "   ");
    }

    #[test]
    fn clear_returns_previous_size() {
        let mut roster = Roster::new();
        assert_eq!(roster.clear(), 0);
        roster.submit(pid("a"), "x");
        roster.submit(pid("b"), "y");
        roster.submit(pid("c"), "z");
        assert_eq!(roster.clear(), 3);
        assert!(roster.snapshot().is_empty());
        assert_eq!(roster.clear(), 0);
    }

    #[test]
    fn double_toggle_cancels_out() {
        let mut avail = Availability::new();
        avail.toggle("Tuna");
        let before = avail.snapshot().clone();

        assert!(avail.toggle("Salmon"));
        assert!(avail.is_unavailable("Salmon"));
        assert!(!avail.toggle("Salmon"));
        assert_eq!(avail.snapshot(), &before);
    }

    #[test]
    fn reset_time_bounds() {
        assert!(ResetTime::new(23, 59).is_ok());
        assert!(ResetTime::new(24, 0).is_err());
        assert!(ResetTime::new(12, 60).is_err());
        assert_eq!(ResetTime::new(9, 5).unwrap().to_string(), "09:05");
    }
}
