use super::EngineHandle;
use crate::model::ResetTime;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Déclencheur quotidien : vrai une seule fois par jour calendaire local,
/// à la minute configurée, quel que soit le nombre de ticks reçus.
#[derive(Debug, Clone)]
pub struct DailyReset {
    at: ResetTime,
    timezone: Tz,
    last_fired: Option<NaiveDate>,
}

impl DailyReset {
    pub fn new(at: ResetTime, timezone: Tz) -> Self {
        Self {
            at,
            timezone,
            last_fired: None,
        }
    }

    pub fn last_fired(&self) -> Option<NaiveDate> {
        self.last_fired
    }

    /// Évalue un tick. Renvoie `true` (et mémorise la date) si la remise à
    /// zéro doit avoir lieu maintenant.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);
        let on_minute = local.hour() == u32::from(self.at.hour)
            && local.minute() == u32::from(self.at.minute);
        if !on_minute {
            return false;
        }
        let today = local.date_naive();
        if self.last_fired == Some(today) {
            debug!(%today, "reset already fired today");
            return false;
        }
        self.last_fired = Some(today);
        true
    }

    /// Prochain instant de remise à zéro strictement après `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let mut day = now.with_timezone(&self.timezone).date_naive();
        // un jour sans l'heure locale (saut DST) repousse au lendemain
        for _ in 0..3 {
            let candidate = day
                .and_hms_opt(u32::from(self.at.hour), u32::from(self.at.minute), 0)
                .and_then(|naive| self.timezone.from_local_datetime(&naive).earliest());
            if let Some(at) = candidate {
                if at.with_timezone(&Utc) > now {
                    return Some(at);
                }
            }
            day = day.checked_add_signed(ChronoDuration::days(1))?;
        }
        None
    }
}

/// Tâche de fond : pousse un `Tick` daté par `clock` dans la file du moteur
/// à chaque période. S'arrête dès que le moteur ne répond plus.
pub fn spawn_ticker<C>(handle: EngineHandle, period: Duration, clock: C) -> JoinHandle<()>
where
    C: Fn() -> DateTime<Utc> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            if handle.tick(clock()).await.is_err() {
                debug!("engine stopped, ticker exiting");
                break;
            }
        }
    })
}
