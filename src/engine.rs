use crate::anchor::{resolve_anchor, Anchor};
use crate::calculator;
use crate::calendar::{self, CalendarDayView, CalendarMonth, CycleSummary, DayContext};
use crate::cycle::CycleDay;
use crate::date::{CalendarDate, Locale, YearMonth};
use crate::error::{EngineError, Result};
use crate::models::{DailyLog, FlowIntensity, NewDailyLog, ProfileUpdate, UserData};
use crate::mutators::{self, PeriodState};
use crate::store::{CycleSnapshot, CycleStore, CycleWrite};

/// Cycle engine over a store.
///
/// Queries decode a fresh snapshot each time and derive everything from it,
/// so nothing cached can outlive a mutation. Each mutation is one
/// `CycleWrite` committed as a unit.
pub struct CycleEngine<S> {
    store: S,
    locale: Locale,
}

impl<S: CycleStore> CycleEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> Result<CycleSnapshot> {
        self.store.snapshot()
    }

    pub fn anchor(&self, today: CalendarDate) -> Result<Anchor> {
        let snapshot = self.snapshot()?;
        Ok(resolve_anchor(
            snapshot.profile().period_start_date,
            &snapshot.ovulation,
            today,
        ))
    }

    pub fn cycle_day_for(&self, date: CalendarDate, today: CalendarDate) -> Result<CycleDay> {
        Ok(calculator::cycle_day_for(date, &self.anchor(today)?))
    }

    pub fn day_view(&self, date: CalendarDate, today: CalendarDate) -> Result<CalendarDayView> {
        let snapshot = self.snapshot()?;
        Ok(DayContext::new(&snapshot, today).annotate(date))
    }

    pub fn annotate_month(&self, month: YearMonth, today: CalendarDate) -> Result<CalendarMonth> {
        self.annotate_month_in(month, today, self.locale)
    }

    pub fn annotate_month_in(
        &self,
        month: YearMonth,
        today: CalendarDate,
        locale: Locale,
    ) -> Result<CalendarMonth> {
        let snapshot = self.snapshot()?;
        Ok(calendar::annotate_month(month, &snapshot, today, locale))
    }

    pub fn summary(&self, today: CalendarDate) -> Result<CycleSummary> {
        Ok(calendar::summarize(&self.snapshot()?, today))
    }

    pub fn period_state(&self) -> Result<PeriodState> {
        Ok(mutators::period_state(&self.snapshot()?))
    }

    pub fn mark_period_start(&mut self, date: CalendarDate) -> Result<()> {
        let write = mutators::mark_period_start(&self.snapshot()?, date);
        self.store.commit(write)?;
        tracing::info!("🩸 Period start marked on {}", date);
        Ok(())
    }

    /// Returns the recorded period duration in days.
    pub fn mark_period_end(&mut self, date: CalendarDate) -> Result<u32> {
        let (write, duration) = mutators::mark_period_end(&self.snapshot()?, date);
        self.store.commit(write)?;
        tracing::info!("✅ Period end marked on {} ({} days)", date, duration);
        Ok(duration)
    }

    pub fn cancel_period(&mut self) -> Result<()> {
        let write = mutators::cancel_period(&self.snapshot()?);
        self.store.commit(write)?;
        tracing::info!("↩️ Active period cancelled, flow data cleared");
        Ok(())
    }

    pub fn mark_ovulation(&mut self, date: CalendarDate) -> Result<()> {
        self.set_ovulation(date, true)
    }

    pub fn unmark_ovulation(&mut self, date: CalendarDate) -> Result<()> {
        self.set_ovulation(date, false)
    }

    fn set_ovulation(&mut self, date: CalendarDate, flagged: bool) -> Result<()> {
        let write = mutators::set_ovulation(&self.snapshot()?, date, flagged);
        self.store.commit(write)?;
        tracing::info!("🌸 Ovulation on {} set to {}", date, flagged);
        Ok(())
    }

    /// Returns whether `date` is marked after the toggle.
    pub fn toggle_ovulation(&mut self, date: CalendarDate) -> Result<bool> {
        let (write, flagged) = mutators::toggle_ovulation(&self.snapshot()?, date);
        self.store.commit(write)?;
        tracing::info!("🌸 Ovulation on {} toggled to {}", date, flagged);
        Ok(flagged)
    }

    pub fn log_flow(&mut self, date: CalendarDate, intensity: u8) -> Result<()> {
        let intensity = FlowIntensity::new(intensity)?;
        let mut flow = self.snapshot()?.flow;
        flow.insert(date, intensity);
        self.store.commit(CycleWrite {
            flow: Some(flow),
            ..Default::default()
        })?;
        tracing::info!("💧 Flow {} logged for {}", intensity.get(), date);
        Ok(())
    }

    /// Stores the log and, when it carries a flow value, the flow record for
    /// that day, in the same batch.
    pub fn save_daily_log(&mut self, entry: NewDailyLog) -> Result<DailyLog> {
        let log = entry.into_log()?;
        let snapshot = self.snapshot()?;

        let flow = log.flow_intensity.map(|intensity| {
            let mut flow = snapshot.flow.clone();
            flow.insert(log.date, intensity);
            flow
        });
        let mut daily_logs = snapshot.daily_logs;
        daily_logs.entry(log.date).or_default().push(log.clone());

        self.store.commit(CycleWrite {
            flow,
            daily_logs: Some(daily_logs),
            ..Default::default()
        })?;
        tracing::info!("📝 Daily log {} saved for {}", log.id, log.date);
        Ok(log)
    }

    pub fn daily_logs_for(&self, date: CalendarDate) -> Result<Vec<DailyLog>> {
        Ok(self
            .snapshot()?
            .daily_logs
            .remove(&date)
            .unwrap_or_default())
    }

    pub fn custom_symptoms(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.custom_symptoms)
    }

    pub fn add_custom_symptom(&mut self, symptom: &str) -> Result<Vec<String>> {
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return Err(EngineError::InvalidInput("symptom must not be empty".into()));
        }
        let mut symptoms = self.snapshot()?.custom_symptoms;
        if symptoms.iter().any(|s| s == symptom) {
            return Ok(symptoms);
        }
        symptoms.push(symptom.to_string());
        self.store.commit(CycleWrite {
            custom_symptoms: Some(symptoms.clone()),
            ..Default::default()
        })?;
        Ok(symptoms)
    }

    pub fn remove_custom_symptom(&mut self, symptom: &str) -> Result<Vec<String>> {
        let mut symptoms = self.snapshot()?.custom_symptoms;
        let before = symptoms.len();
        symptoms.retain(|s| s != symptom.trim());
        if symptoms.len() != before {
            self.store.commit(CycleWrite {
                custom_symptoms: Some(symptoms.clone()),
                ..Default::default()
            })?;
        }
        Ok(symptoms)
    }

    pub fn user_data(&self) -> Result<Option<UserData>> {
        Ok(self.snapshot()?.user_data)
    }

    pub fn complete_onboarding(&mut self, user: UserData, custom_symptoms: Vec<String>) -> Result<()> {
        if user.name.trim().is_empty() {
            return Err(EngineError::InvalidInput("name must not be empty".into()));
        }
        if user.period_start_date.is_none() {
            return Err(EngineError::InvalidInput("period start date is required".into()));
        }
        let custom_symptoms: Vec<String> = custom_symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.store.commit(CycleWrite {
            user_data: Some(user),
            custom_symptoms: (!custom_symptoms.is_empty()).then_some(custom_symptoms),
            onboarding_complete: Some(true),
            ..Default::default()
        })?;
        tracing::info!("🎉 Onboarding complete");
        Ok(())
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<UserData> {
        let mut user = self.snapshot()?.user_data.unwrap_or_default();
        update.apply_to(&mut user);
        self.store.commit(CycleWrite {
            user_data: Some(user.clone()),
            ..Default::default()
        })?;
        Ok(user)
    }

    /// Drops every stored key.
    pub fn reset(&mut self) -> Result<()> {
        self.store.commit(CycleWrite {
            reset: true,
            ..Default::default()
        })?;
        tracing::warn!("🧹 All stored data cleared");
        Ok(())
    }
}
