//! The medication ledger and its write-side lifecycle.
//!
//! A `Ledger` is an arena of medication headers, each owning its period
//! history by value. Dosage never changes in place: every edit closes the
//! open period and opens a new one, so closed periods are immutable history.

use crate::{Error, Medication, MedicationCategory, Period, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The full set of medication headers and their period histories
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Ledger {
    #[serde(default)]
    pub medications: Vec<Medication>,
}

/// Dosage fields for a new period
#[derive(Clone, Debug, PartialEq)]
pub struct DoseSpec {
    pub dosage: String,
    pub unit: String,
    pub schedule: String,
}

impl DoseSpec {
    pub fn new(
        dosage: impl Into<String>,
        unit: impl Into<String>,
        schedule: impl Into<String>,
    ) -> Self {
        Self {
            dosage: dosage.into(),
            unit: unit.into(),
            schedule: schedule.into(),
        }
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_medications(medications: Vec<Medication>) -> Self {
        Self { medications }
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == id)
    }

    /// Case-insensitive lookup by display name.
    ///
    /// Prefers an active medication when an archived one shares the name.
    pub fn find_by_name(&self, name: &str) -> Option<&Medication> {
        let wanted = name.trim().to_lowercase();
        let mut matches = self
            .medications
            .iter()
            .filter(|m| m.name.to_lowercase() == wanted);
        let first = matches.next()?;
        if first.is_active {
            return Some(first);
        }
        matches.find(|m| m.is_active).or(Some(first))
    }

    pub fn active_medications(&self) -> impl Iterator<Item = &Medication> {
        self.medications.iter().filter(|m| m.is_active)
    }

    /// Add a new active medication with an open initial period at `at`
    pub fn add_medication(
        &mut self,
        name: impl Into<String>,
        dose: DoseSpec,
        is_diuretic: bool,
        category: Option<MedicationCategory>,
        at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Ledger("medication name must not be empty".into()));
        }

        let period = Period::open(
            dose.dosage.clone(),
            dose.unit.clone(),
            dose.schedule.clone(),
            at,
        );
        let medication = Medication {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            is_diuretic,
            category,
            is_active: true,
            archived_at: None,
            created_at: at,
            dosage: dose.dosage,
            unit: dose.unit,
            schedule: dose.schedule,
            periods: vec![period],
        };
        let id = medication.id;

        tracing::info!("Added medication {} ({})", medication.name, id);
        self.medications.push(medication);
        Ok(id)
    }

    /// Close the open period at `at` and open a new one with `dose`
    pub fn change_dosage(&mut self, id: Uuid, dose: DoseSpec, at: DateTime<Utc>) -> Result<()> {
        let medication = self.get_mut(id)?;
        if !medication.is_active {
            return Err(Error::Ledger(format!(
                "cannot change dosage of archived medication {}",
                medication.name
            )));
        }

        close_open_period(medication, at)?;
        medication
            .periods
            .push(Period::open(dose.dosage, dose.unit, dose.schedule, at));

        tracing::info!(
            "Changed dosage of {} to {}",
            medication.name,
            medication
                .periods
                .last()
                .map(|p| p.dosage_text())
                .unwrap_or_default()
        );
        Ok(())
    }

    /// Retire a medication, closing its open period at `at`
    pub fn archive(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let medication = self.get_mut(id)?;
        if !medication.is_active {
            return Err(Error::Ledger(format!(
                "medication {} is already archived",
                medication.name
            )));
        }

        close_open_period(medication, at)?;
        medication.is_active = false;
        medication.archived_at = Some(at);

        tracing::info!("Archived medication {}", medication.name);
        Ok(())
    }

    /// Bring an archived medication back with a new open period at `at`
    pub fn reactivate(&mut self, id: Uuid, dose: DoseSpec, at: DateTime<Utc>) -> Result<()> {
        let medication = self.get_mut(id)?;
        if medication.is_active {
            return Err(Error::Ledger(format!(
                "medication {} is already active",
                medication.name
            )));
        }
        if let Some(archived_at) = medication.archived_at {
            if at < archived_at {
                return Err(Error::Ledger(format!(
                    "cannot reactivate {} before it was archived",
                    medication.name
                )));
            }
        }

        // Tolerate records archived without their period being closed
        let closed_at = medication.archived_at.unwrap_or(at);
        close_open_period(medication, closed_at)?;

        medication
            .periods
            .push(Period::open(dose.dosage, dose.unit, dose.schedule, at));
        medication.is_active = true;
        medication.archived_at = None;

        tracing::info!("Reactivated medication {}", medication.name);
        Ok(())
    }

    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Ledger("medication name must not be empty".into()));
        }
        self.get_mut(id)?.name = name.trim().to_string();
        Ok(())
    }

    pub fn set_diuretic(&mut self, id: Uuid, is_diuretic: bool) -> Result<()> {
        self.get_mut(id)?.is_diuretic = is_diuretic;
        Ok(())
    }

    pub fn set_category(&mut self, id: Uuid, category: Option<MedicationCategory>) -> Result<()> {
        self.get_mut(id)?.category = category;
        Ok(())
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Medication> {
        self.medications
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::Ledger(format!("unknown medication {}", id)))
    }
}

/// Set `end = at` on the open period, if there is one
fn close_open_period(medication: &mut Medication, at: DateTime<Utc>) -> Result<()> {
    let Some(period) = medication.periods.iter_mut().find(|p| p.is_open()) else {
        tracing::debug!("No open period to close for {}", medication.name);
        return Ok(());
    };

    if at < period.start {
        return Err(Error::Ledger(format!(
            "change for {} at {} predates its current period start {}",
            medication.name, at, period.start
        )));
    }

    period.end = Some(at);
    Ok(())
}
