//! Core domain types for the medication regimen engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - The ledger model (medication headers and their dosage periods)
//! - Reconstructed snapshots of a regimen at a point in time
//! - Timeline events derived from period history
//! - Classified comparisons between two snapshots

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Ledger Model
// ============================================================================

/// Clinical category a medication can be tagged with
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MedicationCategory {
    AceInhibitor,
    Arb,
    Arni,
    BetaBlocker,
    Mra,
    Sglt2Inhibitor,
    Diuretic,
    Anticoagulant,
    Antiplatelet,
    Antiarrhythmic,
    Statin,
    Other,
}

impl MedicationCategory {
    pub const ALL: [MedicationCategory; 12] = [
        MedicationCategory::AceInhibitor,
        MedicationCategory::Arb,
        MedicationCategory::Arni,
        MedicationCategory::BetaBlocker,
        MedicationCategory::Mra,
        MedicationCategory::Sglt2Inhibitor,
        MedicationCategory::Diuretic,
        MedicationCategory::Anticoagulant,
        MedicationCategory::Antiplatelet,
        MedicationCategory::Antiarrhythmic,
        MedicationCategory::Statin,
        MedicationCategory::Other,
    ];

    /// Machine key used in files and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            MedicationCategory::AceInhibitor => "ace_inhibitor",
            MedicationCategory::Arb => "arb",
            MedicationCategory::Arni => "arni",
            MedicationCategory::BetaBlocker => "beta_blocker",
            MedicationCategory::Mra => "mra",
            MedicationCategory::Sglt2Inhibitor => "sglt2_inhibitor",
            MedicationCategory::Diuretic => "diuretic",
            MedicationCategory::Anticoagulant => "anticoagulant",
            MedicationCategory::Antiplatelet => "antiplatelet",
            MedicationCategory::Antiarrhythmic => "antiarrhythmic",
            MedicationCategory::Statin => "statin",
            MedicationCategory::Other => "other",
        }
    }

    /// Parse a category key (case-insensitive, dashes accepted)
    pub fn from_key(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.key() == normalized)
    }
}

/// One immutable, dated dosage version of a medication.
///
/// `end` is exclusive-or-open: `None` means the period is still running.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub id: Uuid,
    pub dosage: String,
    pub unit: String,
    pub schedule: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    /// Open a new period starting at `start`
    pub fn open(
        dosage: impl Into<String>,
        unit: impl Into<String>,
        schedule: impl Into<String>,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dosage: dosage.into(),
            unit: unit.into(),
            schedule: schedule.into(),
            start,
            end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Dosage and unit as display text, e.g. "40 mg"
    pub fn dosage_text(&self) -> String {
        crate::dosage::format_dosage(&self.dosage, &self.unit)
    }

    /// Whether this period was in effect on `date` (both boundaries inclusive)
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start.date_naive() <= date
            && self.end.map_or(true, |end| end.date_naive() >= date)
    }
}

/// Identity-bearing medication header owning its period history.
///
/// `dosage`, `unit` and `schedule` on the header are the legacy values used
/// only when the medication has no periods at all.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub is_diuretic: bool,
    pub category: Option<MedicationCategory>,
    pub is_active: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub dosage: String,
    pub unit: String,
    pub schedule: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl Medication {
    /// Periods ordered by ascending start date
    pub fn sorted_periods(&self) -> Vec<&Period> {
        let mut periods: Vec<&Period> = self.periods.iter().collect();
        periods.sort_by_key(|p| p.start);
        periods
    }

    /// The currently open period, if any
    pub fn open_period(&self) -> Option<&Period> {
        self.periods.iter().find(|p| p.is_open())
    }

    /// Header-level dosage text used for legacy records without periods
    pub fn header_dosage_text(&self) -> String {
        crate::dosage::format_dosage(&self.dosage, &self.unit)
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// A single medication as it was taken on the snapshot date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationSnapshot {
    pub medication_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub unit: String,
    pub schedule: String,
    pub is_diuretic: bool,
    pub category: Option<MedicationCategory>,
    pub period_start: DateTime<Utc>,
}

impl MedicationSnapshot {
    pub fn dosage_text(&self) -> String {
        crate::dosage::format_dosage(&self.dosage, &self.unit)
    }
}

/// The reconstructed regimen in effect on one date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegimenSnapshot {
    pub date: NaiveDate,
    pub medications: Vec<MedicationSnapshot>,
}

impl RegimenSnapshot {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.medications.len()
    }
}

// ============================================================================
// Timeline Types
// ============================================================================

/// Kind of change a timeline event records
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    Started,
    DoseChanged,
    Discontinued,
    Reactivated,
}

/// A discrete, dated change derived from a medication's period history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub date: DateTime<Utc>,
    pub medication_name: String,
    pub medication_id: Uuid,
    pub kind: TimelineEventKind,
    pub previous_dosage: Option<String>,
    pub new_dosage: Option<String>,
    pub category: Option<MedicationCategory>,
}

// ============================================================================
// Comparison Types
// ============================================================================

/// Classification of how one medication changed between two snapshots
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DosageChange {
    NoChange,
    Increased,
    Decreased,
    Changed,
    Started,
    Discontinued,
}

impl DosageChange {
    pub fn is_change(&self) -> bool {
        !matches!(self, DosageChange::NoChange)
    }
}

/// One medication's row in a regimen diff
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationComparison {
    pub medication_name: String,
    pub start_dosage: String,
    pub end_dosage: String,
    pub change: DosageChange,
    pub category: Option<MedicationCategory>,
}
