//! Snapshot reconstruction: what was being taken on a given date.
//!
//! For each medication the first period (by ascending start) covering the
//! date wins. Boundaries are inclusive on both ends at calendar-day
//! granularity, so on the day of a dose change the outgoing period is the
//! one reported. Callers are responsible for non-overlapping periods.

use crate::{Ledger, Medication, MedicationSnapshot, RegimenSnapshot};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Reconstruct the regimen in effect on `date`
///
/// Pure and deterministic for a fixed ledger. Medications with no matching
/// period (and no legacy fallback) are left out; an empty ledger yields an
/// empty snapshot.
pub fn regimen_as_of(date: NaiveDate, ledger: &Ledger) -> RegimenSnapshot {
    let mut medications: Vec<MedicationSnapshot> = ledger
        .medications()
        .iter()
        .filter_map(|m| medication_as_of(m, date))
        .collect();

    sort_for_display(&mut medications);

    tracing::debug!(
        "Reconstructed regimen for {}: {} of {} medications",
        date,
        medications.len(),
        ledger.medications().len()
    );

    RegimenSnapshot { date, medications }
}

/// The snapshot of a single medication on `date`, if it was being taken
pub fn medication_as_of(medication: &Medication, date: NaiveDate) -> Option<MedicationSnapshot> {
    if medication.periods.is_empty() {
        return legacy_snapshot(medication, date);
    }

    let period = medication
        .sorted_periods()
        .into_iter()
        .find(|p| p.covers(date))?;

    Some(MedicationSnapshot {
        medication_id: medication.id,
        name: medication.name.clone(),
        dosage: period.dosage.clone(),
        unit: period.unit.clone(),
        schedule: period.schedule.clone(),
        is_diuretic: medication.is_diuretic,
        category: medication.category,
        period_start: period.start,
    })
}

/// Records without periods count as taken at header dosage since creation
fn legacy_snapshot(medication: &Medication, date: NaiveDate) -> Option<MedicationSnapshot> {
    if medication.created_at.date_naive() > date {
        return None;
    }

    let still_taking = medication.is_active
        || medication
            .archived_at
            .is_some_and(|archived| archived.date_naive() > date);
    if !still_taking {
        return None;
    }

    tracing::debug!(
        "Using header dosage for {} (no periods recorded)",
        medication.name
    );

    Some(MedicationSnapshot {
        medication_id: medication.id,
        name: medication.name.clone(),
        dosage: medication.dosage.clone(),
        unit: medication.unit.clone(),
        schedule: medication.schedule.clone(),
        is_diuretic: medication.is_diuretic,
        category: medication.category,
        period_start: medication.created_at,
    })
}

/// Display order: diuretics first, then case-insensitive by name
pub fn sort_for_display(medications: &mut [MedicationSnapshot]) {
    medications.sort_by(|a, b| match (a.is_diuretic, b.is_diuretic) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MedicationCategory, Period};
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 10, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn medication(name: &str, is_diuretic: bool, periods: Vec<Period>) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            name: name.into(),
            is_diuretic,
            category: None,
            is_active: true,
            archived_at: None,
            created_at: at(1, 1),
            dosage: "10".into(),
            unit: "mg".into(),
            schedule: "daily".into(),
            periods,
        }
    }

    fn period(dosage: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Period {
        let mut p = Period::open(dosage, "mg", "daily", start);
        p.end = end;
        p
    }

    #[test]
    fn test_selects_period_covering_date() {
        crate::logging::init_test();
        let med = medication(
            "Furosemide",
            true,
            vec![
                period("40", at(1, 1), Some(at(3, 1))),
                period("80", at(3, 1), None),
            ],
        );
        let ledger = Ledger::from_medications(vec![med]);

        let feb = regimen_as_of(date(2, 15), &ledger);
        assert_eq!(feb.medications[0].dosage_text(), "40 mg");

        let apr = regimen_as_of(date(4, 1), &ledger);
        assert_eq!(apr.medications[0].dosage_text(), "80 mg");
        assert_eq!(apr.medications[0].period_start, at(3, 1));
    }

    #[test]
    fn test_boundary_day_returns_first_matching_period() {
        // Stored out of order to check that ascending start order is used
        let med = medication(
            "Furosemide",
            true,
            vec![
                period("80", at(3, 1), None),
                period("40", at(1, 1), Some(at(3, 1))),
            ],
        );
        let ledger = Ledger::from_medications(vec![med]);

        let snapshot = regimen_as_of(date(3, 1), &ledger);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.medications[0].dosage, "40");
    }

    #[test]
    fn test_before_first_period_is_excluded() {
        let med = medication("Bisoprolol", false, vec![period("2.5", at(2, 1), None)]);
        let ledger = Ledger::from_medications(vec![med]);

        assert!(regimen_as_of(date(1, 15), &ledger).is_empty());
    }

    #[test]
    fn test_gap_is_excluded() {
        let med = medication(
            "Spironolactone",
            false,
            vec![
                period("25", at(1, 1), Some(at(1, 31))),
                period("25", at(3, 1), None),
            ],
        );
        let ledger = Ledger::from_medications(vec![med]);

        assert!(regimen_as_of(date(2, 10), &ledger).is_empty());
        assert_eq!(regimen_as_of(date(3, 10), &ledger).len(), 1);
    }

    #[test]
    fn test_legacy_record_uses_header_dosage_since_creation() {
        let mut med = medication("Digoxin", false, vec![]);
        med.created_at = at(6, 1);
        med.dosage = "125".into();
        med.unit = "mcg".into();
        let ledger = Ledger::from_medications(vec![med]);

        let june = regimen_as_of(date(6, 15), &ledger);
        assert_eq!(june.medications[0].dosage_text(), "125 mcg");
        assert_eq!(june.medications[0].period_start, at(6, 1));

        assert!(regimen_as_of(date(5, 1), &ledger).is_empty());
    }

    #[test]
    fn test_archived_legacy_record_excluded_after_archival() {
        let mut med = medication("Digoxin", false, vec![]);
        med.is_active = false;
        med.archived_at = Some(at(8, 1));
        let ledger = Ledger::from_medications(vec![med]);

        assert_eq!(regimen_as_of(date(7, 31), &ledger).len(), 1);
        assert!(regimen_as_of(date(8, 1), &ledger).is_empty());
        assert!(regimen_as_of(date(9, 1), &ledger).is_empty());
    }

    #[test]
    fn test_inactive_legacy_record_without_timestamp_excluded() {
        let mut med = medication("Digoxin", false, vec![]);
        med.is_active = false;
        let ledger = Ledger::from_medications(vec![med]);

        assert!(regimen_as_of(date(7, 1), &ledger).is_empty());
    }

    #[test]
    fn test_diuretics_sort_first_then_alphabetical() {
        let ledger = Ledger::from_medications(vec![
            medication("sacubitril/valsartan", false, vec![period("49/51", at(1, 1), None)]),
            medication("Torsemide", true, vec![period("20", at(1, 1), None)]),
            medication("Bisoprolol", false, vec![period("5", at(1, 1), None)]),
            medication("furosemide", true, vec![period("40", at(1, 1), None)]),
        ]);

        let names: Vec<String> = regimen_as_of(date(2, 1), &ledger)
            .medications
            .into_iter()
            .map(|m| m.name)
            .collect();

        assert_eq!(
            names,
            vec!["furosemide", "Torsemide", "Bisoprolol", "sacubitril/valsartan"]
        );
    }

    #[test]
    fn test_snapshot_carries_header_attributes() {
        let mut med = medication("Eplerenone", false, vec![period("25", at(1, 1), None)]);
        med.category = Some(MedicationCategory::Mra);
        let id = med.id;
        let ledger = Ledger::from_medications(vec![med]);

        let snapshot = regimen_as_of(date(1, 2), &ledger);
        let entry = &snapshot.medications[0];
        assert_eq!(entry.medication_id, id);
        assert_eq!(entry.category, Some(MedicationCategory::Mra));
        assert_eq!(entry.schedule, "daily");
        assert_eq!(snapshot.date, date(1, 2));
    }

    #[test]
    fn test_empty_ledger_yields_empty_snapshot() {
        let snapshot = regimen_as_of(date(1, 1), &Ledger::new());
        assert!(snapshot.is_empty());
    }
}
