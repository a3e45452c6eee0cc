//! Property tests for reconstruction, timeline and comparison invariants.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use regimen_core::*;
use std::collections::HashSet;
use uuid::Uuid;

/// (gap before period in days, period length in days, dosage)
type PeriodShape = (i64, i64, u32);

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

fn shapes(min_gap: i64) -> impl Strategy<Value = Vec<PeriodShape>> {
    prop::collection::vec((min_gap..min_gap + 5, 1i64..40, 1u32..200), 1..6)
}

/// Each period starts on the day its predecessor ends
fn contiguous_shapes() -> impl Strategy<Value = Vec<PeriodShape>> {
    prop::collection::vec((Just(0i64), 1i64..40, 1u32..200), 1..6)
}

fn build_medication(name: &str, shapes: &[PeriodShape], open_last: bool) -> Medication {
    let mut cursor = origin();
    let mut periods = Vec::new();

    for (gap, length, dosage) in shapes {
        let start = cursor + Duration::days(*gap);
        let end = start + Duration::days(*length);
        let mut period = Period::open(dosage.to_string(), "mg", "daily", start);
        period.end = Some(end);
        periods.push(period);
        cursor = end;
    }

    if open_last {
        if let Some(last) = periods.last_mut() {
            last.end = None;
        }
    }

    Medication {
        id: Uuid::new_v4(),
        name: name.to_string(),
        is_diuretic: name.ends_with('0'),
        category: None,
        is_active: true,
        archived_at: None,
        created_at: origin(),
        dosage: "1".into(),
        unit: "mg".into(),
        schedule: "daily".into(),
        periods,
    }
}

fn build_ledger(meds: &[Vec<PeriodShape>]) -> Ledger {
    Ledger::from_medications(
        meds.iter()
            .enumerate()
            .map(|(i, shapes)| build_medication(&format!("Med{}", i), shapes, i % 2 == 0))
            .collect(),
    )
}

fn day(offset: i64) -> NaiveDate {
    (origin() + Duration::days(offset)).date_naive()
}

proptest! {
    #[test]
    fn reconstruction_is_deterministic(
        meds in prop::collection::vec(shapes(0), 0..5),
        offset in 0i64..300,
    ) {
        let ledger = build_ledger(&meds);
        prop_assert_eq!(regimen_as_of(day(offset), &ledger), regimen_as_of(day(offset), &ledger));
        prop_assert_eq!(timeline(&ledger), timeline(&ledger));
    }

    #[test]
    fn period_boundaries_are_inclusive(history in shapes(1)) {
        let med = build_medication("Furosemide", &history, false);
        let ledger = Ledger::from_medications(vec![med.clone()]);

        for period in &med.periods {
            let mut boundaries = vec![period.start.date_naive()];
            boundaries.extend(period.end.map(|e| e.date_naive()));

            for boundary in boundaries {
                let snapshot = regimen_as_of(boundary, &ledger);
                prop_assert_eq!(snapshot.len(), 1);
                prop_assert_eq!(&snapshot.medications[0].dosage, &period.dosage);
            }
        }
    }

    #[test]
    fn contiguous_history_has_one_start_and_dose_changes(history in contiguous_shapes()) {
        let med = build_medication("Bisoprolol", &history, true);
        let events = medication_timeline(&med);

        let started = events.iter().filter(|e| e.kind == TimelineEventKind::Started).count();
        let changed = events.iter().filter(|e| e.kind == TimelineEventKind::DoseChanged).count();
        prop_assert_eq!(started, 1);
        prop_assert_eq!(changed, history.len() - 1);
        prop_assert_eq!(events.len(), history.len());
    }

    #[test]
    fn gaps_pair_discontinuation_with_reactivation(history in shapes(1)) {
        let med = build_medication("Spironolactone", &history, true);
        let events = medication_timeline(&med);

        let discontinued: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TimelineEventKind::Discontinued)
            .collect();
        let reactivated: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TimelineEventKind::Reactivated)
            .collect();

        prop_assert_eq!(discontinued.len(), history.len() - 1);
        prop_assert_eq!(reactivated.len(), history.len() - 1);
        for (stop, restart) in discontinued.iter().zip(reactivated.iter()) {
            prop_assert!(stop.date < restart.date);
        }
    }

    #[test]
    fn timeline_is_most_recent_first(meds in prop::collection::vec(shapes(0), 0..5)) {
        let events = timeline(&build_ledger(&meds));
        prop_assert!(events.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn comparing_a_snapshot_with_itself_changes_nothing(
        meds in prop::collection::vec(shapes(0), 0..5),
        offset in 0i64..300,
    ) {
        let snapshot = regimen_as_of(day(offset), &build_ledger(&meds));
        let rows = compare(&snapshot, &snapshot);

        prop_assert_eq!(rows.len(), snapshot.len());
        prop_assert!(rows.iter().all(|r| r.change == DosageChange::NoChange));
    }

    #[test]
    fn comparison_covers_every_name_once(
        meds in prop::collection::vec(shapes(0), 0..6),
        from in 0i64..300,
        to in 0i64..300,
    ) {
        let ledger = build_ledger(&meds);
        let start = regimen_as_of(day(from), &ledger);
        let end = regimen_as_of(day(to), &ledger);
        let rows = compare(&start, &end);

        let expected: HashSet<&str> = start
            .medications
            .iter()
            .chain(end.medications.iter())
            .map(|m| m.name.as_str())
            .collect();
        let seen: Vec<&str> = rows.iter().map(|r| r.medication_name.as_str()).collect();
        let unique: HashSet<&str> = seen.iter().copied().collect();

        prop_assert_eq!(seen.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }
}
