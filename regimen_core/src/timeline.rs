//! Change timeline derived from period history.
//!
//! Adjacent periods of one medication are compared in ascending start order:
//! - a period closing on the same calendar day the next one opens is a dose change
//! - a period closing on an earlier day leaves a gap, reported as a
//!   discontinuation followed by a reactivation
//!
//! Archived medications get a terminal discontinuation at their archival
//! timestamp unless one already exists on that day.

use crate::{Ledger, Medication, Period, TimelineEvent, TimelineEventKind};
use chrono::{DateTime, NaiveDate, Utc};

/// All change events in the ledger, most recent first
pub fn timeline(ledger: &Ledger) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = ledger
        .medications()
        .iter()
        .flat_map(medication_timeline)
        .collect();

    // Stable sort keeps per-medication order for events sharing a timestamp
    events.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::debug!(
        "Built timeline with {} events across {} medications",
        events.len(),
        ledger.medications().len()
    );

    events
}

/// Timeline events dated between `start` and `end`, both days inclusive
pub fn timeline_between(start: NaiveDate, end: NaiveDate, ledger: &Ledger) -> Vec<TimelineEvent> {
    timeline(ledger)
        .into_iter()
        .filter(|e| {
            let day = e.date.date_naive();
            day >= start && day <= end
        })
        .collect()
}

/// Change events for a single medication, in chronological order
pub fn medication_timeline(medication: &Medication) -> Vec<TimelineEvent> {
    let periods = medication.sorted_periods();

    let Some(first) = periods.first() else {
        return vec![event(
            medication,
            TimelineEventKind::Started,
            medication.created_at,
            None,
            Some(medication.header_dosage_text()),
        )];
    };

    let mut events = vec![event(
        medication,
        TimelineEventKind::Started,
        first.start,
        None,
        Some(first.dosage_text()),
    )];

    for pair in periods.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        push_transition(&mut events, medication, previous, next);
    }

    if !medication.is_active {
        if let Some(last) = periods.last() {
            push_terminal_discontinuation(&mut events, medication, last);
        }
    }

    events
}

fn push_transition(
    events: &mut Vec<TimelineEvent>,
    medication: &Medication,
    previous: &Period,
    next: &Period,
) {
    match previous.end {
        Some(end) if end.date_naive() < next.start.date_naive() => {
            events.push(event(
                medication,
                TimelineEventKind::Discontinued,
                end,
                Some(previous.dosage_text()),
                None,
            ));
            events.push(event(
                medication,
                TimelineEventKind::Reactivated,
                next.start,
                None,
                Some(next.dosage_text()),
            ));
        }
        Some(_) => {
            events.push(dose_changed(medication, previous, next));
        }
        None => {
            tracing::warn!(
                "Period {} of {} was never closed before {} opened; treating as a dose change",
                previous.id,
                medication.name,
                next.id
            );
            events.push(dose_changed(medication, previous, next));
        }
    }
}

fn push_terminal_discontinuation(
    events: &mut Vec<TimelineEvent>,
    medication: &Medication,
    last: &Period,
) {
    let Some(closed_at) = medication.archived_at.or(last.end) else {
        tracing::warn!(
            "{} is inactive but has neither an archival timestamp nor a closed period",
            medication.name
        );
        return;
    };

    let already_recorded = events.iter().any(|e| {
        e.kind == TimelineEventKind::Discontinued
            && e.date.date_naive() == closed_at.date_naive()
    });
    if already_recorded {
        return;
    }

    if last.end.map(|end| end.date_naive()) != Some(closed_at.date_naive()) {
        tracing::warn!(
            "{} was archived on {} but its last period does not end that day",
            medication.name,
            closed_at.date_naive()
        );
    }

    events.push(event(
        medication,
        TimelineEventKind::Discontinued,
        closed_at,
        Some(last.dosage_text()),
        None,
    ));
}

fn dose_changed(medication: &Medication, previous: &Period, next: &Period) -> TimelineEvent {
    event(
        medication,
        TimelineEventKind::DoseChanged,
        next.start,
        Some(previous.dosage_text()),
        Some(next.dosage_text()),
    )
}

fn event(
    medication: &Medication,
    kind: TimelineEventKind,
    date: DateTime<Utc>,
    previous_dosage: Option<String>,
    new_dosage: Option<String>,
) -> TimelineEvent {
    TimelineEvent {
        date,
        medication_name: medication.name.clone(),
        medication_id: medication.id,
        kind,
        previous_dosage,
        new_dosage,
        category: medication.category,
    }
}
