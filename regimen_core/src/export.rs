//! CSV export of timelines and regimen comparisons.
//!
//! Rows are flattened views of the engine's value objects; the engine
//! itself defines no file format.

use crate::{
    DosageChange, MedicationCategory, MedicationComparison, Result, TimelineEvent,
    TimelineEventKind,
};
use std::io::Write;

impl TimelineEventKind {
    pub fn key(&self) -> &'static str {
        match self {
            TimelineEventKind::Started => "started",
            TimelineEventKind::DoseChanged => "dose_changed",
            TimelineEventKind::Discontinued => "discontinued",
            TimelineEventKind::Reactivated => "reactivated",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimelineEventKind::Started => "Started",
            TimelineEventKind::DoseChanged => "Dose changed",
            TimelineEventKind::Discontinued => "Discontinued",
            TimelineEventKind::Reactivated => "Reactivated",
        }
    }
}

impl DosageChange {
    pub fn key(&self) -> &'static str {
        match self {
            DosageChange::NoChange => "no_change",
            DosageChange::Increased => "increased",
            DosageChange::Decreased => "decreased",
            DosageChange::Changed => "changed",
            DosageChange::Started => "started",
            DosageChange::Discontinued => "discontinued",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DosageChange::NoChange => "No change",
            DosageChange::Increased => "Increased",
            DosageChange::Decreased => "Decreased",
            DosageChange::Changed => "Changed",
            DosageChange::Started => "Started",
            DosageChange::Discontinued => "Discontinued",
        }
    }
}

impl MedicationCategory {
    pub fn label(&self) -> &'static str {
        match self {
            MedicationCategory::AceInhibitor => "ACE inhibitor",
            MedicationCategory::Arb => "ARB",
            MedicationCategory::Arni => "ARNI",
            MedicationCategory::BetaBlocker => "Beta blocker",
            MedicationCategory::Mra => "MRA",
            MedicationCategory::Sglt2Inhibitor => "SGLT2 inhibitor",
            MedicationCategory::Diuretic => "Diuretic",
            MedicationCategory::Anticoagulant => "Anticoagulant",
            MedicationCategory::Antiplatelet => "Antiplatelet",
            MedicationCategory::Antiarrhythmic => "Antiarrhythmic",
            MedicationCategory::Statin => "Statin",
            MedicationCategory::Other => "Other",
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct TimelineRow<'a> {
    date: String,
    medication: &'a str,
    medication_id: String,
    event: &'static str,
    previous_dosage: Option<&'a str>,
    new_dosage: Option<&'a str>,
    category: Option<&'static str>,
}

impl<'a> From<&'a TimelineEvent> for TimelineRow<'a> {
    fn from(event: &'a TimelineEvent) -> Self {
        TimelineRow {
            date: event.date.to_rfc3339(),
            medication: &event.medication_name,
            medication_id: event.medication_id.to_string(),
            event: event.kind.key(),
            previous_dosage: event.previous_dosage.as_deref(),
            new_dosage: event.new_dosage.as_deref(),
            category: event.category.map(|c| c.key()),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct ComparisonRow<'a> {
    medication: &'a str,
    start_dosage: &'a str,
    end_dosage: &'a str,
    change: &'static str,
    category: Option<&'static str>,
}

impl<'a> From<&'a MedicationComparison> for ComparisonRow<'a> {
    fn from(row: &'a MedicationComparison) -> Self {
        ComparisonRow {
            medication: &row.medication_name,
            start_dosage: &row.start_dosage,
            end_dosage: &row.end_dosage,
            change: row.change.key(),
            category: row.category.map(|c| c.key()),
        }
    }
}

/// Write timeline events as CSV with a header row
pub fn write_timeline_csv<W: Write>(events: &[TimelineEvent], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for event in events {
        csv_writer.serialize(TimelineRow::from(event))?;
    }
    csv_writer.flush()?;

    tracing::info!("Exported {} timeline events", events.len());
    Ok(events.len())
}

/// Write comparison rows as CSV with a header row
pub fn write_comparison_csv<W: Write>(rows: &[MedicationComparison], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(ComparisonRow::from(row))?;
    }
    csv_writer.flush()?;

    tracing::info!("Exported {} comparison rows", rows.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn event(kind: TimelineEventKind) -> TimelineEvent {
        TimelineEvent {
            date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            medication_name: "Furosemide".into(),
            medication_id: Uuid::nil(),
            kind,
            previous_dosage: Some("40 mg".into()),
            new_dosage: Some("80 mg".into()),
            category: Some(MedicationCategory::Diuretic),
        }
    }

    #[test]
    fn test_timeline_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        let events = [event(TimelineEventKind::DoseChanged)];
        let count = write_timeline_csv(&events, &mut buf).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,medication,medication_id,event,previous_dosage,new_dosage,category")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-03-01T00:00:00+00:00,Furosemide,"));
        assert!(row.contains(",dose_changed,40 mg,80 mg,diuretic"));
    }

    #[test]
    fn test_comparison_csv_empty_optional_category() {
        let rows = vec![MedicationComparison {
            medication_name: "Dapagliflozin".into(),
            start_dosage: "Not taking".into(),
            end_dosage: "10 mg".into(),
            change: DosageChange::Started,
            category: None,
        }];

        let mut buf = Vec::new();
        write_comparison_csv(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Dapagliflozin,Not taking,10 mg,started,\n"));
    }

    #[test]
    fn test_labels_are_distinct_from_keys() {
        assert_eq!(TimelineEventKind::DoseChanged.label(), "Dose changed");
        assert_eq!(DosageChange::NoChange.key(), "no_change");
        assert_eq!(MedicationCategory::Sglt2Inhibitor.label(), "SGLT2 inhibitor");
    }
}
