//! Regimen comparison between two snapshots.
//!
//! Medications are matched by name. Dosages that differ are classified as
//! increased or decreased when both leading values parse and the units
//! agree; every other difference degrades to `Changed`.

use crate::dosage::{leading_value, same_dosage};
use crate::{DosageChange, MedicationComparison, MedicationSnapshot, RegimenSnapshot};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Start-side text for a medication absent from the earlier snapshot
pub const NOT_TAKING: &str = "Not taking";

/// End-side text for a medication absent from the later snapshot
pub const DISCONTINUED: &str = "Discontinued";

/// Compare two reconstructed regimens medication by medication
///
/// Every name from either snapshot appears exactly once. Changed entries come
/// first, then unchanged ones, each group ordered by name.
pub fn compare(start: &RegimenSnapshot, end: &RegimenSnapshot) -> Vec<MedicationComparison> {
    let start_by_name = by_name(start);
    let end_by_name = by_name(end);

    let names: BTreeSet<&str> = start_by_name
        .keys()
        .chain(end_by_name.keys())
        .copied()
        .collect();

    let mut rows: Vec<MedicationComparison> = names
        .into_iter()
        .map(|name| {
            compare_one(
                name,
                start_by_name.get(name).copied(),
                end_by_name.get(name).copied(),
            )
        })
        .collect();

    rows.sort_by(|a, b| match (a.change.is_change(), b.change.is_change()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .medication_name
            .to_lowercase()
            .cmp(&b.medication_name.to_lowercase())
            .then_with(|| a.medication_name.cmp(&b.medication_name)),
    });

    tracing::debug!(
        "Compared regimens {} -> {}: {} medications, {} changed",
        start.date,
        end.date,
        rows.len(),
        rows.iter().filter(|r| r.change.is_change()).count()
    );

    rows
}

/// Classify a dosage transition between two snapshot entries
pub fn classify(start: &MedicationSnapshot, end: &MedicationSnapshot) -> DosageChange {
    if same_dosage(&start.dosage, &start.unit, &end.dosage, &end.unit) {
        return DosageChange::NoChange;
    }

    if !start.unit.trim().eq_ignore_ascii_case(end.unit.trim()) {
        return DosageChange::Changed;
    }

    match (leading_value(&start.dosage), leading_value(&end.dosage)) {
        (Some(before), Some(after)) if after > before => DosageChange::Increased,
        (Some(before), Some(after)) if after < before => DosageChange::Decreased,
        _ => DosageChange::Changed,
    }
}

fn compare_one(
    name: &str,
    start: Option<&MedicationSnapshot>,
    end: Option<&MedicationSnapshot>,
) -> MedicationComparison {
    let change = match (start, end) {
        (Some(s), Some(e)) => classify(s, e),
        (None, Some(_)) => DosageChange::Started,
        (Some(_), None) => DosageChange::Discontinued,
        (None, None) => DosageChange::NoChange,
    };

    MedicationComparison {
        medication_name: name.to_string(),
        start_dosage: start
            .map(|s| s.dosage_text())
            .unwrap_or_else(|| NOT_TAKING.to_string()),
        end_dosage: end
            .map(|e| e.dosage_text())
            .unwrap_or_else(|| DISCONTINUED.to_string()),
        change,
        category: start.and_then(|s| s.category).or(end.and_then(|e| e.category)),
    }
}

/// Name-keyed lookup; the first entry wins if a snapshot repeats a name
fn by_name(snapshot: &RegimenSnapshot) -> HashMap<&str, &MedicationSnapshot> {
    let mut lookup = HashMap::new();
    for medication in &snapshot.medications {
        lookup.entry(medication.name.as_str()).or_insert(medication);
    }
    lookup
}
