use dialoguer::MultiSelect;

use crate::types::PlaylistRecord;

/// Checklist line for one playlist.
pub fn choice_label(record: &PlaylistRecord) -> String {
    format!(
        "{} ({} tracks, Owner: {})",
        record.name,
        record.track_count,
        record.owner_name.as_deref().unwrap_or("N/A")
    )
}

/// `(id, name)` pairs for the checked rows, in collection order.
///
/// Out-of-range or repeated indices are ignored.
pub fn picked(records: Vec<PlaylistRecord>, picks: &[usize]) -> Vec<(String, String)> {
    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| picks.contains(i))
        .map(|(_, p)| (p.id, p.name))
        .collect()
}

/// Shows every playlist as an unchecked checklist. `None` when the user
/// aborts with Esc or `q`.
pub(super) fn choose(
    records: Vec<PlaylistRecord>,
) -> dialoguer::Result<Option<Vec<(String, String)>>> {
    let labels: Vec<String> = records.iter().map(choice_label).collect();
    let picks = MultiSelect::new()
        .with_prompt("Use [↑/↓] to navigate, [space] to select, [enter] to confirm")
        .items(&labels[..])
        .interact_opt()?;

    Ok(picks.map(|picks| picked(records, &picks)))
}
