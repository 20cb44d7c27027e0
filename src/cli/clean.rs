use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Error, error, info,
    management::{FilterOptions, PlaylistCleaner},
    success,
    types::{MutationOutcome, MutationStatus, OutcomeTableRow},
    warning,
};

/// Unfollows the playlists matching `filters`, exactly `ids`, or, when
/// neither is given, the ones picked from an interactive checklist.
///
/// Filters are validated before any request. Nothing is removed without a
/// confirmation unless `yes` is set.
pub async fn clean(
    cleaner: &PlaylistCleaner,
    filters: FilterOptions,
    ids: Vec<String>,
    dry_run: bool,
    yes: bool,
) {
    let criteria = match filters.compile() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let targets: Vec<(String, String)> = if !ids.is_empty() {
        ids.into_iter().map(|id| (id.clone(), id)).collect()
    } else if criteria.is_empty() {
        let pb = super::spinner("Fetching playlists...");
        let result = cleaner
            .list_playlists_with(&criteria, |count| {
                pb.set_message(format!("Fetched {} playlists...", count))
            })
            .await;
        pb.finish_and_clear();

        let all = match result {
            Ok(all) => all,
            Err(e) => error!("Could not fetch playlists. Err: {}", e),
        };
        if all.is_empty() {
            warning!("No playlists found in your library.");
            return;
        }

        match super::select::choose(all) {
            Ok(Some(picked)) if !picked.is_empty() => picked,
            Ok(_) => {
                info!("No playlists selected.");
                return;
            }
            Err(e) => error!("Could not read the selection. Err: {}", e),
        }
    } else {
        let pb = super::spinner("Fetching playlists...");
        let result = cleaner
            .list_playlists_with(&criteria, |count| {
                pb.set_message(format!("Fetched {} playlists...", count))
            })
            .await;
        pb.finish_and_clear();

        match result {
            Ok(matched) => matched.into_iter().map(|p| (p.id, p.name)).collect(),
            Err(e) => error!("Could not fetch playlists. Err: {}", e),
        }
    };

    if targets.is_empty() {
        warning!("No playlists found matching the criteria.");
        return;
    }

    info!("The following playlists will be unfollowed:");
    for (id, name) in &targets {
        println!("  - {} (ID: {})", name, id);
    }

    if !dry_run && !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to unfollow {} playlists?",
                targets.len()
            ))
            .default(false)
            .interact();
        match confirmed {
            Ok(true) => {}
            Ok(false) => {
                info!("Operation cancelled.");
                return;
            }
            Err(e) => error!("Could not read the confirmation. Err: {}", e),
        }
    }

    let ids: Vec<String> = targets.into_iter().map(|(id, _)| id).collect();

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(if dry_run { "Simulating..." } else { "Unfollowing..." });

    let result = cleaner
        .execute_unfollow_with(&ids, dry_run, |outcome| {
            if outcome.status == MutationStatus::Failed {
                pb.println(format!("failed: {}", outcome.playlist_id));
            }
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    match result {
        Ok(outcomes) => report(&outcomes, dry_run),
        Err(Error::Interrupted(interrupted)) => {
            report(&interrupted.completed, dry_run);
            error!(
                "Stopped with {} playlists left. Err: {}",
                interrupted.remaining.len(),
                interrupted.source
            );
        }
        Err(e) => error!("Could not unfollow playlists. Err: {}", e),
    }
}

fn report(outcomes: &[MutationOutcome], dry_run: bool) {
    let rows: Vec<OutcomeTableRow> = outcomes.iter().map(OutcomeTableRow::from).collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }

    if dry_run {
        info!("Dry run: {} playlists would be unfollowed.", outcomes.len());
        return;
    }

    let removed = outcomes.iter().filter(|o| o.is_removed()).count();
    let failed = outcomes.len() - removed;
    if failed == 0 {
        success!("Unfollowed {} playlists.", removed);
    } else {
        warning!("Unfollowed {} playlists, {} failed.", removed, failed);
    }
}
