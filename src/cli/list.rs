use tabled::Table;

use crate::{
    error, info,
    management::{FilterOptions, PlaylistCleaner},
    spotify::playlists::MAX_PAGE_SIZE,
    types::{PlaylistRecord, PlaylistTableRow},
    warning,
};

/// Without filters one API page is requested; with filters the whole
/// collection is fetched, filtered and then paged locally.
pub async fn list(cleaner: &PlaylistCleaner, filters: FilterOptions, page: u32, limit: u32) {
    let criteria = match filters.compile() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit) as usize;

    let (rows, total) = if criteria.is_empty() {
        let pb = super::spinner("Fetching playlists...");
        let result = cleaner.list_page(page, limit).await;
        pb.finish_and_clear();

        match result {
            Ok(p) => (p.items, p.total as usize),
            Err(e) => error!("Could not fetch playlists. Err: {}", e),
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
            Ok(matched) => {
                let total = matched.len();
                let paged: Vec<PlaylistRecord> =
                    matched.into_iter().skip(offset).take(limit as usize).collect();
                (paged, total)
            }
            Err(e) => error!("Could not fetch playlists. Err: {}", e),
        }
    };

    if rows.is_empty() {
        warning!("No playlists found matching your criteria.");
        return;
    }

    let table_rows: Vec<PlaylistTableRow> = rows.iter().map(PlaylistTableRow::from).collect();
    println!("{}", Table::new(table_rows));
    info!(
        "Showing playlists {}-{} of {}.",
        offset + 1,
        offset + rows.len(),
        total
    );
}
