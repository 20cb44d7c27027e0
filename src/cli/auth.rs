use tabled::{builder::Builder, settings::Style};

use crate::{error, info, management::PlaylistCleaner, success};

/// Makes sure a usable credential is stored, running the browser flow when
/// needed (or always, with `force`).
pub async fn auth(cleaner: &PlaylistCleaner, force: bool) {
    if let Err(e) = cleaner.authenticate(force).await {
        error!("Authentication failed. Err: {}", e);
    }
    success!("Authenticated with Spotify.");
}

pub async fn test_auth(cleaner: &PlaylistCleaner) {
    info!("Attempting to fetch user profile...");

    let user = match cleaner.test_auth().await {
        Ok(user) => user,
        Err(e) => error!("Authentication test failed. Err: {}", e),
    };

    success!("Authentication test successful!");

    let mut builder = Builder::default();
    builder.push_record([
        "Display Name:".to_string(),
        user.display_name.unwrap_or_else(|| "N/A".to_string()),
    ]);
    builder.push_record(["ID:".to_string(), user.id]);
    builder.push_record([
        "Email:".to_string(),
        user.email
            .unwrap_or_else(|| "N/A (permission not granted)".to_string()),
    ]);
    if let Some(url) = user.external_urls.spotify {
        builder.push_record(["Profile URL:".to_string(), url]);
    }

    let mut table = builder.build();
    table.with(Style::blank());
    println!("{}", table);
}

pub async fn logout(cleaner: &PlaylistCleaner) {
    if let Err(e) = cleaner.logout().await {
        error!("Could not remove stored credential. Err: {}", e);
    }
    success!("Stored credential removed.");
}
