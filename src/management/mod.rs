mod auth;
mod cleaner;
mod fetcher;
pub mod filter;
mod mutation;
mod store;

pub use auth::{AuthManager, AuthorizationPrompt, BrowserPrompt, REFRESH_MARGIN_SECS, TokenProvider};
pub use cleaner::PlaylistCleaner;
pub use fetcher::PlaylistFetcher;
pub use filter::{Criteria, FilterOptions, OwnerFilter};
pub use mutation::MutationExecutor;
pub use store::{
    ACCOUNT_NAME, FileSecretStore, KeyringSecretStore, MemorySecretStore, SERVICE_NAME,
    SecretStore, TokenStore,
};
