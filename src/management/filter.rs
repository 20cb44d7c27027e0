//! Pure predicates over fetched playlists.
//!
//! [`FilterOptions`] is the raw input (as typed on the command line);
//! [`FilterOptions::compile`] validates it into [`Criteria`] before anything
//! touches the network. All given criteria must hold for a record to match.

use regex::Regex;

use crate::{error::FilterError, types::PlaylistRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Regular expression searched in the playlist name.
    pub name: Option<String>,
    /// `me`, `not-me`, or a literal user id.
    pub owner: Option<String>,
    pub collaborative: Option<bool>,
    pub empty: bool,
    pub no_description: bool,
}

impl FilterOptions {
    pub fn compile(&self) -> Result<Criteria, FilterError> {
        let name = match &self.name {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| FilterError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(Criteria {
            name,
            owner: self.owner.as_deref().map(OwnerFilter::parse),
            collaborative: self.collaborative,
            empty: self.empty,
            no_description: self.no_description,
            user_id: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerFilter {
    Me,
    NotMe,
    Id(String),
}

impl OwnerFilter {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            v if v.eq_ignore_ascii_case("me") => OwnerFilter::Me,
            v if v.eq_ignore_ascii_case("not-me") => OwnerFilter::NotMe,
            v => OwnerFilter::Id(v.to_string()),
        }
    }
}

/// Validated filter set.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    name: Option<Regex>,
    owner: Option<OwnerFilter>,
    collaborative: Option<bool>,
    empty: bool,
    no_description: bool,
    user_id: Option<String>,
}

impl Criteria {
    /// True when no criterion is set, i.e. everything matches.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.owner.is_none()
            && self.collaborative.is_none()
            && !self.empty
            && !self.no_description
    }

    /// `owner = me / not-me` compare against the authenticated user.
    pub fn needs_user_id(&self) -> bool {
        matches!(self.owner, Some(OwnerFilter::Me | OwnerFilter::NotMe)) && self.user_id.is_none()
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn owner(&self) -> Option<&OwnerFilter> {
        self.owner.as_ref()
    }

    pub fn matches(&self, record: &PlaylistRecord) -> bool {
        self.name
            .as_ref()
            .is_none_or(|re| re.is_match(&record.name))
            && self.owner_matches(record)
            && self
                .collaborative
                .is_none_or(|c| record.is_collaborative == c)
            && (!self.empty || record.track_count == 0)
            && (!self.no_description || record.description.as_deref().is_none_or(str::is_empty))
    }

    fn owner_matches(&self, record: &PlaylistRecord) -> bool {
        match (&self.owner, &self.user_id) {
            (None, _) => true,
            (Some(OwnerFilter::Id(id)), _) => &record.owner_id == id,
            (Some(OwnerFilter::Me), Some(me)) => &record.owner_id == me,
            (Some(OwnerFilter::NotMe), Some(me)) => &record.owner_id != me,
            // Unresolved user: nothing can be proven to be ours or not.
            (Some(_), None) => false,
        }
    }
}

/// Free-function form of [`Criteria::matches`].
pub fn matches(record: &PlaylistRecord, criteria: &Criteria) -> bool {
    criteria.matches(record)
}

/// Keeps the records that satisfy `criteria`, in their original order.
pub fn apply(records: Vec<PlaylistRecord>, criteria: &Criteria) -> Vec<PlaylistRecord> {
    records.into_iter().filter(|r| criteria.matches(r)).collect()
}
