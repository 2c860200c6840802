//! Static team to club mapping table

use crate::config::schema::MappingConfig;
use std::collections::BTreeMap;

/// Immutable lookup from legacy team name to club name
///
/// Built once per process from the `[mapping]` section and shared behind an
/// `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    rules: BTreeMap<String, String>,
}

impl MappingTable {
    pub fn from_config(config: &MappingConfig) -> Self {
        Self::from_rules(
            config
                .team_to_club
                .iter()
                .map(|(team, club)| (team.as_str(), club.as_str())),
        )
    }

    pub fn from_rules<'a>(rules: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(team, club)| (team.trim().to_string(), club.trim().to_string()))
                .collect(),
        }
    }

    /// Club name mapped to `team_name`, matched exactly after trimming
    pub fn club_for(&self, team_name: &str) -> Option<&str> {
        self.rules.get(team_name.trim()).map(String::as_str)
    }

    pub fn contains(&self, team_name: &str) -> bool {
        self.rules.contains_key(team_name.trim())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }
}
