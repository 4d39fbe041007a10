//! Active group sets.

use std::collections::{BTreeMap, BTreeSet};

/// Groups active for one call, after preset and prefix expansion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ActiveGroups {
    groups: Option<BTreeSet<String>>,
}

impl ActiveGroups {
    /// Expands `requested` with `presets`.
    ///
    /// Presets expand once; a dotted group also activates each of its
    /// prefixes. No requested groups means no filtering.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    ///
    /// use mapweave::ActiveGroups;
    ///
    /// let presets = BTreeMap::from([("summary".to_owned(), vec!["user.id".to_owned()])]);
    /// let active = ActiveGroups::expand(&["summary".to_owned()], &presets);
    /// assert!(active.contains("user.id"));
    /// assert!(active.contains("user"));
    /// assert!(!active.contains("summary"));
    /// ```
    #[must_use]
    pub fn expand(requested: &[String], presets: &BTreeMap<String, Vec<String>>) -> Self {
        if requested.is_empty() {
            return Self::default();
        }
        let mut groups = BTreeSet::new();
        for group in requested {
            match presets.get(group) {
                Some(members) => {
                    for member in members {
                        insert_with_prefixes(&mut groups, member);
                    }
                }
                None => insert_with_prefixes(&mut groups, group),
            }
        }
        Self {
            groups: Some(groups),
        }
    }

    /// Returns `true` when no filtering applies.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.groups.is_none()
    }

    /// Returns `true` when `group` is active.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.groups
            .as_ref()
            .is_some_and(|groups| groups.contains(group))
    }

    /// Whether a member tagged with `groups` participates.
    ///
    /// Untagged members only participate in unfiltered calls.
    #[must_use]
    pub fn admits(&self, groups: &[String]) -> bool {
        match &self.groups {
            None => true,
            Some(active) => groups.iter().any(|group| active.contains(group)),
        }
    }
}

fn insert_with_prefixes(groups: &mut BTreeSet<String>, group: &str) {
    let mut prefix = String::new();
    for (position, part) in group.split('.').enumerate() {
        if position > 0 {
            prefix.push('.');
        }
        prefix.push_str(part);
        groups.insert(prefix.clone());
    }
}
