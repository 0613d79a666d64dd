//! Shield rule model
//!
//! The gate never patches rules in place: it computes the complete target
//! rule set from the allow-list and commits that as one unit.

use serde::{Deserialize, Serialize};
use sleepguard_api::{AllowKind, AllowList};
use std::collections::BTreeSet;

/// Block every item of one kind except the listed tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAllExcept {
    pub except: BTreeSet<String>,
}

impl BlockAllExcept {
    pub fn blocks(&self, token: &str) -> bool {
        !self.except.contains(token)
    }
}

/// The full set of blocking rules applied while a session is enforced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldRules {
    pub applications: BlockAllExcept,
    pub categories: BlockAllExcept,
    pub web_domains: BlockAllExcept,
}

impl ShieldRules {
    pub fn from_allow_list(allow_list: &AllowList) -> Self {
        Self {
            applications: BlockAllExcept {
                except: allow_list.applications.clone(),
            },
            categories: BlockAllExcept {
                except: allow_list.categories.clone(),
            },
            web_domains: BlockAllExcept {
                except: allow_list.web_domains.clone(),
            },
        }
    }

    /// Whether `token` of the given kind is blocked under these rules
    pub fn blocks(&self, kind: AllowKind, token: &str) -> bool {
        match kind {
            AllowKind::Application => self.applications.blocks(token),
            AllowKind::Category => self.categories.blocks(token),
            AllowKind::WebDomain => self.web_domains.blocks(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_blocks_everything() {
        let rules = ShieldRules::from_allow_list(&AllowList::default());
        assert!(rules.blocks(AllowKind::Application, "com.example.game"));
        assert!(rules.blocks(AllowKind::Category, "social"));
        assert!(rules.blocks(AllowKind::WebDomain, "video.example"));
    }

    #[test]
    fn allowed_tokens_are_exempt_per_kind() {
        let mut allow = AllowList::default();
        allow.insert(AllowKind::Application, "com.example.alarm");
        allow.insert(AllowKind::WebDomain, "weather.example");

        let rules = ShieldRules::from_allow_list(&allow);
        assert!(!rules.blocks(AllowKind::Application, "com.example.alarm"));
        assert!(rules.blocks(AllowKind::Application, "com.example.game"));
        assert!(!rules.blocks(AllowKind::WebDomain, "weather.example"));
        // Exemptions do not leak across kinds
        assert!(rules.blocks(AllowKind::Category, "com.example.alarm"));
    }

    #[test]
    fn same_allow_list_yields_same_rules() {
        let mut allow = AllowList::default();
        allow.insert(AllowKind::Category, "health");
        assert_eq!(
            ShieldRules::from_allow_list(&allow),
            ShieldRules::from_allow_list(&allow.clone())
        );
    }
}
