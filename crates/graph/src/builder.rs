use crate::error::Result;
use crate::rules::{RelationshipRule, RELATIONSHIP_RULES};
use crate::store::{EdgeMode, GraphStore};
use crate::types::{EntityKind, RelationshipType};
use serde::{Deserialize, Serialize};

/// Edges created by one relationship pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub relationship: RelationshipType,
    pub parent: EntityKind,
    pub child: EntityKind,
    pub created: usize,
}

/// Derives every parent -> child edge once all entities are stored.
pub struct RelationshipBuilder {
    rules: Vec<RelationshipRule>,
    mode: EdgeMode,
}

impl RelationshipBuilder {
    pub fn new(mode: EdgeMode) -> Self {
        Self {
            rules: RELATIONSHIP_RULES.to_vec(),
            mode,
        }
    }

    pub fn with_rules(rules: Vec<RelationshipRule>, mode: EdgeMode) -> Self {
        Self { rules, mode }
    }

    pub fn mode(&self) -> EdgeMode {
        self.mode
    }

    /// Run every pass. Passes are independent, so a pass matching nothing is normal.
    pub fn build<S: GraphStore + ?Sized>(&self, store: &mut S) -> Result<Vec<PassStats>> {
        let mut passes = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let created = store.link_where(rule, self.mode)?;
            log::info!(
                "{} ({} -> {}): {} edges",
                rule.relationship,
                rule.parent,
                rule.child,
                created
            );
            passes.push(PassStats {
                relationship: rule.relationship,
                parent: rule.parent,
                child: rule.child,
                created,
            });
        }
        Ok(passes)
    }
}

impl Default for RelationshipBuilder {
    fn default() -> Self {
        Self::new(EdgeMode::default())
    }
}
