//! Role requirements of routes
//!
//! The checker only intersects sets: the hierarchy is supplied once at
//! construction and never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;

/// Role -> roles it implies, e.g. `ROLE_ADMIN = ["ROLE_USER"]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleHierarchy {
    roles: BTreeMap<String, Vec<String>>,
}

impl RoleHierarchy {
    pub fn new(roles: BTreeMap<String, Vec<String>>) -> Self {
        Self { roles }
    }

    pub fn insert<I, S>(&mut self, role: impl Into<String>, implied: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .insert(role.into(), implied.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Every role reachable from `user_roles`, the roles themselves included
    pub fn expand<S: AsRef<str>>(&self, user_roles: &[S]) -> BTreeSet<String> {
        let mut reachable = BTreeSet::new();
        let mut pending: Vec<String> = user_roles.iter().map(|r| r.as_ref().to_string()).collect();

        while let Some(role) = pending.pop() {
            if let Some(implied) = self.roles.get(&role) {
                pending.extend(implied.iter().filter(|r| !reachable.contains(*r)).cloned());
            }
            reachable.insert(role);
        }
        reachable
    }
}

/// Decides whether a user may call a route
#[derive(Debug, Clone, Default)]
pub struct RoleChecker {
    hierarchy: RoleHierarchy,
}

impl RoleChecker {
    pub fn new(hierarchy: RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// `user_roles` is `None` for anonymous requests. An empty requirement
    /// lets everyone through.
    pub fn check_access<S: AsRef<str>>(
        &self,
        required: &[String],
        user_roles: Option<&[S]>,
    ) -> Result<(), ValidationError> {
        if required.is_empty() {
            return Ok(());
        }
        let user_roles = user_roles.ok_or_else(ValidationError::access_denied)?;
        let granted = self.hierarchy.expand(user_roles);
        if required.iter().any(|role| granted.contains(role)) {
            Ok(())
        } else {
            Err(ValidationError::access_denied())
        }
    }
}
