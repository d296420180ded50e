use std::fmt;
use std::str::FromStr;

use crate::error::RepoIdError;

/// A model repository id of the form `owner/model`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = RepoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| RepoIdError::Malformed(s.to_string()))?;

        if owner.is_empty() || name.is_empty() {
            return Err(RepoIdError::Malformed(s.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
