use serde::Serialize;

/// Who submitted the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Contact {
    /// Whether this contact is the principal investigator.
    pub pi: Option<bool>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub institution: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub fax: Option<String>,
    pub url: Option<String>,
}

impl Contact {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Project the observation is charged to.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Project {
    pub project: Option<String>,
}

impl Project {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
        }
    }
}
