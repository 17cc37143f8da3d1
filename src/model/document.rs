use super::{
    Contact, Device, History, IntelligentAgent, Observation, Project, Score, Telescope, TimeBound,
};
use crate::errors::RtmlError;
use serde::Serialize;

rtml_vocabulary! {
    /// Purpose of a document. The string forms are the 2.2 `type` values;
    /// 3.1a uses the `mode` names from [`DocumentType::mode_str`].
    DocumentType("document type") {
        Request => "request",
        Score => "score",
        Confirmation => "confirmation",
        Reject => "reject",
        Update => "update",
        Observation => "observation",
        Incomplete => "incomplete",
        Fail => "fail",
        Abort => "abort",
    }
}

impl DocumentType {
    /// Name used by the 3.1a `mode` attribute.
    pub fn mode_str(&self) -> &'static str {
        match self {
            DocumentType::Request => "request",
            DocumentType::Score => "inquiry",
            DocumentType::Confirmation => "confirm",
            DocumentType::Reject => "reject",
            DocumentType::Update => "update",
            DocumentType::Observation => "complete",
            DocumentType::Incomplete => "incomplete",
            DocumentType::Fail => "fail",
            DocumentType::Abort => "abort",
        }
    }

    pub fn from_mode(mode: &str) -> Result<Self, RtmlError> {
        DocumentType::ALL
            .iter()
            .copied()
            .find(|t| t.mode_str() == mode)
            .ok_or_else(|| RtmlError::value("model::DocumentType", "mode", mode))
    }

    /// Rejections and failures may carry an error string.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DocumentType::Reject | DocumentType::Fail | DocumentType::Abort
        )
    }
}

/// A whole RTML document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    document_type: Option<DocumentType>,
    /// Version string as read from the source document.
    pub version: Option<String>,
    /// 3.1a document uid.
    pub uid: Option<String>,
    pub contact: Option<Contact>,
    pub project: Option<Project>,
    pub intelligent_agent: Option<IntelligentAgent>,
    pub telescope: Option<Telescope>,
    pub device: Option<Device>,
    observations: Vec<Observation>,
    /// May be NaN.
    pub score: Option<f64>,
    pub completion_time: Option<TimeBound>,
    error_string: Option<String>,
    pub history: Option<History>,
    scores: Vec<Score>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(document_type: DocumentType) -> Self {
        Self {
            document_type: Some(document_type),
            ..Self::default()
        }
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.document_type
    }

    /// Changing to a non-error type drops any error string.
    pub fn set_document_type(&mut self, document_type: DocumentType) {
        if !document_type.is_error() {
            self.error_string = None;
        }
        self.document_type = Some(document_type);
    }

    pub fn set_document_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.set_document_type(value.parse()?);
        Ok(())
    }

    pub fn is_error(&self) -> bool {
        self.document_type.is_some_and(|t| t.is_error())
    }

    pub fn error_string(&self) -> Option<&str> {
        self.error_string.as_deref()
    }

    /// Only reject, fail and abort documents carry an error string.
    pub fn set_error_string(&mut self, error: impl Into<String>) -> Result<(), RtmlError> {
        let error = error.into();
        if !self.is_error() {
            let current = self.document_type.map_or("none", |t| t.as_str());
            return Err(RtmlError::value(
                "model::Document",
                "error string for document type",
                current,
            ));
        }
        self.error_string = Some(error);
        Ok(())
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn observations_mut(&mut self) -> &mut [Observation] {
        &mut self.observations
    }

    pub fn add_observation(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn clear_observations(&mut self) {
        self.observations.clear();
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn add_score(&mut self, score: Score) {
        self.scores.push(score);
    }

    pub fn clear_scores(&mut self) {
        self.scores.clear();
    }
}
