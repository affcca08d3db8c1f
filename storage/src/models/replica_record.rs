//! Replica record model: an AI persona representing a specific person.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of the represented person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaStatus {
    Living,
    Deceased,
    Unknown,
}

impl ReplicaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaStatus::Living => "living",
            ReplicaStatus::Deceased => "deceased",
            ReplicaStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "deceased" => ReplicaStatus::Deceased,
            "unknown" => ReplicaStatus::Unknown,
            _ => ReplicaStatus::Living,
        }
    }
}

/// Training state of the replica's derived namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    Untrained,
    Training,
    Trained,
}

impl TrainingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::Untrained => "untrained",
            TrainingStatus::Training => "training",
            TrainingStatus::Trained => "trained",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "training" => TrainingStatus::Training,
            "trained" => TrainingStatus::Trained,
            _ => TrainingStatus::Untrained,
        }
    }
}

/// A persona model representing a person other than the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Relationship label: mother, father, friend, ...
    pub relationship: Option<String>,
    pub description: Option<String>,
    pub status: ReplicaStatus,
    /// Open-ended descriptors, e.g. {"humor": "dry", "empathy": "high"}.
    pub personality_traits: BTreeMap<String, String>,
    pub speaking_style: BTreeMap<String, String>,
    pub training_status: TrainingStatus,
    /// Derived vector-index namespace; set by the training step.
    pub memory_namespace: Option<String>,
    pub total_memories: i64,
    pub last_trained_at: Option<DateTime<Utc>>,
    pub interaction_count: i64,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ReplicaRecord {
    /// Creates a new untrained replica with a generated UUID.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            relationship: None,
            description: None,
            status: ReplicaStatus::Living,
            personality_traits: BTreeMap::new(),
            speaking_style: BTreeMap::new(),
            training_status: TrainingStatus::Untrained,
            memory_namespace: None,
            total_memories: 0,
            last_trained_at: None,
            interaction_count: 0,
            last_interaction_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    pub fn with_status(mut self, status: ReplicaStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_personality_trait(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.personality_traits.insert(key.into(), value.into());
        self
    }

    pub fn with_speaking_style(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.speaking_style.insert(key.into(), value.into());
        self
    }
}
