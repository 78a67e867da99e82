//! Detect a candidate interval overlapping an existing appointment.
//!
//! Two intervals `[s1, e1)` and `[s2, e2)` conflict when `s1 < e2 && e1 > s2`.
//! Adjacent appointments (one ends exactly when the other starts) are NOT
//! conflicts.
//!
//! The checker keeps no cache: appointments can change between two
//! validations, so every call goes back to the repository.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::{AppointmentId, AppointmentRef, Interval};
use crate::repository::AppointmentRepository;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConflictResult {
    Clear,
    /// The first overlapping appointment, in repository order.
    Conflict(AppointmentRef),
}

impl ConflictResult {
    pub fn is_clear(&self) -> bool {
        matches!(self, ConflictResult::Clear)
    }

    pub fn conflict(&self) -> Option<&AppointmentRef> {
        match self {
            ConflictResult::Clear => None,
            ConflictResult::Conflict(existing) => Some(existing),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConflictChecker<R> {
    repository: R,
}

impl<R: AppointmentRepository> ConflictChecker<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Find the first stored appointment overlapping `candidate`.
    ///
    /// `exclude` is the id of the appointment being edited, or `None` when
    /// booking a new one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Repository`] if the store cannot be queried.
    pub fn find_conflict(
        &self,
        candidate: &Interval,
        exclude: Option<AppointmentId>,
    ) -> Result<ConflictResult> {
        let overlapping = self.repository.find_overlapping(candidate, exclude)?;
        match overlapping.into_iter().next() {
            Some(existing) => {
                info!(
                    %candidate,
                    conflicting_id = existing.id,
                    conflicting = %existing.interval,
                    "candidate overlaps an existing appointment"
                );
                Ok(ConflictResult::Conflict(existing))
            }
            None => Ok(ConflictResult::Clear),
        }
    }
}
