//! The appointment store collaborator.
//!
//! The engine only needs one query from persistence: "which stored
//! appointments intersect this interval, ignoring the one being edited".
//! [`InMemoryRepository`] answers it from a map and backs the CLI and tests;
//! a database-backed store implements the same trait with a
//! `start < $end AND end > $start AND id <> $exclude` query.

use std::collections::BTreeMap;

use crate::error::RepositoryError;
use crate::model::{Appointment, AppointmentId, AppointmentRef, Interval};

pub trait AppointmentRepository {
    /// Stored appointments whose interval overlaps `candidate` under the
    /// half-open rule, excluding `exclude` when given.
    ///
    /// Order is up to the implementation.
    fn find_overlapping(
        &self,
        candidate: &Interval,
        exclude: Option<AppointmentId>,
    ) -> Result<Vec<AppointmentRef>, RepositoryError>;
}

impl<R: AppointmentRepository + ?Sized> AppointmentRepository for &R {
    fn find_overlapping(
        &self,
        candidate: &Interval,
        exclude: Option<AppointmentId>,
    ) -> Result<Vec<AppointmentRef>, RepositoryError> {
        (**self).find_overlapping(candidate, exclude)
    }
}

/// Appointments held in memory, keyed and iterated by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    appointments: BTreeMap<AppointmentId, Appointment>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::AlreadyExists`] on a duplicate id.
    pub fn from_appointments<I>(appointments: I) -> Result<Self, RepositoryError>
    where
        I: IntoIterator<Item = Appointment>,
    {
        let mut repo = Self::new();
        for appt in appointments {
            repo.insert(appt)?;
        }
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    /// The id a newly created appointment would receive.
    pub fn next_id(&self) -> AppointmentId {
        self.appointments.keys().next_back().map_or(1, |id| id + 1)
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::AlreadyExists`] if the id is taken.
    pub fn insert(&mut self, appointment: Appointment) -> Result<(), RepositoryError> {
        if self.appointments.contains_key(&appointment.id) {
            return Err(RepositoryError::AlreadyExists(appointment.id));
        }
        self.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no appointment has this id.
    pub fn update(&mut self, appointment: Appointment) -> Result<(), RepositoryError> {
        match self.appointments.get_mut(&appointment.id) {
            Some(slot) => {
                *slot = appointment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(appointment.id)),
        }
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no appointment has this id.
    pub fn delete(&mut self, id: AppointmentId) -> Result<Appointment, RepositoryError> {
        self.appointments
            .remove(&id)
            .ok_or(RepositoryError::NotFound(id))
    }
}

impl AppointmentRepository for InMemoryRepository {
    fn find_overlapping(
        &self,
        candidate: &Interval,
        exclude: Option<AppointmentId>,
    ) -> Result<Vec<AppointmentRef>, RepositoryError> {
        Ok(self
            .appointments
            .values()
            .filter(|appt| Some(appt.id) != exclude)
            .filter(|appt| appt.interval.overlaps(candidate))
            .map(Appointment::to_ref)
            .collect())
    }
}
