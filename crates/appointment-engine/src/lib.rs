//! # appointment-engine
//!
//! Time validation for appointment booking.
//!
//! The engine turns the wall-clock dates and times an operator types into
//! absolute instants, checks them against business hours kept on a fixed
//! business-zone clock, refuses past-dated and overlapping bookings, and keeps
//! a start/end pair consistent while it is edited one field at a time.
//!
//! Persistence and presentation stay outside: the engine asks an
//! [`AppointmentRepository`] for overlapping appointments and a [`Clock`] for
//! the current time, and returns every rejection as a value for the caller to
//! display.
//!
//! ## Modules
//!
//! - [`normalizer`] — wall-clock ↔ instant conversion between business and operator zones
//! - [`policy`] — business-hours, future-dated and duration rules
//! - [`conflict`] — first overlapping appointment for a candidate interval
//! - [`session`] — the start/end edit state machine and submission
//! - [`slots`] — time choices on the business-hours grid
//! - [`upcoming`] — appointments about to start
//! - [`repository`] — the store collaborator and an in-memory store
//! - [`clock`] — the "now" collaborator
//! - [`config`] — zones and business-hour constants
//! - [`model`] — shared value types
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod policy;
pub mod repository;
pub mod session;
pub mod slots;
pub mod upcoming;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use conflict::{ConflictChecker, ConflictResult};
pub use error::{EngineError, RepositoryError};
pub use model::{Appointment, AppointmentId, AppointmentRef, Instant, Interval, WallClock};
pub use normalizer::{convert, to_instant, to_wall_clock, TimeNormalizer, DEFAULT_BUSINESS_ZONE};
pub use policy::{EditRules, IntervalPolicy, ValidationResult};
pub use repository::{AppointmentRepository, InMemoryRepository};
pub use session::{
    check_submission, EditOutcome, EditState, Field, FieldChange, IntervalEditSession, Rejection,
    Submission,
};
pub use slots::{end_slots, selectable_date, start_slots};
pub use upcoming::upcoming;
