//! Interactive editing of an appointment's start/end date and time.
//!
//! An [`IntervalEditSession`] owns the four slots a booking form shows
//! (start date, start time, end date, end time) for as long as the form is
//! open. Every user edit goes through [`IntervalEditSession::apply`], which
//! works out all dependent slot repairs in one pass and assigns them directly.
//! Derived assignments never feed back into `apply`, so no rule can trigger
//! itself.
//!
//! # Rules
//!
//! | Edited slot | Effect on the other slots |
//! |---|---|
//! | start date | end date follows it forward; follows it backward unless the end time sits before opening (an overnight end) |
//! | end date | never allowed before the start date |
//! | end time | end date becomes start date, or the day after when the end time is earlier than the start time; the edit is refused if the result is longer than the maximum duration |
//! | start time | a start that is not in the future moves to the next day; the end is set to start + default length (short length for late starts) |
//!
//! All rules read times on the business-zone clock, while the slots hold
//! operator-zone wall-clock values.
//!
//! Submitting does not change the session: [`IntervalEditSession::submit`]
//! builds the candidate interval, runs [`IntervalPolicy::validate`] and then
//! the [`ConflictChecker`].

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::conflict::{ConflictChecker, ConflictResult};
use crate::error::Result;
use crate::model::{Appointment, AppointmentId, AppointmentRef, Instant, Interval, WallClock};
use crate::policy::{wall_clock_minutes, EditRules, IntervalPolicy, ValidationResult};
use crate::repository::AppointmentRepository;

// ── Slots and edits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    StartDate,
    StartTime,
    EndDate,
    EndTime,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::StartDate => "start date",
            Field::StartTime => "start time",
            Field::EndDate => "end date",
            Field::EndTime => "end time",
        })
    }
}

/// A user edit of one slot. `None` clears the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldChange {
    StartDate(Option<NaiveDate>),
    StartTime(Option<NaiveTime>),
    EndDate(Option<NaiveDate>),
    EndTime(Option<NaiveTime>),
}

impl FieldChange {
    pub fn field(&self) -> Field {
        match self {
            FieldChange::StartDate(_) => Field::StartDate,
            FieldChange::StartTime(_) => Field::StartTime,
            FieldChange::EndDate(_) => Field::EndDate,
            FieldChange::EndTime(_) => Field::EndTime,
        }
    }
}

/// The four slots of the form, in operator-zone wall-clock terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditState {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
}

impl EditState {
    pub fn start(&self) -> Option<WallClock> {
        Some(WallClock::new(self.start_date?, self.start_time?))
    }

    pub fn end(&self) -> Option<WallClock> {
        Some(WallClock::new(self.end_date?, self.end_time?))
    }

    /// Unset slots, in form order.
    pub fn missing(&self) -> Vec<Field> {
        [
            (Field::StartDate, self.start_date.is_none()),
            (Field::StartTime, self.start_time.is_none()),
            (Field::EndDate, self.end_date.is_none()),
            (Field::EndTime, self.end_time.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, unset)| unset.then_some(field))
        .collect()
    }

    /// Slots whose value differs from `other`.
    fn diff(&self, other: &EditState) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.start_date != other.start_date {
            fields.push(Field::StartDate);
        }
        if self.start_time != other.start_time {
            fields.push(Field::StartTime);
        }
        if self.end_date != other.end_date {
            fields.push(Field::EndDate);
        }
        if self.end_time != other.end_time {
            fields.push(Field::EndTime);
        }
        fields
    }
}

/// What [`IntervalEditSession::apply`] did with an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// `Ok`, or the reason the edit was refused (the slots are then unchanged).
    pub result: ValidationResult,
    /// Slots other than the edited one that were repaired.
    pub adjusted: Vec<Field>,
}

impl EditOutcome {
    fn accepted(adjusted: Vec<Field>) -> Self {
        Self {
            result: ValidationResult::Ok,
            adjusted,
        }
    }

    fn rejected(result: ValidationResult) -> Self {
        Self {
            result,
            adjusted: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.result.is_ok()
    }
}

// ── Submission ──────────────────────────────────────────────────────────────

/// Why a submission was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    MissingFields(Vec<Field>),
    /// The end is not after the start.
    EmptyInterval,
    Policy(ValidationResult),
    Conflict(AppointmentRef),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingFields(fields) => {
                let names: Vec<String> = fields.iter().map(Field::to_string).collect();
                write!(f, "required fields are empty: {}", names.join(", "))
            }
            Rejection::EmptyInterval => f.write_str("end must be after start"),
            Rejection::Policy(result) => write!(f, "{result}"),
            Rejection::Conflict(existing) => write!(
                f,
                "overlaps appointment #{} '{}' {}",
                existing.id, existing.label, existing.interval
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Submission {
    /// The caller may persist this interval.
    Accepted(Interval),
    Rejected(Rejection),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }
}

// ── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct IntervalEditSession<C> {
    policy: IntervalPolicy,
    rules: EditRules,
    clock: C,
    state: EditState,
    seeded: EditState,
    editing: Option<AppointmentId>,
}

impl<C: Clock> IntervalEditSession<C> {
    /// Session for booking a new appointment: both dates default to the
    /// operator's today, both times unset.
    pub fn new_appointment(policy: IntervalPolicy, clock: C) -> Self {
        let today = policy.normalizer().operator_wall(clock.now()).date;
        let state = EditState {
            start_date: Some(today),
            end_date: Some(today),
            ..EditState::default()
        };
        Self::with_state(policy, clock, state, None)
    }

    /// Session for changing `appointment`, seeded with its times as the
    /// operator sees them. The appointment is excluded from conflict checks.
    pub fn edit_appointment(policy: IntervalPolicy, clock: C, appointment: &Appointment) -> Self {
        let normalizer = policy.normalizer();
        let start = normalizer.operator_wall(appointment.interval.start());
        let end = normalizer.operator_wall(appointment.interval.end());
        let state = EditState {
            start_date: Some(start.date),
            start_time: Some(start.time),
            end_date: Some(end.date),
            end_time: Some(end.time),
        };
        Self::with_state(policy, clock, state, Some(appointment.id))
    }

    fn with_state(
        policy: IntervalPolicy,
        clock: C,
        state: EditState,
        editing: Option<AppointmentId>,
    ) -> Self {
        Self {
            rules: policy.edit_rules(),
            policy,
            clock,
            state,
            seeded: state,
            editing,
        }
    }

    /// Override the derived-end lengths taken from the policy.
    pub fn with_rules(mut self, rules: EditRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn policy(&self) -> &IntervalPolicy {
        &self.policy
    }

    /// Id of the appointment being edited, `None` for a new booking.
    pub fn editing(&self) -> Option<AppointmentId> {
        self.editing
    }

    /// Whether any slot differs from the values the session opened with.
    pub fn has_changes(&self) -> bool {
        self.state != self.seeded
    }

    /// Apply one user edit and every repair it implies.
    pub fn apply(&mut self, change: FieldChange) -> EditOutcome {
        let before = self.state;
        let next = match change {
            FieldChange::StartDate(date) => self.start_date_changed(date),
            FieldChange::EndDate(date) => self.end_date_changed(date),
            FieldChange::StartTime(time) => self.start_time_changed(time),
            FieldChange::EndTime(time) => match self.end_time_changed(time) {
                Ok(next) => next,
                Err(result) => {
                    info!(?change, %result, "edit refused");
                    return EditOutcome::rejected(result);
                }
            },
        };

        self.state = next;
        let adjusted: Vec<Field> = before
            .diff(&next)
            .into_iter()
            .filter(|field| *field != change.field())
            .collect();
        if !adjusted.is_empty() {
            debug!(?change, ?adjusted, state = ?next, "dependent fields adjusted");
        }
        EditOutcome::accepted(adjusted)
    }

    fn start_date_changed(&self, date: Option<NaiveDate>) -> EditState {
        let mut next = self.state;
        next.start_date = date;
        if let Some(date) = date {
            self.follow_start_date(&mut next, date);
        }
        next
    }

    /// Keep the end date pinned to a moved start date.
    ///
    /// A backward move leaves the end date alone when the end time is at or
    /// before opening: that end belongs to an overnight appointment.
    fn follow_start_date(&self, next: &mut EditState, start_date: NaiveDate) {
        match next.end_date {
            None => next.end_date = Some(start_date),
            Some(end_date) if start_date > end_date => next.end_date = Some(start_date),
            Some(end_date) if start_date < end_date => {
                let daytime_end = match next.end_time {
                    None => true,
                    Some(end_time) => end_time > self.operator_opening(end_date),
                };
                if daytime_end {
                    next.end_date = Some(start_date);
                }
            }
            Some(_) => {}
        }
    }

    fn end_date_changed(&self, date: Option<NaiveDate>) -> EditState {
        let mut next = self.state;
        next.end_date = match (date, next.start_date) {
            (Some(end), Some(start)) if end < start => Some(start),
            _ => date,
        };
        next
    }

    fn end_time_changed(
        &self,
        time: Option<NaiveTime>,
    ) -> std::result::Result<EditState, ValidationResult> {
        let mut next = self.state;
        next.end_time = time;

        let (Some(end_time), Some(start_date), Some(start_time)) =
            (time, next.start_date, next.start_time)
        else {
            return Ok(next);
        };

        let end_date = if end_time < start_time {
            next_day(start_date)
        } else {
            start_date
        };

        let normalizer = self.policy.normalizer();
        let start = normalizer.operator_to_business(WallClock::new(start_date, start_time));
        let end = normalizer.operator_to_business(WallClock::new(end_date, end_time));
        let verdict = self.policy.check_duration(start, end);
        if !verdict.is_ok() {
            return Err(verdict);
        }

        next.end_date = Some(end_date);
        Ok(next)
    }

    fn start_time_changed(&self, time: Option<NaiveTime>) -> EditState {
        let mut next = self.state;
        next.start_time = time;

        let (Some(start_time), Some(mut start_date)) = (time, next.start_date) else {
            return next;
        };

        let normalizer = self.policy.normalizer();
        let now = normalizer.business_wall(self.clock.now());
        let start = normalizer.operator_to_business(WallClock::new(start_date, start_time));
        if wall_clock_minutes(now, start) <= 0 {
            start_date = next_day(start_date);
            next.start_date = Some(start_date);
        }

        let start = normalizer.operator_to_business(WallClock::new(start_date, start_time));
        let length = if start.time > self.rules.late_start {
            self.rules.late_duration
        } else {
            self.rules.default_duration
        };
        let (end_time, overflow_secs) = start_time.overflowing_add_signed(length);
        next.end_time = Some(end_time);
        next.end_date = Some(if overflow_secs != 0 {
            next_day(start_date)
        } else {
            start_date
        });
        next
    }

    /// Opening time on `date`'s business clock, as an operator wall-clock time.
    fn operator_opening(&self, date: NaiveDate) -> NaiveTime {
        let opening = WallClock::new(date, self.policy.open());
        self.policy.normalizer().business_to_operator(opening).time
    }

    /// The slots as an interval, or why they do not form one.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MissingFields`] or [`Rejection::EmptyInterval`].
    pub fn candidate(&self) -> std::result::Result<Interval, Rejection> {
        let (Some(start), Some(end)) = (self.state.start(), self.state.end()) else {
            return Err(Rejection::MissingFields(self.state.missing()));
        };
        let normalizer = self.policy.normalizer();
        Interval::new(normalizer.operator_instant(start), normalizer.operator_instant(end))
            .map_err(|_| Rejection::EmptyInterval)
    }

    /// Validate the current slots for saving.
    ///
    /// Policy rules run first; the store is only queried for a candidate that
    /// passes them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Repository`] if the conflict query fails.
    /// Every other outcome, including rejections, is `Ok`.
    pub fn submit<R: AppointmentRepository>(
        &self,
        checker: &ConflictChecker<R>,
    ) -> Result<Submission> {
        let candidate = match self.candidate() {
            Ok(candidate) => candidate,
            Err(rejection) => return Ok(self.reject(rejection)),
        };

        check_submission(
            &self.policy,
            checker,
            candidate,
            self.editing,
            self.clock.now(),
        )
    }

    fn reject(&self, rejection: Rejection) -> Submission {
        info!(editing = ?self.editing, %rejection, "submission rejected");
        Submission::Rejected(rejection)
    }
}

/// Final checks for an interval about to be saved: business hours and
/// future-dated, then overlap with stored appointments other than `exclude`.
///
/// The duration limit is not applied here; it only gates interactive edits.
///
/// # Errors
///
/// Returns [`crate::EngineError::Repository`] if the conflict query fails.
pub fn check_submission<R: AppointmentRepository>(
    policy: &IntervalPolicy,
    checker: &ConflictChecker<R>,
    candidate: Interval,
    exclude: Option<AppointmentId>,
    now: Instant,
) -> Result<Submission> {
    let rejection = match policy.validate(&candidate, now) {
        ValidationResult::Ok => match checker.find_conflict(&candidate, exclude)? {
            ConflictResult::Clear => return Ok(Submission::Accepted(candidate)),
            ConflictResult::Conflict(existing) => Rejection::Conflict(existing),
        },
        verdict => Rejection::Policy(verdict),
    };
    info!(editing = ?exclude, %rejection, "submission rejected");
    Ok(Submission::Rejected(rejection))
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
