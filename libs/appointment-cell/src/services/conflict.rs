// libs/appointment-cell/src/services/conflict.rs
//! Pure booking checks. Nothing here touches storage; callers hand in the
//! doctor's weekly windows and the appointments already on the books.

use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::AvailabilityWindow;
use doctor_cell::services::availability::window_for_date;
use shared_models::time::TimeOfDay;

use crate::models::{
    Appointment, AppointmentDraft, BookAppointmentRequest, BookingCandidate, BookingDecision,
    BookingRejection,
};

/// Half-open interval overlap: `[start1, end1)` and `[start2, end2)`.
/// Touching endpoints do not overlap.
pub fn appointments_overlap(start1: TimeOfDay, end1: TimeOfDay, start2: TimeOfDay, end2: TimeOfDay) -> bool {
    start1 < end2 && end1 > start2
}

/// The doctor's window for the candidate's weekday.
pub fn check_available_day<'a>(
    candidate: &BookingCandidate,
    windows: &'a [AvailabilityWindow],
) -> Result<&'a AvailabilityWindow, BookingRejection> {
    window_for_date(windows, candidate.date).ok_or(BookingRejection::NotAvailableOnDay)
}

/// The whole candidate range must sit inside the window; both edges may touch it.
pub fn check_within_hours(
    candidate: &BookingCandidate,
    window: &AvailabilityWindow,
) -> Result<(), BookingRejection> {
    let (window_start, window_end) = (window.start(), window.end());

    if candidate.start < window_start || candidate.end > window_end {
        return Err(BookingRejection::OutsideAvailableHours { window_start, window_end });
    }
    Ok(())
}

/// Appointments that can block the candidate: same doctor, same date, not cancelled.
pub fn blocking_appointments<'a>(
    candidate: &'a BookingCandidate,
    existing: &'a [Appointment],
) -> impl Iterator<Item = &'a Appointment> + 'a {
    existing.iter().filter(move |appointment| {
        appointment.doctor_id == candidate.doctor_id
            && appointment.appointment_date == candidate.date
            && appointment.status.holds_slot()
    })
}

/// First existing appointment the candidate collides with, in input order.
pub fn find_overlap<'a>(candidate: &'a BookingCandidate, existing: &'a [Appointment]) -> Option<&'a Appointment> {
    blocking_appointments(candidate, existing)
        .find(|appointment| appointments_overlap(candidate.start, candidate.end, appointment.start(), appointment.end()))
}

pub fn check_no_overlap(candidate: &BookingCandidate, existing: &[Appointment]) -> Result<(), BookingRejection> {
    match find_overlap(candidate, existing) {
        Some(appointment) => {
            debug!(
                "Candidate {}-{} overlaps appointment {} ({}-{})",
                candidate.start, candidate.end, appointment.id, appointment.start(), appointment.end()
            );
            Err(BookingRejection::SlotAlreadyBooked)
        }
        None => Ok(()),
    }
}

/// Runs every check on an already parsed candidate. The first failing check wins.
pub fn evaluate_candidate(
    candidate: &BookingCandidate,
    patient_id: Uuid,
    windows: &[AvailabilityWindow],
    existing: &[Appointment],
) -> Result<AppointmentDraft, BookingRejection> {
    let window = check_available_day(candidate, windows)?;
    check_within_hours(candidate, window)?;
    check_no_overlap(candidate, existing)?;

    Ok(AppointmentDraft::pending(candidate, patient_id))
}

/// Full decision for a raw request: parse, then check day, hours and overlap.
pub fn evaluate_booking(
    request: &BookAppointmentRequest,
    patient_id: Uuid,
    windows: &[AvailabilityWindow],
    existing: &[Appointment],
) -> BookingDecision {
    let outcome = BookingCandidate::try_from(request)
        .and_then(|candidate| evaluate_candidate(&candidate, patient_id, windows, existing));

    match outcome {
        Ok(draft) => BookingDecision::Accepted(draft),
        Err(rejection) => BookingDecision::Rejected(rejection),
    }
}
