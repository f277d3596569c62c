use assert_matches::assert_matches;
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingCandidate, BookingDecision,
    BookingRejection,
};
use appointment_cell::services::conflict::{evaluate_booking, find_overlap};
use doctor_cell::models::AvailabilityWindow;
use shared_models::time::TimeOfDay;
use shared_utils::test_utils::MockSupabaseResponses;

const MONDAY: &str = "2025-06-02";
const TUESDAY: &str = "2025-06-03";

struct Fixture {
    doctor_id: Uuid,
    patient_id: Uuid,
    windows: Vec<AvailabilityWindow>,
    existing: Vec<Appointment>,
}

impl Fixture {
    /// Doctor available Mondays 09:00-17:00 and nothing else.
    fn monday_nine_to_five() -> Self {
        let doctor_id = Uuid::new_v4();
        let window = MockSupabaseResponses::availability_response(&doctor_id.to_string(), 1, "09:00:00", "17:00:00", true);

        Self {
            doctor_id,
            patient_id: Uuid::new_v4(),
            windows: vec![serde_json::from_value(window).unwrap()],
            existing: Vec::new(),
        }
    }

    fn with_appointment(mut self, doctor_id: Uuid, date: &str, start: &str, end: &str, status: &str) -> Self {
        let row = MockSupabaseResponses::appointment_response(
            &Uuid::new_v4().to_string(),
            &doctor_id.to_string(),
            date,
            &format!("{}:00", start),
            &format!("{}:00", end),
            status,
        );
        self.existing.push(serde_json::from_value(row).unwrap());
        self
    }

    fn booked(self, start: &str, end: &str, status: &str) -> Self {
        let doctor_id = self.doctor_id;
        self.with_appointment(doctor_id, MONDAY, start, end, status)
    }

    fn request(&self, date: &str, start: &str, end: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: self.doctor_id.to_string(),
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    fn decide(&self, date: &str, start: &str, end: &str) -> BookingDecision {
        evaluate_booking(&self.request(date, start, end), self.patient_id, &self.windows, &self.existing)
    }
}

fn rejection(decision: BookingDecision) -> BookingRejection {
    match decision {
        BookingDecision::Rejected(rejection) => rejection,
        BookingDecision::Accepted(draft) => panic!("Expected rejection, got {:?}", draft),
    }
}

#[test]
fn test_free_slot_inside_window_is_accepted() {
    let fixture = Fixture::monday_nine_to_five();

    match fixture.decide(MONDAY, "10:00", "10:30") {
        BookingDecision::Accepted(draft) => {
            assert_eq!(draft.doctor_id, fixture.doctor_id);
            assert_eq!(draft.patient_id, fixture.patient_id);
            assert_eq!(draft.status, AppointmentStatus::Pending);
            assert!(draft.notes.is_empty());
            assert_eq!(draft.start_time.to_string(), "2025-06-02 10:00:00");
            assert_eq!(draft.end_time.to_string(), "2025-06-02 10:30:00");
        }
        BookingDecision::Rejected(rejection) => panic!("Unexpected rejection: {}", rejection),
    }
}

#[test]
fn test_partial_overlap_is_rejected() {
    let fixture = Fixture::monday_nine_to_five().booked("10:00", "11:00", "PENDING");

    let rejection = rejection(fixture.decide(MONDAY, "10:30", "11:30"));
    assert_eq!(rejection, BookingRejection::SlotAlreadyBooked);
    assert_eq!(rejection.to_string(), "This time slot is already booked with another patient");
}

#[test]
fn test_start_before_window_is_rejected() {
    let fixture = Fixture::monday_nine_to_five();

    let rejection = rejection(fixture.decide(MONDAY, "08:00", "08:30"));
    assert_matches!(rejection, BookingRejection::OutsideAvailableHours { .. });
    assert_eq!(rejection.to_string(), "Selected time must be between 9:00 AM and 5:00 PM");
}

#[test]
fn test_unscheduled_weekday_is_rejected() {
    let fixture = Fixture::monday_nine_to_five();

    let rejection = rejection(fixture.decide(TUESDAY, "10:00", "10:30"));
    assert_eq!(rejection, BookingRejection::NotAvailableOnDay);
    assert_eq!(rejection.code(), "NOT_AVAILABLE_ON_DAY");
}

#[test]
fn test_cancelled_appointment_frees_its_slot() {
    let fixture = Fixture::monday_nine_to_five().booked("09:00", "10:00", "CANCELLED");

    assert!(fixture.decide(MONDAY, "09:00", "10:00").is_accepted());
}

#[test]
fn test_touching_appointments_do_not_conflict() {
    let fixture = Fixture::monday_nine_to_five().booked("10:00", "10:30", "SCHEDULED");

    assert!(fixture.decide(MONDAY, "10:30", "11:00").is_accepted());
    assert!(fixture.decide(MONDAY, "09:30", "10:00").is_accepted());
}

#[test]
fn test_window_edges_are_inclusive() {
    let fixture = Fixture::monday_nine_to_five();

    assert!(fixture.decide(MONDAY, "09:00", "09:30").is_accepted());
    assert!(fixture.decide(MONDAY, "16:30", "17:00").is_accepted());
    assert!(fixture.decide(MONDAY, "09:00", "17:00").is_accepted());

    assert_matches!(
        rejection(fixture.decide(MONDAY, "16:45", "17:15")),
        BookingRejection::OutsideAvailableHours { .. }
    );
}

#[test]
fn test_enclosing_and_enclosed_ranges_conflict() {
    let fixture = Fixture::monday_nine_to_five().booked("11:00", "11:30", "PENDING");

    assert_eq!(rejection(fixture.decide(MONDAY, "10:00", "12:00")), BookingRejection::SlotAlreadyBooked);
    assert_eq!(rejection(fixture.decide(MONDAY, "11:10", "11:20")), BookingRejection::SlotAlreadyBooked);
    assert_eq!(rejection(fixture.decide(MONDAY, "11:00", "11:30")), BookingRejection::SlotAlreadyBooked);
}

#[test]
fn test_other_doctors_and_dates_are_ignored() {
    let fixture = Fixture::monday_nine_to_five();
    let doctor_id = fixture.doctor_id;
    let fixture = fixture
        .with_appointment(Uuid::new_v4(), MONDAY, "10:00", "11:00", "SCHEDULED")
        .with_appointment(doctor_id, "2025-06-09", "10:00", "11:00", "SCHEDULED");

    assert!(fixture.decide(MONDAY, "10:00", "11:00").is_accepted());
}

#[test]
fn test_unavailable_weekday_rejected_regardless_of_bookings() {
    let doctor_id = Uuid::new_v4();
    let window = MockSupabaseResponses::availability_response(&doctor_id.to_string(), 1, "09:00:00", "17:00:00", false);
    let fixture = Fixture {
        doctor_id,
        patient_id: Uuid::new_v4(),
        windows: vec![serde_json::from_value(window).unwrap()],
        existing: Vec::new(),
    };

    assert_eq!(rejection(fixture.decide(MONDAY, "10:00", "10:30")), BookingRejection::NotAvailableOnDay);
}

#[test]
fn test_later_available_window_is_used_when_first_is_off() {
    let doctor_id = Uuid::new_v4();
    let off = MockSupabaseResponses::availability_response(&doctor_id.to_string(), 1, "06:00:00", "08:00:00", false);
    let on = MockSupabaseResponses::availability_response(&doctor_id.to_string(), 1, "12:00:00", "14:00:00", true);
    let fixture = Fixture {
        doctor_id,
        patient_id: Uuid::new_v4(),
        windows: vec![serde_json::from_value(off).unwrap(), serde_json::from_value(on).unwrap()],
        existing: Vec::new(),
    };

    assert!(fixture.decide(MONDAY, "12:30", "13:00").is_accepted());
    assert!(!fixture.decide(MONDAY, "07:00", "07:30").is_accepted());
}

#[test]
fn test_same_inputs_same_decision() {
    let fixture = Fixture::monday_nine_to_five().booked("10:00", "11:00", "PENDING");

    for (start, end) in [("10:30", "11:30"), ("13:00", "13:30"), ("08:00", "08:30")] {
        assert_eq!(fixture.decide(MONDAY, start, end), fixture.decide(MONDAY, start, end));
    }
}

#[test]
fn test_malformed_input_is_rejected_before_lookup() {
    let fixture = Fixture::monday_nine_to_five();

    for bad in ["9:60", "24:00", "abc"] {
        assert_matches!(
            rejection(fixture.decide(MONDAY, bad, "10:00")),
            BookingRejection::InvalidTimeFormat { field: "start_time", .. }
        );
    }
    assert_eq!(rejection(fixture.decide(MONDAY, "10:30", "10:00")), BookingRejection::InvalidTimeRange);
    assert_matches!(rejection(fixture.decide("02/06/2025", "10:00", "10:30")), BookingRejection::InvalidDate(_));

    // An unscheduled day still reports the bad time first
    assert_matches!(
        rejection(fixture.decide(TUESDAY, "10:00", "nine")),
        BookingRejection::InvalidTimeFormat { field: "end_time", .. }
    );
}

#[test]
fn test_first_overlap_in_input_order_is_reported() {
    let fixture = Fixture::monday_nine_to_five()
        .booked("10:00", "10:30", "PENDING")
        .booked("10:15", "11:00", "SCHEDULED");

    let candidate = BookingCandidate::try_from(&fixture.request(MONDAY, "10:20", "10:40")).unwrap();
    let hit = find_overlap(&candidate, &fixture.existing).unwrap();

    assert_eq!(hit.id, fixture.existing[0].id);
    assert_eq!(hit.end(), TimeOfDay::from_hm(10, 30).unwrap());
}
