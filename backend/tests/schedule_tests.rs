//! Order schedule tests
//!
//! Display-state derivation against a reference date, and the guards on
//! reschedule, cancel and complete.

use chrono::{Days, NaiveDate, Utc};
use proptest::prelude::*;
use shared::{
    merge_schedule_lines, OrderSchedule, OrderScheduleLine, ScheduleDisplayState, ScheduleStatus,
    DUE_SOON_HORIZON_DAYS,
};
use uuid::Uuid;

fn schedule(date: NaiveDate, status: ScheduleStatus, qty: i64, received: i64) -> OrderSchedule {
    OrderSchedule {
        id: Uuid::new_v4(),
        scheduled_date: date,
        created_by: "storekeeper".to_string(),
        supplier_id: Uuid::new_v4(),
        remark: String::new(),
        status,
        lines: vec![OrderScheduleLine {
            inventory_id: Uuid::new_v4(),
            qty,
            received_qty: received,
        }],
        created_at: Utc::now(),
        last_updated: Utc::now(),
    }
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn due_soon_window_is_inclusive_at_three_days() {
    let today = day("2025-08-25");

    let at_horizon = schedule(day("2025-08-28"), ScheduleStatus::Scheduled, 5, 0);
    assert_eq!(at_horizon.display_state(today), ScheduleDisplayState::DueSoon);

    let beyond = schedule(day("2025-08-29"), ScheduleStatus::Scheduled, 5, 0);
    assert_eq!(beyond.display_state(today), ScheduleDisplayState::Scheduled);

    let today_itself = schedule(today, ScheduleStatus::Scheduled, 5, 0);
    assert_eq!(today_itself.display_state(today), ScheduleDisplayState::DueSoon);
}

#[test]
fn past_date_with_nothing_received_is_delayed() {
    let today = day("2025-08-25");
    let late = schedule(day("2025-08-24"), ScheduleStatus::Scheduled, 5, 0);
    assert_eq!(late.display_state(today), ScheduleDisplayState::Delayed);
}

#[test]
fn partial_receipt_wins_over_date_states() {
    let today = day("2025-08-25");
    // Late and partially received: partial takes precedence
    let partial = schedule(day("2025-08-20"), ScheduleStatus::Scheduled, 5, 2);
    assert_eq!(partial.display_state(today), ScheduleDisplayState::PartialReceive);
}

#[test]
fn fully_received_displays_completed_without_a_status_change() {
    let today = day("2025-08-25");
    let done = schedule(day("2025-08-20"), ScheduleStatus::Scheduled, 5, 5);
    assert_eq!(done.status, ScheduleStatus::Scheduled);
    assert_eq!(done.display_state(today), ScheduleDisplayState::Completed);
}

#[test]
fn terminal_statuses_override_everything() {
    let today = day("2025-08-25");
    let cancelled = schedule(day("2025-08-20"), ScheduleStatus::Cancelled, 5, 2);
    assert_eq!(cancelled.display_state(today), ScheduleDisplayState::Cancelled);

    let completed = schedule(day("2025-08-20"), ScheduleStatus::Completed, 5, 0);
    assert_eq!(completed.display_state(today), ScheduleDisplayState::Completed);
}

#[test]
fn only_open_schedules_can_move_or_close() {
    let new_date = day("2025-09-01");

    let mut open = schedule(day("2025-08-25"), ScheduleStatus::Scheduled, 5, 0);
    open.reschedule(new_date).unwrap();
    assert_eq!(open.scheduled_date, new_date);
    open.cancel().unwrap();
    assert_eq!(open.status, ScheduleStatus::Cancelled);

    for status in [ScheduleStatus::Completed, ScheduleStatus::Cancelled] {
        let mut closed = schedule(day("2025-08-25"), status, 5, 0);
        assert!(closed.reschedule(new_date).is_err());
        assert!(closed.cancel().is_err());
        assert!(closed.complete().is_err());
    }
}

#[test]
fn quantities_roll_up_across_lines() {
    let mut sched = schedule(day("2025-08-25"), ScheduleStatus::Scheduled, 5, 2);
    sched.lines.push(OrderScheduleLine {
        inventory_id: Uuid::new_v4(),
        qty: 3,
        received_qty: 0,
    });
    assert_eq!(sched.total_qty(), 8);
    assert_eq!(sched.received_qty(), 2);
    assert_eq!(sched.outstanding_qty(), 6);
}

#[test]
fn duplicate_schedule_lines_merge_into_one() {
    let belt = Uuid::new_v4();
    let filter = Uuid::new_v4();
    let line = |id, qty| OrderScheduleLine {
        inventory_id: id,
        qty,
        received_qty: 0,
    };

    let merged = merge_schedule_lines(vec![line(belt, 4), line(filter, 2), line(belt, 3)]);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].inventory_id, belt);
    assert_eq!(merged[0].qty, 7);
    assert_eq!(merged[1].inventory_id, filter);
    assert_eq!(merged[1].qty, 2);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// The derived state is total: every combination of status, date and
    /// receipt progress maps to exactly one display state, and open
    /// schedules with receipts never show the plain date states
    #[test]
    fn display_state_is_consistent(
        offset in -30i64..30,
        qty in 1i64..50,
        received_fraction in 0i64..=100,
    ) {
        let today = day("2025-08-25");
        let date = if offset >= 0 {
            today + Days::new(offset as u64)
        } else {
            today - Days::new((-offset) as u64)
        };
        let received = (qty * received_fraction / 100).min(qty);
        let sched = schedule(date, ScheduleStatus::Scheduled, qty, received);

        let state = sched.display_state(today);
        if received == qty {
            prop_assert_eq!(state, ScheduleDisplayState::Completed);
        } else if received > 0 {
            prop_assert_eq!(state, ScheduleDisplayState::PartialReceive);
        } else if date < today {
            prop_assert_eq!(state, ScheduleDisplayState::Delayed);
        } else if date <= today + Days::new(DUE_SOON_HORIZON_DAYS) {
            prop_assert_eq!(state, ScheduleDisplayState::DueSoon);
        } else {
            prop_assert_eq!(state, ScheduleDisplayState::Scheduled);
        }
    }
}
