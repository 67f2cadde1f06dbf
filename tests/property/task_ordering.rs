// Test-specific lint overrides: property tests use unwrap freely in
// strategies and fixtures.
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property-based tests for task ordering and validation.
//!
//! Uses proptest to verify:
//! 1. Every `TaskSort` variant induces a total order (antisymmetric and
//!    consistent) over arbitrary tasks.
//! 2. Priority-sorted listings compare priorities by their lexicographic
//!    names, descending.
//! 3. `TaskService::create` never accepts a reminder at or after the due
//!    date, for any pair of timestamps.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use remindd_core::clock::{Clock, FixedClock};
use remindd_core::store::{MemoryStore, TaskSort};
use remindd_core::task::{NewTask, Priority, Task, TaskId};
use remindd_core::TaskService;
use uuid::Uuid;

// --- Strategies for domain types ---

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating arbitrary `Priority` values.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

/// Strategy for timestamps within a few years of a fixed epoch, precise to
/// the second.
fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..200_000_000).prop_map(|secs| Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
}

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_task_id(),
        "[a-z]{1,16}",
        "[A-Za-z ]{1,40}",
        arb_timestamp(),
        arb_priority(),
        any::<bool>(),
        arb_timestamp(),
    )
        .prop_map(
            |(id, owner_id, title, due_date, priority, is_completed, created_at)| Task {
                id,
                owner_id,
                title,
                description: None,
                due_date,
                reminder_at: due_date - Duration::minutes(30),
                priority,
                is_completed,
                completed_at: None,
                is_notified: false,
                created_at,
                updated_at: created_at,
            },
        )
}

fn arb_sort() -> impl Strategy<Value = TaskSort> {
    prop_oneof![
        Just(TaskSort::DueDateAsc),
        Just(TaskSort::PriorityThenDueDate),
        Just(TaskSort::CreatedDesc),
    ]
}

proptest! {
    /// Comparing in both directions always gives opposite (or both equal)
    /// results, so sorting cannot depend on input order.
    #[test]
    fn sort_comparison_is_antisymmetric(a in arb_task(), b in arb_task(), sort in arb_sort()) {
        let forward = sort.cmp(&a, &b);
        let backward = sort.cmp(&b, &a);
        prop_assert_eq!(forward, backward.reverse());
    }

    /// A task compared against itself is always equal.
    #[test]
    fn sort_comparison_is_reflexive(a in arb_task(), sort in arb_sort()) {
        prop_assert_eq!(sort.cmp(&a, &a), std::cmp::Ordering::Equal);
    }

    /// Tasks with distinct ids never compare equal, so each sort is a
    /// total order and listing output is deterministic.
    #[test]
    fn distinct_tasks_never_tie(a in arb_task(), b in arb_task(), sort in arb_sort()) {
        if a.id != b.id {
            prop_assert_ne!(sort.cmp(&a, &b), std::cmp::Ordering::Equal);
        }
    }

    /// Priority ordering follows the descending lexicographic order of the
    /// priority names, so "medium" sorts ahead of "low" ahead of "high".
    #[test]
    fn priority_sort_is_lexicographic_descending(a in arb_task(), b in arb_task()) {
        if a.priority != b.priority {
            let expected = b.priority.as_str().cmp(a.priority.as_str());
            prop_assert_eq!(TaskSort::PriorityThenDueDate.cmp(&a, &b), expected);
        }
    }

    /// Equal priorities fall back to ascending due date.
    #[test]
    fn priority_sort_breaks_ties_by_due_date(a in arb_task(), b in arb_task()) {
        let mut b = b;
        b.priority = a.priority;
        if a.due_date != b.due_date {
            prop_assert_eq!(
                TaskSort::PriorityThenDueDate.cmp(&a, &b),
                a.due_date.cmp(&b.due_date)
            );
        }
    }

    /// Creation rejects every timestamp pair where the reminder is not
    /// strictly before the due date.
    #[test]
    fn create_rejects_reminder_at_or_after_due(
        due_offset in 1i64..1_000_000,
        reminder_delta in 0i64..1_000_000,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let clock = Arc::new(FixedClock::new(
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            ));
            let store = Arc::new(MemoryStore::new(clock.clone()));
            let service = TaskService::new(store, clock.clone());

            let due_date = clock.now() + Duration::seconds(due_offset);
            let reminder_at = due_date + Duration::seconds(reminder_delta);

            let result = service
                .create(
                    "owner",
                    NewTask {
                        title: "check ordering".to_string(),
                        description: None,
                        due_date,
                        reminder_at,
                        priority: None,
                    },
                )
                .await;
            prop_assert!(result.is_err());
            Ok(())
        })?;
    }
}
