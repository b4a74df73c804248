// SPDX-License-Identifier: MIT

//! Feed visibility tests: expiry grace window, category narrowing and
//! the owner-scoped opportunistic sweep.

use chrono::{Duration, Utc};
use squadup::models::{PlanCategory, PlanDetails};
use squadup::services::NewPlan;
use squadup::time_utils::format_utc_rfc3339;

mod common;
use common::{seed_member, test_services};

fn plan_at(details: PlanDetails, scheduled_time: Option<String>) -> NewPlan {
    NewPlan {
        details,
        scheduled_time,
        capacity: 3,
    }
}

fn ride(scheduled_time: Option<String>) -> NewPlan {
    plan_at(
        PlanDetails::Ride {
            origin: "Campus".to_string(),
            destination: "Airport".to_string(),
        },
        scheduled_time,
    )
}

#[test]
fn feed_hides_plans_past_the_grace_window() {
    let (store, plans, _, _) = test_services();
    let alice = seed_member(&store, "alice", "Alice");
    let now = Utc::now();

    let (fresh_id, _) = plans
        .create(&alice, ride(Some(format_utc_rfc3339(now - Duration::hours(2)))))
        .expect("create failed");
    plans
        .create(&alice, ride(Some(format_utc_rfc3339(now - Duration::hours(4)))))
        .expect("create failed");
    let (flexible_id, _) = plans.create(&alice, ride(None)).expect("create failed");

    let feed = plans.feed(now, None).expect("feed failed");
    let ids: Vec<&str> = feed.iter().map(|(id, _)| id.as_str()).collect();

    // Two hours past schedule is inside the three-hour grace window;
    // four hours is out. Unscheduled plans never expire.
    assert!(ids.contains(&fresh_id.as_str()));
    assert!(ids.contains(&flexible_id.as_str()));
    assert_eq!(feed.len(), 2);
}

#[test]
fn feed_is_newest_first_and_filters_by_category() {
    let (store, plans, _, _) = test_services();
    let alice = seed_member(&store, "alice", "Alice");

    let (ride_id, _) = plans.create(&alice, ride(None)).expect("create failed");
    let (food_id, _) = plans
        .create(
            &alice,
            plan_at(
                PlanDetails::Food {
                    venue: "Mess Hall".to_string(),
                },
                None,
            ),
        )
        .expect("create failed");

    let all = plans.feed(Utc::now(), None).expect("feed failed");
    assert_eq!(all.len(), 2);

    let food_only = plans
        .feed(Utc::now(), Some(PlanCategory::Food))
        .expect("feed failed");
    assert_eq!(food_only.len(), 1);
    assert_eq!(food_only[0].0, food_id);

    let ride_only = plans
        .feed(Utc::now(), Some(PlanCategory::Ride))
        .expect("feed failed");
    assert_eq!(ride_only.len(), 1);
    assert_eq!(ride_only[0].0, ride_id);
}

#[test]
fn sweep_deletes_only_the_callers_expired_plans() {
    let (store, plans, _, _) = test_services();
    let alice = seed_member(&store, "alice", "Alice");
    let bob = seed_member(&store, "bob", "Bob");
    let now = Utc::now();
    let stale = Some(format_utc_rfc3339(now - Duration::hours(5)));

    let (alice_stale, _) = plans.create(&alice, ride(stale.clone())).expect("create failed");
    let (alice_live, _) = plans.create(&alice, ride(None)).expect("create failed");
    let (bob_stale, _) = plans.create(&bob, ride(stale)).expect("create failed");

    plans.sweep_expired(&alice, now);

    assert!(plans.get(&alice_stale).is_err());
    assert!(plans.get(&alice_live).is_ok());
    // Another member's expired plan is not this caller's to sweep; it
    // stays stored but the read-time filter still hides it.
    assert!(plans.get(&bob_stale).is_ok());
    assert!(!plans
        .feed(now, None)
        .expect("feed failed")
        .iter()
        .any(|(id, _)| id == &bob_stale));
}
