//! End-to-end ticket lifecycle against an in-memory platform and store.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::sync::Arc;

use {
    helpdesk_platform::Presence,
    helpdesk_tickets::{
        CloseOutcome, CreateOutcome, InMemoryStore, Step, StoreSnapshot, TicketAssignment,
        TicketStatus, TicketStore, messages,
    },
    support::{Call, Harness, Op, history, user, wait_past_grace},
};

const ONLINE: Presence = Presence::Online;

#[tokio::test]
async fn create_assigns_least_loaded_available_staff() {
    let mut snapshot = StoreSnapshot::default();
    snapshot.staff_load.insert("A".into(), 3);
    snapshot.staff_load.insert("B".into(), 1);
    snapshot.staff_load.insert("C".into(), 1);
    let h = Harness::with_store(
        &[("A", ONLINE), ("B", ONLINE), ("C", ONLINE)],
        InMemoryStore::with_snapshot(snapshot),
    );
    h.desk.start().await;

    let outcome = h.desk.create_ticket(&user("U1")).await;
    let CreateOutcome::Created {
        channel_id,
        staff_id,
        persisted,
        welcome,
    } = outcome
    else {
        panic!("expected a ticket");
    };
    assert_eq!(staff_id, "B");
    assert!(persisted.is_done());
    assert!(welcome.is_done());

    let load = h.desk.staff_load().await;
    assert_eq!(load.get("B"), Some(&2));
    assert_eq!(load.get("A"), Some(&3));

    let persisted = h.store.snapshot();
    assert_eq!(
        persisted.assignments.get(&channel_id),
        Some(&TicketAssignment::open("U1", "B"))
    );
    assert_eq!(persisted.staff_load.get("B"), Some(&2));

    assert!(h.platform.calls().contains(&Call::CreateSpace {
        id: channel_id.clone(),
        name: "ticket-u1".into(),
        parent: Some("cat-1".into()),
        members: vec!["U1".into(), "B".into()],
    }));
    let sent = h.platform.sent_to(&channel_id);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].content.as_deref(), Some("<@B>"));
    assert_eq!(sent[0].controls[0].id, messages::CLOSE_TICKET);
    assert_eq!(h.platform.last_activity().as_deref(), Some("Handling 1 tickets"));
}

#[tokio::test]
async fn offline_staff_are_never_selected() {
    let h = Harness::new(&[("A", Presence::Offline), ("B", Presence::Idle)]);
    for requester in ["U1", "U2", "U3"] {
        match h.desk.create_ticket(&user(requester)).await {
            CreateOutcome::Created { staff_id, .. } => assert_eq!(staff_id, "B"),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(h.desk.staff_load().await.get("B"), Some(&3));
    assert!(!h.desk.staff_load().await.contains_key("A"));
}

#[tokio::test]
async fn no_staff_available_notifies_requester_and_records_nothing() {
    let h = Harness::new(&[("A", Presence::Offline)]);
    let outcome = h.desk.create_ticket(&user("U1")).await;
    assert_eq!(outcome, CreateOutcome::NoStaffAvailable {
        notified: Step::Done
    });

    assert_eq!(h.platform.directs_to("U1"), vec![messages::no_staff_available()]);
    assert_eq!(h.platform.count(|c| matches!(c, Call::CreateSpace { .. })), 0);
    assert!(h.desk.open_tickets().await.is_empty());
    assert!(h.desk.staff_load().await.is_empty());
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn staff_lookup_failure_is_treated_as_no_staff() {
    let h = Harness::new(&[("A", ONLINE)]);
    h.platform.fail(Op::StaffPool);
    assert!(matches!(
        h.desk.create_ticket(&user("U1")).await,
        CreateOutcome::NoStaffAvailable { .. }
    ));
}

#[tokio::test]
async fn space_failure_records_nothing() {
    let h = Harness::new(&[("A", ONLINE)]);
    h.platform.fail(Op::CreateSpace);
    assert!(matches!(
        h.desk.create_ticket(&user("U1")).await,
        CreateOutcome::SpaceFailed { .. }
    ));
    assert!(h.desk.open_tickets().await.is_empty());
    assert!(h.desk.staff_load().await.is_empty());
}

#[tokio::test]
async fn save_failure_keeps_memory_authoritative() {
    let h = Harness::new(&[("A", ONLINE)]);
    h.store.set_fail_writes(true);

    let outcome = h.desk.create_ticket(&user("U1")).await;
    let CreateOutcome::Created {
        channel_id,
        persisted,
        welcome,
        ..
    } = outcome
    else {
        panic!("expected a ticket");
    };
    assert!(persisted.is_failed());
    assert!(welcome.is_done());
    assert!(h.desk.open_tickets().await.contains_key(&channel_id));
    assert_eq!(h.desk.staff_load().await.get("A"), Some(&1));
    assert!(h.store.snapshot().assignments.is_empty());
}

#[tokio::test]
async fn close_revokes_and_asks_for_feedback() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;

    let outcome = h.desk.close_ticket(&channel).await;
    assert_eq!(outcome, CloseOutcome::Closed {
        requester_id: "U1".into(),
        persisted: Step::Done,
        revoke: Step::Done,
        feedback_prompt: Step::Done,
    });

    assert!(h.platform.calls().contains(&Call::Revoke {
        space: channel.clone(),
        user: "U1".into(),
    }));
    let prompt = h.platform.sent_to(&channel).pop().unwrap();
    let ids: Vec<&str> = prompt.controls.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![messages::PROVIDE_FEEDBACK, messages::SKIP_FEEDBACK]);

    assert!(h.desk.open_tickets().await.is_empty());
    assert!(h.store.snapshot().assignments.is_empty());
    assert_eq!(
        h.desk.assignment(&channel).await.map(|a| a.status),
        Some(TicketStatus::Closing)
    );
    // Closing never decrements the load.
    assert_eq!(h.desk.staff_load().await.get("A"), Some(&1));
    assert_eq!(h.platform.last_activity().as_deref(), Some("Handling 0 tickets"));
}

#[tokio::test]
async fn second_close_is_a_no_op() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    let calls_before = h.platform.calls().len();
    let saves_before = h.store.save_count();

    assert_eq!(h.desk.close_ticket(&channel).await, CloseOutcome::UnknownTicket);
    assert_eq!(h.platform.calls().len(), calls_before);
    assert_eq!(h.store.save_count(), saves_before);
}

#[tokio::test]
async fn close_of_unknown_channel_does_nothing() {
    let h = Harness::new(&[("A", ONLINE)]);
    assert_eq!(h.desk.close_ticket("nope").await, CloseOutcome::UnknownTicket);
    assert!(h.platform.calls().is_empty());
}

#[tokio::test]
async fn close_persists_removal_even_when_channel_updates_fail() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    let saves_before = h.store.save_count();
    h.platform.fail(Op::Revoke);
    h.platform.fail(Op::Send);

    let CloseOutcome::Closed {
        persisted,
        revoke,
        feedback_prompt,
        ..
    } = h.desk.close_ticket(&channel).await
    else {
        panic!("expected a close");
    };
    assert!(persisted.is_done());
    assert!(revoke.is_failed());
    assert!(feedback_prompt.is_failed());

    assert!(h.store.save_count() > saves_before);
    assert!(h.store.snapshot().assignments.is_empty());
    assert!(h.desk.open_tickets().await.is_empty());
    assert_eq!(
        h.desk.assignment(&channel).await.map(|a| a.status),
        Some(TicketStatus::Closing)
    );
    assert_eq!(h.desk.close_ticket(&channel).await, CloseOutcome::UnknownTicket);
}

#[tokio::test]
async fn concurrent_creates_never_share_a_channel() {
    let h = Harness::new(&[("A", ONLINE), ("B", ONLINE)]);
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let desk = Arc::clone(&h.desk);
        tasks.spawn(async move { desk.create_ticket(&user(&format!("U{i}"))).await });
    }

    let mut channels = Vec::new();
    while let Some(outcome) = tasks.join_next().await {
        match outcome.unwrap() {
            CreateOutcome::Created { channel_id, .. } => channels.push(channel_id),
            other => panic!("unexpected {other:?}"),
        }
    }
    channels.sort();
    channels.dedup();
    assert_eq!(channels.len(), 8);
    assert_eq!(h.desk.open_tickets().await.len(), 8);

    let load = h.desk.staff_load().await;
    assert_eq!(load.values().sum::<u64>(), 8);
    // Serialised selection balances the pool exactly.
    assert_eq!(load.get("A"), Some(&4));
    assert_eq!(load.get("B"), Some(&4));
}

#[tokio::test]
async fn feedback_finalizes_the_ticket() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.platform.set_history(&channel, vec![
        history("1", 0, "U1#1234", "hi"),
        history("2", 5, "A#0001", "how can I help?"),
        history("3", 9, "U1#1234", "all good"),
    ]);
    h.desk.close_ticket(&channel).await;

    let submission = h
        .desk
        .submit_feedback(&channel, "U1", "4", Some("quick"))
        .await
        .unwrap();
    assert_eq!(submission.record.rating, "4");
    assert_eq!(submission.record.comment, "quick");
    assert!(submission.review.is_done());

    let report = submission.finalize;
    let path = report.transcript.clone().expect("transcript written");
    assert!(path.starts_with(h.dir.path()));
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("U1#1234: hi"));
    assert!(lines[2].ends_with("U1#1234: all good"));

    assert!(report.direct.is_done());
    assert!(report.archive_log.is_done());
    assert!(report.deletion.is_done());
    assert!(report.leaderboard.is_done());

    let dm = h.platform.directs_to("U1").pop().unwrap();
    assert_eq!(dm.attachment.as_deref(), Some(path.as_path()));
    assert_eq!(h.platform.sent_to("archive").len(), 1);
    let review = h.platform.sent_to("reviews").pop().unwrap();
    let card = review.card.unwrap();
    assert_eq!(card.fields[0].value, "⭐⭐⭐⭐ (4 stars)");
    assert_eq!(card.footer.as_deref(), Some("Submitted by U1#1234"));

    assert_eq!(
        h.store.load_feedback().await.unwrap(),
        vec![submission.record.clone()]
    );
    assert!(h.desk.assignment(&channel).await.is_none());

    // Deleted only once the grace delay has passed.
    assert!(h.platform.deleted_spaces().is_empty());
    assert!(h.desk.deletion_pending(&channel));
    wait_past_grace().await;
    assert_eq!(h.platform.deleted_spaces(), vec![channel.clone()]);
    assert!(!h.desk.deletion_pending(&channel));
}

#[tokio::test]
async fn transcript_keeps_only_the_latest_hundred_messages() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    let messages = (1..=120)
        .map(|i| history(&i.to_string(), i, "U1#1234", &format!("line {i}")))
        .collect();
    h.platform.set_history(&channel, messages);
    h.desk.close_ticket(&channel).await;

    let report = h.desk.skip_feedback(&channel, "U1").await;
    let text = std::fs::read_to_string(report.transcript.unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 100);
    assert!(lines[0].ends_with("U1#1234: line 21"));
    assert!(lines[99].ends_with("U1#1234: line 120"));
}

#[tokio::test]
async fn feedback_store_failure_leaves_ticket_for_retry() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    h.store.set_fail_writes(true);

    assert!(h.desk.submit_feedback(&channel, "U1", "5", None).await.is_err());
    assert!(!h.desk.deletion_pending(&channel));
    assert_eq!(
        h.desk.assignment(&channel).await.map(|a| a.status),
        Some(TicketStatus::Closing)
    );

    h.store.set_fail_writes(false);
    let submission = h.desk.submit_feedback(&channel, "U1", "5", None).await.unwrap();
    assert_eq!(submission.record.comment, messages::NO_COMMENT);
    assert!(submission.finalize.deletion.is_done());
}

#[tokio::test]
async fn feedback_log_keeps_submission_order() {
    let h = Harness::new(&[("A", ONLINE)]);
    let first = h.open("U1").await;
    let second = h.open("U2").await;
    h.desk.close_ticket(&first).await;
    h.desk.close_ticket(&second).await;

    h.desk.submit_feedback(&second, "U2", "3", None).await.unwrap();
    h.desk.submit_feedback(&first, "U1", "11", Some("great")).await.unwrap();

    let log = h.store.load_feedback().await.unwrap();
    let tickets: Vec<&str> = log.iter().map(|r| r.ticket_id.as_str()).collect();
    assert_eq!(tickets, vec![second.as_str(), first.as_str()]);
    // Out-of-range ratings are stored as given.
    assert_eq!(log[1].rating, "11");
}

#[tokio::test]
async fn skip_finalizes_without_a_record() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;

    let report = h.desk.skip_feedback(&channel, "U1").await;
    assert!(report.deletion.is_done());
    assert!(h.store.load_feedback().await.unwrap().is_empty());
    assert!(h.platform.sent_to("reviews").is_empty());
}

#[tokio::test]
async fn review_notice_failure_does_not_block_record_or_finalize() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.platform.set_history(&channel, vec![history("1", 0, "U1#1234", "hi")]);
    h.desk.close_ticket(&channel).await;
    h.platform.fail(Op::Send);

    let submission = h
        .desk
        .submit_feedback(&channel, "U1", "5", Some("thanks"))
        .await
        .unwrap();
    assert!(submission.review.is_failed());
    assert_eq!(
        h.store.load_feedback().await.unwrap(),
        vec![submission.record.clone()]
    );

    let report = submission.finalize;
    assert!(report.transcript.is_some());
    assert!(report.direct.is_done());
    assert!(report.deletion.is_done());
    wait_past_grace().await;
    assert_eq!(h.platform.deleted_spaces(), vec![channel]);
}

#[tokio::test]
async fn review_notice_falls_back_to_user_id_without_profile() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    h.platform.fail(Op::Profile);

    let submission = h.desk.submit_feedback(&channel, "U1", "5", None).await.unwrap();
    assert!(submission.review.is_done());
    let card = h.platform.sent_to("reviews").pop().unwrap().card.unwrap();
    assert_eq!(card.footer.as_deref(), Some("Submitted by U1"));
    assert!(card.thumbnail.is_none());
    assert!(submission.finalize.deletion.is_done());
}

#[tokio::test]
async fn finalize_runs_once_per_channel() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;

    let first = h.desk.skip_feedback(&channel, "U1").await;
    let second = h.desk.skip_feedback(&channel, "U1").await;
    assert!(first.deletion.is_done());
    assert_eq!(second.deletion, Step::Skipped("already finalizing"));

    wait_past_grace().await;
    assert_eq!(h.platform.deleted_spaces(), vec![channel]);
}

#[tokio::test]
async fn transcript_failure_still_deletes_channel() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    h.platform.fail(Op::History);

    let report = h.desk.skip_feedback(&channel, "U1").await;
    assert!(report.transcript.is_none());
    assert_eq!(report.direct, Step::Skipped("no transcript"));
    assert!(report.deletion.is_done());
    assert!(h.platform.directs_to("U1").is_empty());

    wait_past_grace().await;
    assert_eq!(h.platform.deleted_spaces(), vec![channel]);
}

#[tokio::test]
async fn failed_direct_message_does_not_block_archive_log() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    h.platform.fail(Op::Direct);

    let report = h.desk.skip_feedback(&channel, "U1").await;
    assert!(report.direct.is_failed());
    assert!(report.archive_log.is_done());
    assert!(report.deletion.is_done());
}

#[tokio::test]
async fn external_removal_cancels_pending_deletion() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;
    h.desk.close_ticket(&channel).await;
    h.desk.skip_feedback(&channel, "U1").await;

    assert!(h.desk.space_removed(&channel).await);
    wait_past_grace().await;
    assert!(h.platform.deleted_spaces().is_empty());
}

#[tokio::test]
async fn external_removal_of_open_ticket_drops_assignment() {
    let h = Harness::new(&[("A", ONLINE)]);
    let channel = h.open("U1").await;

    assert!(h.desk.space_removed(&channel).await);
    assert!(h.desk.open_tickets().await.is_empty());
    assert!(h.store.snapshot().assignments.is_empty());
    assert_eq!(h.desk.staff_load().await.get("A"), Some(&1));
    assert!(!h.desk.space_removed("unrelated").await);
}

#[tokio::test]
async fn restart_restores_open_tickets() {
    let mut snapshot = StoreSnapshot::default();
    snapshot
        .assignments
        .insert("ch-old".into(), TicketAssignment::open("U9", "A"));
    snapshot.staff_load.insert("A".into(), 1);
    let h = Harness::with_store(&[("A", ONLINE)], InMemoryStore::with_snapshot(snapshot));

    let report = h.desk.start().await;
    assert_eq!(report.open_tickets, 1);
    assert_eq!(h.platform.last_activity().as_deref(), Some("Handling 1 tickets"));

    match h.desk.close_ticket("ch-old").await {
        CloseOutcome::Closed { requester_id, .. } => assert_eq!(requester_id, "U9"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn feedback_after_restart_falls_back_to_submitter() {
    let h = Harness::new(&[("A", ONLINE)]);
    h.platform
        .set_history("ch-lost", vec![history("1", 0, "U7#1234", "hello")]);

    let submission = h
        .desk
        .submit_feedback("ch-lost", "U7", "5", None)
        .await
        .unwrap();
    assert!(submission.finalize.direct.is_done());
    assert_eq!(h.platform.directs_to("U7").len(), 1);
}
