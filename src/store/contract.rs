// src/store/contract.rs
//! Behaviour every `PollStore` must share. Each check creates its own
//! question and users, so it can run against a database other tests use too.
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::PollStore;
use crate::models::{Choice, NewQuestion, Question};

async fn poll(store: &dyn PollStore, text: &str, choices: &[&str]) -> (Question, Vec<Choice>) {
    let question = store
        .create_question(NewQuestion::new(text, Utc::now() - Duration::hours(1)))
        .await
        .unwrap();

    let mut created = Vec::new();
    for choice in choices {
        created.push(store.add_choice(question.id, choice).await.unwrap());
    }

    (question, created)
}

async fn counts(store: &dyn PollStore, question: &Question) -> Vec<i64> {
    store
        .tally(question.id)
        .await
        .unwrap()
        .into_iter()
        .map(|tally| tally.votes)
        .collect()
}

pub async fn vote_then_change_keeps_one_row(store: &dyn PollStore) {
    let (question, choices) = poll(store, "Lunch?", &["A", "B"]).await;
    let user = Uuid::new_v4();

    let first = store.upsert_vote(user, question.id, choices[0].id).await.unwrap();
    assert!(first.created);
    assert_eq!(first.vote.choice_id, choices[0].id);
    assert_eq!(first.vote.user_id, user);

    let second = store.upsert_vote(user, question.id, choices[1].id).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.vote.id, first.vote.id);
    assert_eq!(second.vote.choice_id, choices[1].id);

    assert_eq!(counts(store, &question).await, vec![0, 1]);
    assert_eq!(
        store.user_vote(user, question.id).await.unwrap(),
        Some(second.vote)
    );
}

pub async fn repeat_vote_is_not_created(store: &dyn PollStore) {
    let (question, choices) = poll(store, "Lunch?", &["A", "B"]).await;
    let user = Uuid::new_v4();

    store.upsert_vote(user, question.id, choices[1].id).await.unwrap();
    let again = store.upsert_vote(user, question.id, choices[1].id).await.unwrap();

    assert!(!again.created);
    assert_eq!(counts(store, &question).await, vec![0, 1]);
}

pub async fn tally_includes_choices_without_votes(store: &dyn PollStore) {
    let (question, choices) = poll(store, "Lunch?", &["A", "B", "C"]).await;
    for _ in 0..2 {
        store
            .upsert_vote(Uuid::new_v4(), question.id, choices[2].id)
            .await
            .unwrap();
    }

    let tally = store.tally(question.id).await.unwrap();
    let ids: Vec<i64> = tally.iter().map(|t| t.choice.id).collect();
    assert_eq!(ids, choices.iter().map(|c| c.id).collect::<Vec<_>>());
    assert_eq!(counts(store, &question).await, vec![0, 0, 2]);
}

pub async fn delete_vote_returns_row_then_none(store: &dyn PollStore) {
    let (question, choices) = poll(store, "Lunch?", &["A"]).await;
    let user = Uuid::new_v4();
    let written = store.upsert_vote(user, question.id, choices[0].id).await.unwrap();

    let deleted = store.delete_vote(user, question.id).await.unwrap();
    assert_eq!(deleted, Some(written.vote));
    assert_eq!(store.delete_vote(user, question.id).await.unwrap(), None);
    assert_eq!(counts(store, &question).await, vec![0]);
}

pub async fn delete_question_cascades(store: &dyn PollStore) {
    let (question, choices) = poll(store, "Lunch?", &["A", "B"]).await;
    let user = Uuid::new_v4();
    store.upsert_vote(user, question.id, choices[0].id).await.unwrap();

    assert!(store.delete_question(question.id).await.unwrap());

    assert!(store.get_question(question.id).await.unwrap().is_none());
    assert!(store.choices(question.id).await.unwrap().is_empty());
    assert!(store.tally(question.id).await.unwrap().is_empty());
    assert!(store.user_vote(user, question.id).await.unwrap().is_none());
    assert!(!store.delete_question(question.id).await.unwrap());
}

pub async fn foreign_choice_is_rejected(store: &dyn PollStore) {
    let (question, _) = poll(store, "Lunch?", &["A"]).await;
    let (_, foreign) = poll(store, "Dinner?", &["B"]).await;
    let user = Uuid::new_v4();

    assert!(store.find_choice(question.id, foreign[0].id).await.unwrap().is_none());
    assert!(store.upsert_vote(user, question.id, foreign[0].id).await.is_err());
    assert!(store.user_vote(user, question.id).await.unwrap().is_none());
    assert_eq!(counts(store, &question).await, vec![0]);
}

pub async fn published_excludes_future(store: &dyn PollStore) {
    let now = Utc::now();
    let old = store
        .create_question(NewQuestion::new("Old", now - Duration::days(30)))
        .await
        .unwrap();
    let recent = store
        .create_question(NewQuestion::new("Recent", now - Duration::days(5)))
        .await
        .unwrap();
    let future = store
        .create_question(NewQuestion::new("Future", now + Duration::days(30)))
        .await
        .unwrap();

    let ids: Vec<i64> = store
        .published_questions(now)
        .await
        .unwrap()
        .into_iter()
        .map(|q| q.id)
        .filter(|id| [old.id, recent.id, future.id].contains(id))
        .collect();
    assert_eq!(ids, vec![recent.id, old.id]);
}

pub async fn run_all(store: &dyn PollStore) {
    vote_then_change_keeps_one_row(store).await;
    repeat_vote_is_not_created(store).await;
    tally_includes_choices_without_votes(store).await;
    delete_vote_returns_row_then_none(store).await;
    delete_question_cascades(store).await;
    foreign_choice_is_rejected(store).await;
    published_excludes_future(store).await;
}
