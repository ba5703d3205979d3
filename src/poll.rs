// src/poll.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::PollError;
use crate::models::{Choice, ChoiceId, QuestionId, User};
use crate::store::PollStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    Voted,
    Changed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnvoteOutcome {
    Deleted,
}

/// What happened to a request, with a message meant for the voter.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt<O> {
    pub outcome: O,
    pub message: String,
    pub question_id: QuestionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<ChoiceId>,
}

/// Records `user`'s vote for `selection` on the question, replacing any vote
/// they already hold there.
pub async fn vote<S>(
    store: &S,
    question_id: QuestionId,
    selection: Option<ChoiceId>,
    user: &User,
    now: DateTime<Utc>,
) -> Result<Receipt<VoteOutcome>, PollError>
where
    S: PollStore + ?Sized,
{
    let question = store.get_question(question_id).await?.ok_or_else(|| {
        warn!(user = %user, question_id, "vote on unknown question");
        PollError::NotFound
    })?;

    if !question.can_vote(now) {
        warn!(user = %user, question_id, "vote outside voting window");
        return Err(PollError::VotingClosed);
    }

    let choice = resolve_selection(store, question_id, selection).await.inspect_err(|e| {
        error!(user = %user, question_id, err = %e, "failed to get selected choice");
    })?;

    let write = store.upsert_vote(user.id, question_id, choice.id).await?;

    if write.created {
        info!(user = %user, question_id, choice_id = choice.id, "voted");
        Ok(Receipt {
            outcome: VoteOutcome::Voted,
            message: format!("You have voted \"{}\"", choice.choice_text),
            question_id,
            choice_id: Some(choice.id),
        })
    } else {
        info!(user = %user, question_id, choice_id = choice.id, "changed vote");
        Ok(Receipt {
            outcome: VoteOutcome::Changed,
            message: format!("Your vote was changed to \"{}\"", choice.choice_text),
            question_id,
            choice_id: Some(choice.id),
        })
    }
}

async fn resolve_selection<S>(
    store: &S,
    question_id: QuestionId,
    selection: Option<ChoiceId>,
) -> Result<Choice, PollError>
where
    S: PollStore + ?Sized,
{
    let choice_id = selection.ok_or(PollError::InvalidSelection)?;
    store
        .find_choice(question_id, choice_id)
        .await?
        .ok_or(PollError::InvalidSelection)
}

/// Removes `user`'s vote on the question. Repeating the call is harmless and
/// reports [`PollError::NoExistingVote`].
///
/// Not gated on the voting window: a vote can be withdrawn after the question
/// closes, so `_now` is unused.
pub async fn unvote<S>(
    store: &S,
    question_id: QuestionId,
    user: &User,
    _now: DateTime<Utc>,
) -> Result<Receipt<UnvoteOutcome>, PollError>
where
    S: PollStore + ?Sized,
{
    if store.get_question(question_id).await?.is_none() {
        warn!(user = %user, question_id, "unvote on unknown question");
        return Err(PollError::NotFound);
    }

    match store.delete_vote(user.id, question_id).await? {
        Some(vote) => {
            info!(user = %user, question_id, vote_id = vote.id, "deleted vote");
            Ok(Receipt {
                outcome: UnvoteOutcome::Deleted,
                message: "You've successfully deleted your vote".to_string(),
                question_id,
                choice_id: Some(vote.choice_id),
            })
        }
        None => {
            error!(user = %user, question_id, "tried to delete non-existent vote");
            Err(PollError::NoExistingVote)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::models::{NewQuestion, Question};
    use crate::store::MemoryStore;

    async fn poll_with_choices(store: &MemoryStore, question: NewQuestion) -> (Question, Vec<Choice>) {
        let question = store.create_question(question).await.unwrap();
        let mut choices = Vec::new();
        for n in 1..=3 {
            choices.push(store.add_choice(question.id, &format!("Choice {n}")).await.unwrap());
        }
        (question, choices)
    }

    async fn counts(store: &MemoryStore, question_id: QuestionId) -> Vec<i64> {
        store
            .tally(question_id)
            .await
            .unwrap()
            .into_iter()
            .map(|tally| tally.votes)
            .collect()
    }

    #[tokio::test]
    async fn vote_then_change() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let user = User::new(Uuid::new_v4());

        let receipt = vote(&store, question.id, Some(choices[0].id), &user, now).await.unwrap();
        assert_eq!(receipt.outcome, VoteOutcome::Voted);
        assert_eq!(receipt.message, "You have voted \"Choice 1\"");
        assert_eq!(counts(&store, question.id).await, vec![1, 0, 0]);

        let receipt = vote(&store, question.id, Some(choices[1].id), &user, now).await.unwrap();
        assert_eq!(receipt.outcome, VoteOutcome::Changed);
        assert_eq!(receipt.message, "Your vote was changed to \"Choice 2\"");
        assert_eq!(counts(&store, question.id).await, vec![0, 1, 0]);
    }

    #[tokio::test]
    async fn revoting_same_choice_is_idempotent() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let user = User::new(Uuid::new_v4());

        vote(&store, question.id, Some(choices[2].id), &user, now).await.unwrap();
        let receipt = vote(&store, question.id, Some(choices[2].id), &user, now).await.unwrap();

        assert_eq!(receipt.outcome, VoteOutcome::Changed);
        assert_eq!(counts(&store, question.id).await, vec![0, 0, 1]);
    }

    #[tokio::test]
    async fn one_vote_per_user_per_question() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::days(1))).await;
        let alice = User::new(Uuid::new_v4());
        let bob = User::new(Uuid::new_v4());

        for choice in choices.iter().chain(choices.iter().rev()) {
            vote(&store, question.id, Some(choice.id), &alice, now).await.unwrap();
            assert_eq!(store.vote_count(question.id).await, 1);
        }
        vote(&store, question.id, Some(choices[1].id), &bob, now).await.unwrap();

        assert_eq!(store.vote_count(question.id).await, 2);
        assert_eq!(counts(&store, question.id).await, vec![1, 1, 0]);
    }

    #[tokio::test]
    async fn vote_requires_existing_question() {
        let store = MemoryStore::new();
        let user = User::new(Uuid::new_v4());
        let result = vote(&store, 999, Some(1), &user, Utc::now()).await;
        assert!(matches!(result, Err(PollError::NotFound)));
    }

    #[tokio::test]
    async fn missing_or_foreign_selection_is_invalid() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, _) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let (_, other_choices) =
            poll_with_choices(&store, NewQuestion::new("Dinner?", now - Duration::hours(1))).await;
        let user = User::new(Uuid::new_v4());

        let missing = vote(&store, question.id, None, &user, now).await;
        assert!(matches!(missing, Err(PollError::InvalidSelection)));

        let foreign = vote(&store, question.id, Some(other_choices[0].id), &user, now).await;
        assert!(matches!(foreign, Err(PollError::InvalidSelection)));

        let unknown = vote(&store, question.id, Some(-1), &user, now).await;
        assert!(matches!(unknown, Err(PollError::InvalidSelection)));

        assert_eq!(store.vote_count(question.id).await, 0);
    }

    #[tokio::test]
    async fn cannot_vote_outside_window() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let user = User::new(Uuid::new_v4());

        let (future, choices) =
            poll_with_choices(&store, NewQuestion::new("Later?", now + Duration::hours(1))).await;
        let result = vote(&store, future.id, Some(choices[0].id), &user, now).await;
        assert!(matches!(result, Err(PollError::VotingClosed)));

        let (ended, choices) = poll_with_choices(
            &store,
            NewQuestion::new("Over?", now - Duration::days(1)).ending_at(now - Duration::seconds(1)),
        )
        .await;
        let result = vote(&store, ended.id, Some(choices[0].id), &user, now).await;
        assert!(matches!(result, Err(PollError::VotingClosed)));

        assert_eq!(store.vote_count(future.id).await, 0);
        assert_eq!(store.vote_count(ended.id).await, 0);
    }

    #[tokio::test]
    async fn unvote_twice() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let user = User::new(Uuid::new_v4());
        vote(&store, question.id, Some(choices[0].id), &user, now).await.unwrap();

        let receipt = unvote(&store, question.id, &user, now).await.unwrap();
        assert_eq!(receipt.outcome, UnvoteOutcome::Deleted);
        assert_eq!(store.vote_count(question.id).await, 0);

        let again = unvote(&store, question.id, &user, now).await;
        assert!(matches!(again, Err(PollError::NoExistingVote)));
        assert_eq!(store.vote_count(question.id).await, 0);
    }

    #[tokio::test]
    async fn unvote_without_vote() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let other = User::new(Uuid::new_v4());
        vote(&store, question.id, Some(choices[0].id), &other, now).await.unwrap();

        let user = User::new(Uuid::new_v4());
        let result = unvote(&store, question.id, &user, now).await;

        assert!(matches!(result, Err(PollError::NoExistingVote)));
        assert!(store.user_vote(user.id, question.id).await.unwrap().is_none());
        assert_eq!(counts(&store, question.id).await, vec![1, 0, 0]);
    }

    #[tokio::test]
    async fn unvote_unknown_question() {
        let store = MemoryStore::new();
        let user = User::new(Uuid::new_v4());
        let result = unvote(&store, 7, &user, Utc::now()).await;
        assert!(matches!(result, Err(PollError::NotFound)));
    }

    #[tokio::test]
    async fn counts_follow_votes_after_mixed_operations() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, choices) =
            poll_with_choices(&store, NewQuestion::new("Lunch?", now - Duration::hours(1))).await;
        let users: Vec<User> = (0..4).map(|_| User::new(Uuid::new_v4())).collect();

        for (i, user) in users.iter().enumerate() {
            vote(&store, question.id, Some(choices[i % 3].id), user, now).await.unwrap();
        }
        vote(&store, question.id, Some(choices[2].id), &users[0], now).await.unwrap();
        unvote(&store, question.id, &users[1], now).await.unwrap();

        // users[0] -> 3, users[2] -> 3, users[3] -> 1
        assert_eq!(counts(&store, question.id).await, vec![1, 0, 2]);
    }
}
