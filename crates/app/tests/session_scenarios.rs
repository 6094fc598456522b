//! Black-box scenarios against the public session API.

use std::time::Duration;

use proptest::prelude::*;

use finansiki_app::views::{self, QuizView};
use finansiki_app::{ConfigError, QuizStep, ReferenceData, Session, SessionError, TransferOutcome};
use finansiki_auth::{ContactChannel, LatencyConfig, RegistrationFlow, RegistrationPhase};
use finansiki_core::{DomainError, SessionId};
use finansiki_ledger::{Amount, FriendId, LedgerError, TransactionKind};

fn amount(value: u64) -> Amount {
    Amount::new(value).unwrap()
}

fn new_session() -> Session {
    Session::start(SessionId::new(), amount(1000), ReferenceData::default()).unwrap()
}

fn anya() -> FriendId {
    FriendId::new("1")
}

#[test]
fn transfer_reward_and_refusal_scenario() {
    let mut session = new_session();
    assert_eq!(views::card_view(&session).balance, "1\u{a0}000\u{a0}₽");

    let outcome = session.transfer(&anya(), amount(200)).unwrap();
    let TransferOutcome::Sent(tx) = outcome else {
        panic!("expected transfer to be sent");
    };
    assert_eq!(session.balance(), 800);
    assert_eq!(tx.kind, TransactionKind::Sent);
    assert_eq!(tx.amount.get(), 200);
    assert_eq!(tx.description, "Перевод для Аня");

    let tx = session.reward(amount(50)).unwrap();
    assert_eq!(session.balance(), 850);
    assert_eq!(tx.kind, TransactionKind::Reward);
    assert_eq!(session.ledger().latest(), Some(&tx));

    let history_before: Vec<_> = session.ledger().history().cloned().collect();
    let err = session.transfer(&anya(), amount(2000)).unwrap_err();
    assert_eq!(
        err,
        SessionError::Ledger(LedgerError::InsufficientFunds {
            requested: 2000,
            available: 850
        })
    );
    assert_eq!(session.balance(), 850);
    let history_after: Vec<_> = session.ledger().history().cloned().collect();
    assert_eq!(history_after, history_before);
}

#[test]
fn history_tab_lists_most_recent_first() {
    let mut session = new_session();
    session.transfer(&FriendId::new("2"), amount(100)).unwrap();
    session.reward(amount(75)).unwrap();

    let rows = views::history_rows(session.ledger());
    let lines: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.description.as_str(), r.amount.as_str()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("Награда за правильный ответ", "+75\u{a0}₽"),
            ("Перевод для Петя", "-100\u{a0}₽"),
            ("Начальный баланс", "+1\u{a0}000\u{a0}₽"),
        ]
    );
}

#[test]
fn perfect_quiz_run_pays_every_reward_once() {
    let mut session = new_session();
    let mut steps = Vec::new();

    while let Some(correct) = session.quiz().current_question().map(|q| q.correct) {
        let outcome = session.select_answer(correct).unwrap();
        assert!(outcome.correct);
        steps.push(session.advance_quiz().unwrap());
    }

    assert_eq!(
        steps,
        vec![
            QuizStep::NextQuestion(1),
            QuizStep::NextQuestion(2),
            QuizStep::Completed { score: 225 },
        ]
    );
    assert_eq!(session.balance(), 1225);
    assert_eq!(session.ledger().totals().rewarded, 225);
    assert_eq!(
        views::quiz_view(session.quiz()),
        QuizView::Completed {
            message: "Ты завершил игру и заработал 225₽!".to_string()
        }
    );

    // Replaying after a reset pays again; earlier rewards stay.
    session.reset_quiz().unwrap();
    session.select_answer(1).unwrap();
    assert_eq!(session.balance(), 1275);
}

#[test]
fn quiz_view_tracks_reveal() {
    let mut session = new_session();

    let QuizView::Question { feedback, next_label, options, .. } = views::quiz_view(session.quiz()) else {
        panic!("expected a question");
    };
    assert_eq!(feedback, None);
    assert_eq!(next_label, None);
    assert_eq!(options[0].letter, 'A');

    session.select_answer(1).unwrap();
    let QuizView::Question {
        position,
        feedback,
        reward_note,
        next_label,
        ..
    } = views::quiz_view(session.quiz())
    else {
        panic!("expected a question");
    };
    assert_eq!(position, 1);
    assert_eq!(feedback.as_deref(), Some("Правильно!"));
    assert_eq!(reward_note.as_deref(), Some("+50₽ к балансу!"));
    assert_eq!(next_label, Some("Следующий вопрос"));
}

fn bank_json(rewards: &[u64]) -> String {
    let questions: Vec<String> = rewards
        .iter()
        .enumerate()
        .map(|(i, reward)| {
            format!(
                r#"{{ "id": "q{i}", "prompt": "Вопрос {i}", "options": ["да", "нет"],
                     "correct": 0, "explanation": "Так и есть.", "reward": {reward} }}"#
            )
        })
        .collect();
    format!(r#"{{ "questions": [{}] }}"#, questions.join(","))
}

#[test]
fn reference_bank_with_overflowing_rewards_is_refused() {
    let err = ReferenceData::from_json(&bank_json(&[u64::MAX, u64::MAX])).unwrap_err();
    assert!(matches!(err, ConfigError::ReferenceData(DomainError::Validation(_))));
}

#[test]
fn correct_answer_the_ledger_cannot_hold_changes_nothing() {
    let reference = ReferenceData::from_json(&bank_json(&[u64::MAX])).unwrap();
    let mut session = Session::start(SessionId::new(), amount(1000), reference).unwrap();
    let sub = session.subscribe();

    let err = session.select_answer(0).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Ledger(LedgerError::Domain(DomainError::InvariantViolation(_)))
    ));
    assert_eq!(session.balance(), 1000);
    assert_eq!(session.quiz().score(), 0);
    assert!(!session.quiz().is_revealed());
    assert!(sub.drain().is_empty());
    assert!(session.advance_quiz().is_err());

    // Spending first makes room for the reward.
    session.transfer(&anya(), amount(1000)).unwrap();
    let outcome = session.select_answer(0).unwrap();
    assert_eq!(outcome.reward, Some(amount(u64::MAX)));
    assert_eq!(session.balance(), u64::MAX);
    assert_eq!(session.quiz().score(), u64::MAX);
    session.ledger().verify_consistency().unwrap();
}

#[tokio::test(start_paused = true)]
async fn registration_then_session() {
    let session_id = SessionId::new();
    let mut flow = RegistrationFlow::new(session_id, LatencyConfig::default());

    flow.request_code("Юля", ContactChannel::Phone, "79991234567")
        .await
        .unwrap();
    assert_eq!(flow.phase(), RegistrationPhase::Verifying);
    assert_eq!(
        finansiki_auth::format_phone_display(flow.registration().contact()),
        "+7 (999) 123-45-67"
    );

    let user = flow.confirm_code("0000").await.unwrap();
    assert_eq!(user.name, "Юля");

    let session = Session::start(session_id, amount(1000), ReferenceData::default()).unwrap();
    assert_eq!(session.id(), session_id);
}

#[tokio::test]
async fn zero_latency_registration() {
    let mut flow = RegistrationFlow::new(
        SessionId::new(),
        LatencyConfig {
            send_code: Duration::ZERO,
            verify_code: Duration::ZERO,
        },
    );
    flow.request_code("Юля", ContactChannel::Email, "yulya@example.com")
        .await
        .unwrap();
    assert!(flow.confirm_code("12").await.is_err());
    assert!(flow.confirm_code("1234").await.is_ok());
}

#[derive(Debug, Clone)]
enum Action {
    Transfer { friend: usize, amount: u64 },
    Answer(usize),
    Advance,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..6, 1u64..1500).prop_map(|(friend, amount)| Action::Transfer { friend, amount }),
        (0usize..4).prop_map(Action::Answer),
        Just(Action::Advance),
    ]
}

proptest! {
    /// Property: whatever the presentation layer does, balance equals seed
    /// plus credited rewards minus sent transfers, and history holds one
    /// entry per applied operation plus the seed.
    #[test]
    fn session_balance_is_always_consistent(actions in prop::collection::vec(action(), 0..60)) {
        let mut session = new_session();
        let mut expected: i128 = 1000;
        let mut applied = 0usize;

        for action in actions {
            match action {
                Action::Transfer { friend, amount: value } => {
                    let id = FriendId::new((friend + 1).to_string());
                    match session.transfer(&id, amount(value)) {
                        Ok(TransferOutcome::Sent(_)) => {
                            expected -= i128::from(value);
                            applied += 1;
                        }
                        Ok(TransferOutcome::UnknownRecipient) => prop_assert!(friend >= 4),
                        Err(SessionError::Ledger(LedgerError::InsufficientFunds { .. })) => {}
                        Err(other) => prop_assert!(false, "unexpected: {other}"),
                    }
                }
                Action::Answer(index) => {
                    if let Ok(outcome) = session.select_answer(index) {
                        if let Some(reward) = outcome.reward {
                            expected += i128::from(reward.get());
                            applied += 1;
                        }
                    }
                }
                Action::Advance => {
                    let _ = session.advance_quiz();
                }
            }
            prop_assert_eq!(i128::from(session.balance()), expected);
        }

        prop_assert_eq!(session.ledger().history().len(), 1 + applied);
        prop_assert!(session.ledger().verify_consistency().is_ok());
    }
}
