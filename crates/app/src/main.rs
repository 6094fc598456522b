//! Scripted walk through one session: register, transfer, play the quiz,
//! then print the history tab.

use anyhow::Context;

use finansiki_app::views::{self, QuizView};
use finansiki_app::{AppConfig, QuizStep, Session, SessionError};
use finansiki_auth::{ContactChannel, RegistrationFlow};
use finansiki_core::SessionId;
use finansiki_ledger::{Amount, FriendId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to read configuration")?;
    finansiki_observability::init(config.log_format);

    let reference = config
        .load_reference_data()
        .context("failed to load reference data")?;
    let session_id = SessionId::new();

    let mut registration = RegistrationFlow::new(session_id, config.latency);
    registration
        .request_code("Юный Финансист", ContactChannel::Email, "young@example.com")
        .await?;
    let user = registration.confirm_code("1234").await?;
    println!("Добро пожаловать, {}!", user.name);

    let mut session = Session::start(session_id, config.seed_balance, reference)?;
    let card = views::card_view(&session);
    println!("{} | {} | {}", card.number, card.holder, card.balance);

    let first_friend = session.friends().iter().next().map(|f| f.id.clone());
    if let Some(friend) = first_friend {
        send(&mut session, &friend, 200)?;
        send(&mut session, &friend, 1_000_000)?;
    }

    loop {
        let answer = match views::quiz_view(session.quiz()) {
            QuizView::Completed { message } => {
                println!("{message}");
                break;
            }
            QuizView::Question { position, total, prompt, .. } => {
                println!("[{position}/{total}] {prompt}");
                session
                    .quiz()
                    .current_question()
                    .map(|q| q.correct)
                    .unwrap_or_default()
            }
        };

        let outcome = session.select_answer(answer)?;
        println!("  {}", outcome.explanation);
        if let QuizStep::Completed { score } = session.advance_quiz()? {
            tracing::info!(score, "quiz finished");
        }
    }

    println!("Баланс: {}", views::card_view(&session).balance);
    for row in views::history_rows(session.ledger()) {
        println!("{}  {:<32} {}", row.date, row.description, row.amount);
    }

    session
        .ledger()
        .verify_consistency()
        .context("ledger is inconsistent")?;
    Ok(())
}

fn send(session: &mut Session, friend: &FriendId, amount: u64) -> anyhow::Result<()> {
    match session.transfer(friend, Amount::new(amount)?) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "transfer outcome");
            Ok(())
        }
        Err(err @ SessionError::Ledger(_)) => {
            println!("{}", err.user_message().unwrap_or("Ошибка"));
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
