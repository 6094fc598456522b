//! Question records and the built-in question bank.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use finansiki_core::{DomainError, DomainResult};
use finansiki_ledger::Amount;

/// One quiz question. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the right answer.
    pub correct: usize,
    pub explanation: String,
    pub reward: Amount,
}

impl Question {
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct
    }
}

/// Ordered, validated list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> DomainResult<Self> {
        if questions.is_empty() {
            return Err(DomainError::validation("question bank cannot be empty"));
        }

        let mut ids = HashSet::new();
        for q in &questions {
            if !ids.insert(q.id.as_str()) {
                return Err(DomainError::validation(format!("duplicate question id: {}", q.id)));
            }
            if q.prompt.trim().is_empty() {
                return Err(DomainError::validation(format!("question {} has no prompt", q.id)));
            }
            if q.options.len() < 2 {
                return Err(DomainError::validation(format!(
                    "question {} needs at least two options",
                    q.id
                )));
            }
            if q.correct >= q.options.len() {
                return Err(DomainError::validation(format!(
                    "question {}: correct option {} is out of range",
                    q.id, q.correct
                )));
            }
        }
        if total_reward(&questions).is_none() {
            return Err(DomainError::validation("total quiz reward does not fit in a balance"));
        }

        Ok(Self { questions })
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Sum of every reward, i.e. the score of a perfect run.
    pub fn max_score(&self) -> u64 {
        total_reward(&self.questions).unwrap_or(u64::MAX)
    }
}

fn total_reward(questions: &[Question]) -> Option<u64> {
    questions
        .iter()
        .try_fold(0u64, |total, q| total.checked_add(q.reward.get()))
}

fn question(
    id: &str,
    prompt: &str,
    options: [&str; 4],
    correct: usize,
    explanation: &str,
    reward: Amount,
) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct,
        explanation: explanation.to_string(),
        reward,
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self {
            questions: vec![
                question(
                    "1",
                    "Что нужно сделать с деньгами в первую очередь?",
                    ["Потратить на сладости", "Отложить часть на сбережения", "Дать другу", "Потерять"],
                    1,
                    "Правильно! Сначала нужно отложить деньги на сбережения, а потом тратить.",
                    const { Amount::from_literal(50) },
                ),
                question(
                    "2",
                    "Что такое бюджет?",
                    ["Большая сумма денег", "План доходов и расходов", "Кошелек", "Банкомат"],
                    1,
                    "Верно! Бюджет - это план того, сколько денег ты получаешь и тратишь.",
                    const { Amount::from_literal(75) },
                ),
                question(
                    "3",
                    "Для чего нужны сбережения?",
                    [
                        "Чтобы хранить дома",
                        "На случай непредвиденных трат",
                        "Чтобы похвастаться",
                        "Не нужны вообще",
                    ],
                    1,
                    "Отлично! Сбережения помогают в сложных ситуациях и для больших покупок.",
                    const { Amount::from_literal(100) },
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_is_valid() {
        let bank = QuestionBank::default();
        let rebuilt = QuestionBank::new(bank.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt, bank);
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.max_score(), 225);
        let rewards: Vec<u64> = bank.iter().map(|q| q.reward.get()).collect();
        assert_eq!(rewards, vec![50, 75, 100]);
    }

    #[test]
    fn correct_index_must_be_in_range() {
        let mut q = QuestionBank::default().get(0).unwrap().clone();
        q.correct = 4;
        let err = QuestionBank::new(vec![q]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn total_reward_must_fit_in_a_balance() {
        let mut first = QuestionBank::default().get(0).unwrap().clone();
        first.reward = Amount::new(u64::MAX).unwrap();
        let mut second = first.clone();
        second.id = "q2".to_string();

        let err = QuestionBank::new(vec![first.clone(), second]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let single = QuestionBank::new(vec![first]).unwrap();
        assert_eq!(single.max_score(), u64::MAX);
    }

    #[test]
    fn empty_bank_is_rejected() {
        assert!(QuestionBank::new(vec![]).is_err());
    }

    #[test]
    fn questions_deserialize_from_json() {
        let json = r#"{
            "id": "q",
            "prompt": "Сколько будет 2+2?",
            "options": ["3", "4"],
            "correct": 1,
            "explanation": "Четыре.",
            "reward": 10
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.is_correct(1));
        assert_eq!(q.reward.get(), 10);
    }
}
