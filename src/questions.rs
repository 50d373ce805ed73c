//! Question sourcing.
//!
//! Selection and filtering by level happen outside the core; the session
//! only needs an ordered list. [`FixedQuestionSet`] is the built-in
//! ten-question demo bank.

use anyhow::Result;
use async_trait::async_trait;
use mensetsu_types::{JlptLevel, Question};
#[cfg(test)]
use mockall::automock;

/// Supplies the ordered question list for a session at the given level.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn questions(&self, level: JlptLevel) -> Result<Vec<Question>>;
}

/// Fixed ten-question bank for demos and tests: two introduction questions,
/// three on past experience, two on present ability, three on future
/// vision. Each question carries a kana spoken form for the avatar.
pub struct FixedQuestionSet;

#[async_trait]
impl QuestionSource for FixedQuestionSet {
    async fn questions(&self, level: JlptLevel) -> Result<Vec<Question>> {
        tracing::debug!(%level, "serving fixed question set");
        Ok(fixed_questions())
    }
}

fn question(
    id: &str,
    order: u32,
    text: &str,
    spoken: &str,
    criteria: &[&str],
    follow_ups: &[&str],
) -> Question {
    Question {
        id: id.to_string(),
        order,
        text: text.to_string(),
        spoken_text: Some(spoken.to_string()),
        expected_duration_seconds: 60,
        evaluation_criteria: criteria.iter().map(|c| c.to_string()).collect(),
        follow_ups: follow_ups.iter().map(|f| f.to_string()).collect(),
    }
}

pub fn fixed_questions() -> Vec<Question> {
    vec![
        question(
            "Q03",
            1,
            "日本の生活には慣れましたか？",
            "にほんの　せいかつには　なれましたか？",
            &["adaptability"],
            &[],
        ),
        question(
            "Q05",
            2,
            "日本で好きな食べ物は何ですか？",
            "にほんで　すきな　たべものは　なんですか？",
            &["adaptability"],
            &[],
        ),
        question(
            "Q06",
            3,
            "日本に来ようと思った理由を教えてください。",
            "にほんに　こようと　おもった　りゆうを　おしえてください。",
            &["initiative", "retention"],
            &[
                "日本の何に魅力を感じましたか？",
                "来日前はどんな準備をしましたか？",
                "日本での生活で驚いたことはありますか？",
            ],
        ),
        question(
            "Q09",
            4,
            "日本で困った経験はありますか？どう対処しましたか？",
            "にほんで　こまった　けいけんは　ありますか？どう　たいしょ　しましたか？",
            &["adaptability", "initiative"],
            &["その経験から何を学びましたか？"],
        ),
        question(
            "Q14",
            5,
            "チームで何かを達成した経験を教えてください。",
            "チームで　なにかを　たっせいした　けいけんを　おしえてください。",
            &["cooperation"],
            &["あなたはチームでどんな役割でしたか？", "困難はありましたか？"],
        ),
        question(
            "Q18",
            6,
            "あなたの強みは何ですか？",
            "あなたの　つよみは　なんですか？",
            &["initiative"],
            &["その強みを仕事でどう活かせますか？"],
        ),
        question(
            "Q23",
            7,
            "分からないことがあったとき、どうしますか？",
            "わからないことが　あったとき、どうしますか？",
            &["communication"],
            &[],
        ),
        question(
            "Q30",
            8,
            "当社を志望した理由を教えてください。",
            "とうしゃを　しぼうした　りゆうを　おしえてください。",
            &["initiative", "retention"],
            &["他にどんな会社を検討しましたか？"],
        ),
        question(
            "Q32",
            9,
            "5年後、どのようになっていたいですか？",
            "ごねんご、どのように　なっていたいですか？",
            &["retention", "initiative"],
            &["そのために今、何をしていますか？"],
        ),
        question(
            "Q46",
            10,
            "何かご質問はありますか？",
            "なにか　ごしつもんは　ありますか？",
            &["initiative"],
            &[],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_set_is_ordered_and_complete() {
        let questions = FixedQuestionSet.questions(JlptLevel::N3).await.unwrap();
        assert_eq!(questions.len(), 10);
        for (index, question) in questions.iter().enumerate() {
            assert_eq!(question.order as usize, index + 1);
            assert!(question.spoken_text.is_some());
        }
        assert_eq!(questions[0].id, "Q03");
        assert_eq!(questions[9].id, "Q46");
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let questions = FixedQuestionSet.questions(JlptLevel::N1).await.unwrap();
        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}
