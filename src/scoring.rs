//! Scoring engine: level-weighted totals and weak-category detection.
//!
//! Pure functions of their inputs and the injected configuration. The
//! transcript evaluator at the bottom is a deterministic heuristic stand-in
//! for a real evaluator; only its interface (category scores in, weighted
//! total out) is load-bearing.

use chrono::Local;
use mensetsu_types::{
    CategoryFeedback, CategoryScores, EvaluationCategory, EvaluationConfig, EvaluationResult,
    JlptConfig, JlptLevel, WeakPoint, WeakPointFinding, WeakPointPriority,
};
use uuid::Uuid;

/// Weighted sum of the four category scores using the level's configured
/// weights, rounded to the nearest integer.
///
/// Weights are assumed to sum to 1.0; that is enforced when configurations
/// are loaded, not re-checked here.
pub fn calculate_total_score(scores: &CategoryScores, level: JlptLevel, jlpt: &JlptConfig) -> u8 {
    let weights = jlpt.weights_for(level);
    let total = f64::from(scores.vocabulary) * weights.vocabulary
        + f64::from(scores.grammar) * weights.grammar
        + f64::from(scores.content) * weights.content
        + f64::from(scores.honorifics) * weights.honorifics;
    total.round().clamp(0.0, 100.0) as u8
}

/// One finding per category strictly below `threshold`, carrying the
/// category's feedback as the example and a fixed improvement suggestion.
pub fn detect_weak_points(
    scores: &CategoryScores,
    feedback: &CategoryFeedback,
    threshold: u8,
) -> Vec<WeakPointFinding> {
    EvaluationCategory::ALL
        .into_iter()
        .filter(|&category| scores.get(category) < threshold)
        .map(|category| WeakPointFinding {
            category,
            description: weak_point_description(category, scores.get(category)),
            example: feedback.get(category).to_string(),
            suggestion: improvement_suggestion(category).to_string(),
        })
        .collect()
}

fn weak_point_description(category: EvaluationCategory, score: u8) -> String {
    let severity = if score < 50 {
        "大きな改善が必要"
    } else {
        "改善の余地あり"
    };
    match category {
        EvaluationCategory::Vocabulary => format!("語彙力に{severity}です"),
        EvaluationCategory::Grammar => format!("文法に{severity}です"),
        EvaluationCategory::Content => format!("回答内容に{severity}です"),
        EvaluationCategory::Honorifics => format!("敬語の使用に{severity}です"),
    }
}

/// Fixed per-category improvement advice.
pub fn improvement_suggestion(category: EvaluationCategory) -> &'static str {
    match category {
        EvaluationCategory::Vocabulary => {
            "ビジネス用語や専門用語の学習を増やし、語彙力を強化しましょう。"
        }
        EvaluationCategory::Grammar => {
            "基本的な文法パターンを復習し、特に接続表現に注意しましょう。"
        }
        EvaluationCategory::Content => {
            "質問の意図を正確に理解し、具体例を交えた論理的な回答を心がけましょう。"
        }
        EvaluationCategory::Honorifics => {
            "尊敬語・謙譲語・丁寧語の違いを学び、場面に応じた使い分けを練習しましょう。"
        }
    }
}

fn initial_priority(score: u8) -> WeakPointPriority {
    if score < 50 {
        WeakPointPriority::High
    } else if score < 70 {
        WeakPointPriority::Medium
    } else {
        WeakPointPriority::Low
    }
}

/// Heuristic placeholder evaluator over a session's combined transcript.
///
/// Scores every category from the transcript length in characters, which is
/// enough to exercise the full result pipeline until a real evaluator is
/// plugged in behind the same signature.
pub fn evaluate_answer_text(
    question_text: &str,
    transcript: &str,
    level: JlptLevel,
    config: &EvaluationConfig,
) -> EvaluationResult {
    let length = transcript.chars().count();
    tracing::debug!(
        question = %question_text,
        transcript_chars = length,
        %level,
        "evaluating transcript"
    );

    let base = match length {
        0 => 35,
        1..=19 => 50,
        20..=49 => 65,
        50..=99 => 75,
        _ => 85,
    };
    let scores = CategoryScores::new(base, base, base, base);

    let feedback = if length == 0 {
        CategoryFeedback {
            vocabulary: "音声が認識されませんでした。マイクの設定を確認してください。".into(),
            grammar: "回答が記録されていないため評価できません。".into(),
            content: "回答が記録されていないため評価できません。".into(),
            honorifics: "回答が記録されていないため評価できません。".into(),
        }
    } else {
        CategoryFeedback {
            vocabulary: "適切な語彙を使用しています。より専門的な表現を増やすとさらに良くなります。"
                .into(),
            grammar: "基本的な文法は正確です。複文の構造に注意しましょう。".into(),
            content: "質問の意図を理解した回答ができています。具体例を追加するとより説得力が増します。"
                .into(),
            honorifics: "丁寧語は適切に使用できています。謙譲語と尊敬語の区別を意識しましょう。"
                .into(),
        }
    };

    let total_score = calculate_total_score(&scores, level, &config.jlpt);
    let now = Local::now();
    let weak_points = detect_weak_points(&scores, &feedback, config.weak_point.threshold)
        .into_iter()
        .map(|finding| WeakPoint {
            id: Uuid::new_v4().to_string(),
            priority: initial_priority(scores.get(finding.category)),
            category: finding.category,
            description: finding.description,
            example: finding.example,
            suggestion: finding.suggestion,
            occurrence_count: 1,
            last_occurred_at: now,
            resolved: false,
        })
        .collect();

    let overall_feedback = if total_score >= 70 {
        "良い回答でした。引き続き練習を重ねて、さらなる向上を目指しましょう。".to_string()
    } else {
        "改善が必要な回答でした。特に敬語の使い方と文法に注意して、繰り返し練習しましょう。"
            .to_string()
    };

    EvaluationResult {
        scores,
        feedback,
        weak_points,
        overall_feedback,
        total_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n3_weighted_total_matches_hand_computation() {
        // 80*0.25 + 70*0.30 + 90*0.25 + 60*0.20 = 20 + 21 + 22.5 + 12 = 75.5
        let scores = CategoryScores::new(80, 70, 90, 60);
        let total = calculate_total_score(&scores, JlptLevel::N3, &JlptConfig::default());
        assert_eq!(total, 76);
    }

    #[test]
    fn n5_weighting_favors_vocabulary_and_grammar() {
        let scores = CategoryScores::new(100, 100, 0, 0);
        let total = calculate_total_score(&scores, JlptLevel::N5, &JlptConfig::default());
        assert_eq!(total, 75); // 0.35 + 0.40 of 100
    }

    #[test]
    fn detection_is_strictly_below_threshold() {
        let scores = CategoryScores::new(70, 69, 100, 0);
        let found = detect_weak_points(&scores, &CategoryFeedback::default(), 70);
        let categories: Vec<_> = found.iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![EvaluationCategory::Grammar, EvaluationCategory::Honorifics]
        );
    }

    #[test]
    fn description_severity_switches_below_fifty() {
        let scores = CategoryScores::new(49, 69, 100, 100);
        let found = detect_weak_points(&scores, &CategoryFeedback::default(), 70);
        assert!(found[0].description.contains("大きな改善が必要"));
        assert!(found[1].description.contains("改善の余地あり"));
    }

    #[test]
    fn empty_transcript_scores_low_and_flags_every_category() {
        let config = EvaluationConfig::default();
        let result = evaluate_answer_text("面接全体", "", JlptLevel::N3, &config);
        assert_eq!(result.scores.vocabulary, 35);
        assert_eq!(result.weak_points.len(), 4);
        assert!(result.total_score < 70);
        assert!(result
            .weak_points
            .iter()
            .all(|wp| wp.priority == WeakPointPriority::High));
    }

    #[test]
    fn long_transcript_scores_above_weakness_threshold() {
        let config = EvaluationConfig::default();
        let transcript = "私は以前の職場でチームリーダーとして働いておりました。\
                          お客様との折衝や後輩の指導を担当し、売上目標を達成するために\
                          チーム全体で協力して取り組みました。";
        let result = evaluate_answer_text("面接全体", transcript, JlptLevel::N3, &config);
        assert_eq!(result.scores.vocabulary, 75);
        assert!(result.weak_points.is_empty());
        assert!(result.total_score >= 70);
    }
}
