//! Lexical signal detectors
//!
//! Shallow keyword and pattern classifiers over utterance text. Nothing here
//! tries to understand the text; a keyword hit is the whole signal.

use regex::Regex;

use crate::config::SchedulerConfig;
use crate::error::SchedulerResult;
use crate::message::Message;

/// Stateless classifiers built from a [`SchedulerConfig`]
#[derive(Debug, Clone)]
pub struct SignalDetectors {
    config: SchedulerConfig,
}

impl SignalDetectors {
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Degenerate output from a content generator: too short, the speaker's
    /// own name, or a leading colon left over from a "name:" prefix
    pub fn is_anomalous(&self, content: &str, speaker: &str) -> bool {
        let content = content.trim();
        content.chars().count() < self.config.anomaly_min_chars
            || content == speaker
            || content.starts_with(':')
    }

    pub fn is_termination(&self, content: &str) -> bool {
        contains_any(content, &self.config.termination_keywords)
    }

    pub fn is_discussion_trigger(&self, content: &str) -> bool {
        contains_any(content, &self.config.discussion_triggers)
    }

    pub fn is_question(&self, content: &str) -> bool {
        contains_any(content, &self.config.question_markers)
    }

    /// Question test for Teacher utterances, which also accepts open-question words
    pub fn is_teacher_question(&self, content: &str) -> bool {
        self.is_question(content) || contains_any(content, &self.config.open_question_markers)
    }

    pub fn is_opinion_or_hedge(&self, content: &str) -> bool {
        contains_any(content, &self.config.opinion_keywords)
    }

    /// Whether `content` calls on `name`
    ///
    /// Compiles the templates on every call; the dispatcher keeps
    /// precompiled [`AddressMatcher`]s for registered students instead.
    pub fn addresses(&self, content: &str, name: &str) -> SchedulerResult<bool> {
        Ok(self.address_matcher(name)?.matches(content))
    }

    pub fn address_matcher(&self, name: &str) -> SchedulerResult<AddressMatcher> {
        Ok(AddressMatcher {
            name: name.to_string(),
            patterns: self.config.addressing.compile_for(name)?,
        })
    }

    /// Whether any of the messages preceding the latest one inside the
    /// lookback window was a question from `teacher_id`
    pub fn teacher_asked_recently(&self, history: &[Message], teacher_id: &str) -> bool {
        let end = history.len().saturating_sub(1);
        let start = history.len().saturating_sub(self.config.teacher_question_lookback);
        history[start.min(end)..end]
            .iter()
            .any(|m| m.speaker == teacher_id && self.is_question(&m.content))
    }
}

/// Precompiled addressing patterns for one participant name
#[derive(Debug, Clone)]
pub struct AddressMatcher {
    name: String,
    patterns: Vec<Regex>,
}

impl AddressMatcher {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(content))
    }
}

fn contains_any(content: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| content.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detectors() -> SignalDetectors {
        SignalDetectors::new(SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn test_anomaly_detection() {
        let d = detectors();
        assert!(d.is_anomalous("好的", "StudentA"));
        assert!(d.is_anomalous("  ok  ", "StudentA"));
        assert!(d.is_anomalous("StudentA", "StudentA"));
        assert!(d.is_anomalous(":Teacher 这是个很好的思考", "Teacher"));
        assert!(!d.is_anomalous("我觉得物体会保持原来的状态", "StudentA"));
        // Five CJK characters reach the minimum length
        assert!(!d.is_anomalous("惯性很重要", "StudentB"));
    }

    #[test]
    fn test_termination_keywords() {
        let d = detectors();
        assert!(d.is_termination("下课，谢谢大家"));
        assert!(d.is_termination("好，今天的讨论结束了"));
        assert!(!d.is_termination("我们继续上课"));
    }

    #[test]
    fn test_discussion_trigger() {
        let d = detectors();
        assert!(d.is_discussion_trigger("大家可以互相讨论一下"));
        assert!(d.is_discussion_trigger("你们觉得呢？"));
        assert!(!d.is_discussion_trigger("StudentA，你来回答"));
    }

    #[test]
    fn test_question_markers() {
        let d = detectors();
        assert!(d.is_question("这是为什么？"));
        assert!(d.is_question("Is it?"));
        assert!(d.is_question("你明白吗"));
        assert!(!d.is_question("为什么物体会停下来"));
        assert!(d.is_teacher_question("为什么物体会停下来"));
        assert!(d.is_teacher_question("如何理解惯性"));
    }

    #[test]
    fn test_opinion_keywords() {
        let d = detectors();
        assert!(d.is_opinion_or_hedge("我觉得应该是这样"));
        assert!(d.is_opinion_or_hedge("但是有摩擦力"));
        assert!(!d.is_opinion_or_hedge("惯性和质量有关。"));
    }

    #[test]
    fn test_addressing_forms() {
        let d = detectors();
        assert!(d.addresses("StudentA，你觉得呢？", "StudentA").unwrap());
        assert!(d.addresses("StudentA: 请回答", "StudentA").unwrap());
        assert!(d.addresses("StudentB,能否解释一下", "StudentB").unwrap());
        assert!(d.addresses("@StudentC 你怎么看", "StudentC").unwrap());
        assert!(d.addresses("我同意StudentA同学的看法", "StudentA").unwrap());
        assert!(!d.addresses("StudentA说得对", "StudentA").unwrap());
        assert!(!d.addresses("StudentA，你觉得呢？", "StudentB").unwrap());
    }

    #[test]
    fn test_matcher_reports_name() {
        let matcher = detectors().address_matcher("StudentA").unwrap();
        assert_eq!(matcher.name(), "StudentA");
        assert!(matcher.matches("@StudentA"));
    }

    #[test]
    fn test_teacher_asked_window() {
        let d = detectors();
        let history = vec![
            Message::new(0, "Coordinator", "Let's begin."),
            Message::new(1, "Teacher", "什么是惯性？"),
            Message::new(2, "StudentA", "就是保持原来状态的性质"),
            Message::new(3, "StudentB", "和质量有关系"),
            Message::new(4, "StudentC", "我补充一下摩擦力"),
            Message::new(5, "StudentA", "那没有摩擦力会一直动"),
        ];

        // The Teacher question sits 3 messages before the latest one
        assert!(d.teacher_asked_recently(&history[..5], "Teacher"));
        // and falls out of the window one turn later
        assert!(!d.teacher_asked_recently(&history, "Teacher"));
        // The latest message itself is never inspected
        assert!(!d.teacher_asked_recently(&history[..2], "Teacher"));
        assert!(!d.teacher_asked_recently(&[], "Teacher"));
    }
}
