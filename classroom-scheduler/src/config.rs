//! Scheduler configuration
//!
//! Every lexicon and constant the dispatcher consults lives here so a session
//! can be retargeted to another language without touching the rule tree.
//! Defaults reproduce the reference Mandarin classroom.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Placeholder substituted with the (escaped) participant id in addressing templates
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Lexicon and constants for the turn dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Any of these ends the session ("class dismissed", "discussion over")
    pub termination_keywords: Vec<String>,
    /// Teacher phrases that open a peer discussion round
    pub discussion_triggers: Vec<String>,
    /// Markers that make an utterance a question
    pub question_markers: Vec<String>,
    /// Extra markers recognised only when the Teacher asks ("how", "why")
    pub open_question_markers: Vec<String>,
    /// Opinion and hedging keywords that invite a peer response
    pub opinion_keywords: Vec<String>,
    pub addressing: AddressingConfig,
    /// Dispatch calls spent in discussion mode before the Teacher summarises
    pub discussion_round_limit: u32,
    /// Window of messages, current one included, searched for a Teacher question
    pub teacher_question_lookback: usize,
    /// Utterances shorter than this (in characters) are anomalous
    pub anomaly_min_chars: usize,
    pub probabilities: RoutingProbabilities,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            termination_keywords: strings(&["下课", "讨论结束"]),
            discussion_triggers: strings(&[
                "互相讨论",
                "相互讨论",
                "大家讨论",
                "一起讨论",
                "互相交流",
                "相互交流",
                "大家交流",
                "一起交流",
                "你们觉得",
                "大家觉得",
                "同学们觉得",
            ]),
            question_markers: strings(&["?", "？", "吗", "呢"]),
            open_question_markers: strings(&["如何", "为什么"]),
            opinion_keywords: strings(&[
                "我觉得", "我认为", "但是", "不过", "如果", "是不是", "会不会", "应该", "可能",
                "或许", "也许", "你们觉得", "大家觉得",
            ]),
            addressing: AddressingConfig::default(),
            discussion_round_limit: 4,
            teacher_question_lookback: 4,
            anomaly_min_chars: 5,
            probabilities: RoutingProbabilities::default(),
        }
    }
}

/// Regex templates recognising that an utterance calls on a participant by name
///
/// Each template must contain `{name}`; the participant id is escaped before
/// substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingConfig {
    pub templates: Vec<String>,
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            templates: strings(&[
                r"{name}[，,：:]\s*(?:你|请|能否)",
                r"@{name}",
                r"{name}同学",
            ]),
        }
    }
}

impl AddressingConfig {
    /// Build the compiled patterns for one participant name
    pub fn compile_for(&self, name: &str) -> SchedulerResult<Vec<Regex>> {
        let escaped = regex::escape(name);
        self.templates
            .iter()
            .map(|template| Regex::new(&template.replace(NAME_PLACEHOLDER, &escaped)).map_err(Into::into))
            .collect()
    }
}

/// Probability constants of the rule tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingProbabilities {
    /// Teacher question goes to the most silent student rather than a random one
    pub silent_student_on_question: f64,
    /// Student opinion or question is handed to a peer
    pub peer_response: f64,
    /// Student answer to a recent Teacher question is reviewed by the Teacher
    pub teacher_review: f64,
    /// Unprompted student statement is followed up by the Teacher
    pub teacher_guidance: f64,
    /// Fallback routing back to the Teacher
    pub default_teacher: f64,
}

impl Default for RoutingProbabilities {
    fn default() -> Self {
        Self {
            silent_student_on_question: 0.7,
            peer_response: 0.5,
            teacher_review: 0.6,
            teacher_guidance: 0.7,
            default_teacher: 0.6,
        }
    }
}

impl RoutingProbabilities {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("silent_student_on_question", self.silent_student_on_question),
            ("peer_response", self.peer_response),
            ("teacher_review", self.teacher_review),
            ("teacher_guidance", self.teacher_guidance),
            ("default_teacher", self.default_teacher),
        ]
    }
}

impl SchedulerConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(source: &str) -> SchedulerResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document and validate it
    pub fn from_yaml_str(source: &str) -> SchedulerResult<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    /// Reject configurations the rule tree cannot run with
    pub fn validate(&self) -> SchedulerResult<()> {
        check_keywords("termination_keywords", &self.termination_keywords)?;
        check_keywords("discussion_triggers", &self.discussion_triggers)?;
        check_keywords("question_markers", &self.question_markers)?;
        check_keywords("opinion_keywords", &self.opinion_keywords)?;
        // The open-question set is an optional extension
        if self.open_question_markers.iter().any(|k| k.is_empty()) {
            return Err(invalid("open_question_markers contains an empty keyword"));
        }

        if self.addressing.templates.is_empty() {
            return Err(invalid("addressing.templates is empty"));
        }
        for template in &self.addressing.templates {
            if !template.contains(NAME_PLACEHOLDER) {
                return Err(invalid(format!(
                    "addressing template '{}' has no {} placeholder",
                    template, NAME_PLACEHOLDER
                )));
            }
        }
        self.addressing.compile_for("probe")?;

        if self.discussion_round_limit == 0 {
            return Err(invalid("discussion_round_limit must be at least 1"));
        }
        if self.teacher_question_lookback == 0 {
            return Err(invalid("teacher_question_lookback must be at least 1"));
        }
        if self.anomaly_min_chars == 0 {
            return Err(invalid("anomaly_min_chars must be at least 1"));
        }
        for (name, p) in self.probabilities.entries() {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("probability {} = {} is outside [0, 1]", name, p)));
            }
        }
        Ok(())
    }
}

fn check_keywords(field: &str, keywords: &[String]) -> SchedulerResult<()> {
    if keywords.is_empty() {
        return Err(invalid(format!("{} is empty", field)));
    }
    if keywords.iter().any(|k| k.is_empty()) {
        return Err(invalid(format!("{} contains an empty keyword", field)));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> SchedulerError {
    SchedulerError::InvalidConfig(reason.into())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedulerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.discussion_round_limit, 4);
        assert_eq!(config.teacher_question_lookback, 4);
        assert_eq!(config.anomaly_min_chars, 5);
        assert_eq!(config.probabilities.default_teacher, 0.6);
    }

    #[test]
    fn test_toml_overrides_keep_other_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            termination_keywords = ["class dismissed", "that's all"]
            discussion_round_limit = 2

            [probabilities]
            peer_response = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.termination_keywords, vec!["class dismissed", "that's all"]);
        assert_eq!(config.discussion_round_limit, 2);
        assert_eq!(config.probabilities.peer_response, 0.9);
        assert_eq!(config.probabilities.teacher_review, 0.6);
        assert!(config.question_markers.contains(&"？".to_string()));
    }

    #[test]
    fn test_yaml_config() {
        let config = SchedulerConfig::from_yaml_str(
            "question_markers: ['?']\naddressing:\n  templates: ['@{name}', '{name},\\s*could you']\n",
        )
        .unwrap();
        assert_eq!(config.question_markers, vec!["?"]);
        assert_eq!(config.addressing.templates.len(), 2);
    }

    #[test]
    fn test_empty_termination_set_is_rejected() {
        let result = SchedulerConfig::from_toml_str("termination_keywords = []");
        assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_keyword_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.opinion_keywords.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.addressing.templates = vec!["hello".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_broken_template_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.addressing.templates = vec!["{name}(".to_string()];
        assert!(matches!(config.validate(), Err(SchedulerError::Pattern(_))));
    }

    #[test]
    fn test_probability_out_of_range_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.probabilities.teacher_guidance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_round_limit_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.discussion_round_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_compile_for_escapes_name() {
        let patterns = AddressingConfig::default().compile_for("A.B").unwrap();
        assert!(patterns.iter().any(|p| p.is_match("@A.B")));
        assert!(!patterns.iter().any(|p| p.is_match("@AxB")));
    }
}
