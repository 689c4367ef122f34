use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which of the two extraction templates a document gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    CaseStudy,
    WrittenAssessment,
}

impl AssessmentKind {
    /// Any mention of "case study" (case-insensitive) selects the case-study template.
    pub fn detect(content: &str) -> Self {
        if content.to_lowercase().contains("case study") {
            AssessmentKind::CaseStudy
        } else {
            AssessmentKind::WrittenAssessment
        }
    }

    /// The `assessment_type` literal the model is asked to report.
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentKind::CaseStudy => "case_study",
            AssessmentKind::WrittenAssessment => "written_assessment",
        }
    }
}

/// Read-only view over a parsed model reply, used for logging only.
/// Missing or oddly-typed fields are tolerated; the reply itself is never altered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionSummary {
    pub reported_type: Option<String>,
    pub question_count: usize,
    pub has_case_study_context: bool,
}

impl ExtractionSummary {
    pub fn from_value(value: &Value) -> Self {
        let reported_type = value
            .get("assessment_type")
            .and_then(|v| v.as_str())
            .map(String::from);
        let question_count = value
            .get("questions_and_answers")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .or_else(|| value.as_array().map(|a| a.len()))
            .unwrap_or(0);
        let has_case_study_context = value
            .get("case_study_context")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.trim().is_empty());

        Self {
            reported_type,
            question_count,
            has_case_study_context,
        }
    }

    /// True when the model reported a type other than the one we prompted for.
    pub fn disagrees_with(&self, kind: AssessmentKind) -> bool {
        self.reported_type
            .as_deref()
            .is_some_and(|t| t != kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_detect_case_study_any_case() {
        assert_eq!(
            AssessmentKind::detect("Read the following CASE STUDY and answer."),
            AssessmentKind::CaseStudy
        );
        assert_eq!(
            AssessmentKind::detect("case study: Acme Ltd"),
            AssessmentKind::CaseStudy
        );
        assert_eq!(
            AssessmentKind::detect("This Case Study covers..."),
            AssessmentKind::CaseStudy
        );
    }

    #[test]
    fn test_detect_written_assessment_otherwise() {
        assert_eq!(
            AssessmentKind::detect(
                "Question 1: Explain TCP handshake. Suggested answer: SYN, SYN-ACK, ACK."
            ),
            AssessmentKind::WrittenAssessment
        );
        assert_eq!(AssessmentKind::detect(""), AssessmentKind::WrittenAssessment);
        // Substring must be contiguous
        assert_eq!(
            AssessmentKind::detect("a case for further study"),
            AssessmentKind::WrittenAssessment
        );
    }

    #[test]
    fn test_kind_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&AssessmentKind::CaseStudy).unwrap(),
            "\"case_study\""
        );
        let kind: AssessmentKind = serde_json::from_str("\"written_assessment\"").unwrap();
        assert_eq!(kind, AssessmentKind::WrittenAssessment);
        assert_eq!(AssessmentKind::WrittenAssessment.as_str(), "written_assessment");
    }

    #[test]
    fn test_summary_reads_full_reply() {
        let value = json!({
            "assessment_type": "case_study",
            "case_study_context": "Acme is a retailer...",
            "questions_and_answers": [{"question_number": 1}, {"question_number": 2}]
        });
        let summary = ExtractionSummary::from_value(&value);
        assert_eq!(summary.reported_type.as_deref(), Some("case_study"));
        assert_eq!(summary.question_count, 2);
        assert!(summary.has_case_study_context);
        assert!(!summary.disagrees_with(AssessmentKind::CaseStudy));
        assert!(summary.disagrees_with(AssessmentKind::WrittenAssessment));
    }

    #[test]
    fn test_summary_tolerates_unexpected_shapes() {
        let summary = ExtractionSummary::from_value(&json!([{"question": "a"}]));
        assert_eq!(summary.question_count, 1);
        assert!(summary.reported_type.is_none());
        assert!(!summary.disagrees_with(AssessmentKind::CaseStudy));

        let summary = ExtractionSummary::from_value(&json!("just a string"));
        assert_eq!(summary, ExtractionSummary::default());
    }
}
