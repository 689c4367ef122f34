// Assessment extraction prompt templates.
// Both assessment kinds share one template; `FieldSchema` carries what differs.

use crate::assessment::models::AssessmentKind;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, VERBATIM_INSTRUCTION};

/// System prompt for assessment extraction.
pub fn extraction_system() -> String {
    format!(
        "You are an assistant that extracts structured information from text. {JSON_ONLY_SYSTEM}"
    )
}

/// The per-kind parts of the extraction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub kind: AssessmentKind,
    /// Opening instruction sentence.
    pub intro: &'static str,
    /// Example value shown for `case_study_context`.
    pub context_example: &'static str,
    /// Whether the field list asks for the case study context.
    pub requests_context: bool,
}

impl FieldSchema {
    pub fn for_kind(kind: AssessmentKind) -> Self {
        match kind {
            AssessmentKind::CaseStudy => FieldSchema {
                kind,
                intro: "Extract the case study context only once, exactly as it is written in the document. \
                        Then extract all the questions and suggested answers in the specified format.",
                context_example: "<case study content>",
                requests_context: true,
            },
            AssessmentKind::WrittenAssessment => FieldSchema {
                kind,
                intro: "Extract all the questions and suggested answers in the specified format.",
                context_example: "",
                requests_context: false,
            },
        }
    }
}

const FIELD_LIST: &str = r#"Each question item must have the following structure:
- 'duration': the total duration of the assessment. Give only the number, without any unit (for example 30, 60, 120).
- 'assessment_instruction': the instructions to the candidate, as an array of points.
- 'question_number'
- 'question'
- 'question_instruction': the instruction that comes after the question number, usually in parentheses.
- 'comparison_count': the count given after the "Suggested answer" heading. If it is not there, take it from the question. If it is in neither place, use "all".
- 'comparison_instruction': the selection rule given after the "Suggested answer" heading (any 1, any 2, any 3, any one, any two, any three). If not present, use null.
- 'suggested_answer': the suggested answer, as an array of points."#;

const CONTEXT_FIELD: &str =
    "\n- 'case_study_context': the full case study context, given only once.";

const EXTRACTION_TEMPLATE: &str = r#"{intro}

{field_list}

{verbatim}

Example output format:
{
    "assessment_type": "{assessment_type}",
    "duration": <duration>,
    "assessment_instruction": [<instruction_point_1>, <instruction_point_2>, ...],
    "case_study_context": "{context_example}",
    "questions_and_answers": [
        {
            "question_number": <question_number>,
            "question": "<question_text>",
            "question_instruction": "<question_instruction>",
            "comparison_count": <comparison_count>,
            "comparison_instruction": <comparison_instruction>,
            "suggested_answer": [<answer_point_1>, <answer_point_2>, ...]
        }
    ]
}

Document content:
{content}"#;

/// Fills the extraction template for `kind`. `content` is embedded verbatim,
/// with no escaping or truncation.
pub fn build_extraction_prompt(kind: AssessmentKind, content: &str) -> String {
    let schema = FieldSchema::for_kind(kind);
    let field_list = if schema.requests_context {
        format!("{FIELD_LIST}{CONTEXT_FIELD}")
    } else {
        FIELD_LIST.to_string()
    };

    // Content goes in last so placeholder-looking text inside it is left alone.
    EXTRACTION_TEMPLATE
        .replace("{intro}", schema.intro)
        .replace("{field_list}", &field_list)
        .replace("{verbatim}", VERBATIM_INSTRUCTION)
        .replace("{assessment_type}", schema.kind.as_str())
        .replace("{context_example}", schema.context_example)
        .replace("{content}", content)
}
