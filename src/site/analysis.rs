//! Structured website analysis from an expert persona

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::io::{self, Write};

use crate::ai::prompts::SITE_ANALYSIS_TEMPLATE;
use crate::ai::{ModelGateway, PromptTemplate};
use crate::error::TriageError;
use crate::triage::parser::{StructuredOutput, parse};

/// Persona the analyzer adopts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpertRole {
    BusinessAnalyst,
    MarketingExpert,
    UxDesigner,
}

impl ExpertRole {
    pub const ALL: [ExpertRole; 3] = [
        ExpertRole::BusinessAnalyst,
        ExpertRole::MarketingExpert,
        ExpertRole::UxDesigner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertRole::BusinessAnalyst => "Business Analyst",
            ExpertRole::MarketingExpert => "Marketing Expert",
            ExpertRole::UxDesigner => "UX Designer",
        }
    }

    /// Menu choice "1".."3"
    pub fn from_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(ExpertRole::BusinessAnalyst),
            "2" => Some(ExpertRole::MarketingExpert),
            "3" => Some(ExpertRole::UxDesigner),
            _ => None,
        }
    }
}

impl fmt::Display for ExpertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteAnalysis {
    pub bot_introduction: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub strategic_recommendations: Vec<String>,
    pub homepage_redesign_prompt: String,
}

impl StructuredOutput for WebsiteAnalysis {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "bot_introduction": {
                    "type": "string",
                    "description": "A brief, friendly introduction from the assistant, introducing itself by name."
                },
                "strengths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "3 key strengths of the current website content."
                },
                "improvements": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "3 primary areas for improvement."
                },
                "strategic_recommendations": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "4 high-level, budget-friendly business strategies."
                },
                "homepage_redesign_prompt": {
                    "type": "string",
                    "description": "A detailed, actionable brief for a web designer, with clear headings and bullet points."
                }
            },
            "required": [
                "bot_introduction",
                "strengths",
                "improvements",
                "strategic_recommendations",
                "homepage_redesign_prompt"
            ]
        })
    }

    fn validate(&self) -> Result<(), String> {
        for (name, list) in [
            ("strengths", &self.strengths),
            ("improvements", &self.improvements),
            ("strategic_recommendations", &self.strategic_recommendations),
        ] {
            if list.iter().all(|entry| entry.trim().is_empty()) {
                return Err(format!("`{}` must contain at least one entry", name));
            }
        }
        if self.homepage_redesign_prompt.trim().is_empty() {
            return Err("`homepage_redesign_prompt` must not be empty".to_string());
        }
        Ok(())
    }
}

impl WebsiteAnalysis {
    /// Plain-text digest used to seed the follow-up conversation
    pub fn summary(&self) -> String {
        format!(
            "Strengths: {}. Improvements: {}. Strategic recommendations: {}. Homepage redesign brief: {}",
            self.strengths.join("; "),
            self.improvements.join("; "),
            self.strategic_recommendations.join("; "),
            self.homepage_redesign_prompt
        )
    }
}

/// One model call producing a validated [`WebsiteAnalysis`]
pub async fn analyze<G: ModelGateway + ?Sized>(
    gateway: &G,
    role: ExpertRole,
    content: &str,
) -> Result<WebsiteAnalysis, TriageError> {
    let template = PromptTemplate::new(SITE_ANALYSIS_TEMPLATE)
        .partial("format_instructions", WebsiteAnalysis::format_instructions());

    let raw = gateway
        .generate_with(&template, &[("role", role.as_str()), ("content", content)])
        .await?;
    parse(&raw)
}

pub fn report<W: Write>(
    out: &mut W,
    analysis: &WebsiteAnalysis,
    url: &str,
    role: ExpertRole,
) -> io::Result<()> {
    let rule = "=".repeat(50);
    writeln!(out, "\n{}", rule)?;
    writeln!(out, "{}", analysis.bot_introduction)?;
    writeln!(
        out,
        "Here is my analysis of {} from the perspective of a {}:",
        url, role
    )?;

    section(out, "KEY STRENGTHS", &analysis.strengths)?;
    section(out, "AREAS FOR IMPROVEMENT", &analysis.improvements)?;
    section(
        out,
        "STRATEGIC RECOMMENDATIONS",
        &analysis.strategic_recommendations,
    )?;

    writeln!(out, "\nHOMEPAGE REDESIGN BRIEF")?;
    writeln!(out, "{}", "-".repeat(23))?;
    writeln!(out, "{}", analysis.homepage_redesign_prompt)?;
    writeln!(out, "\n{}", rule)
}

fn section<W: Write>(out: &mut W, title: &str, entries: &[String]) -> io::Result<()> {
    writeln!(out, "\n{}", title)?;
    writeln!(out, "{}", "-".repeat(title.len()))?;
    for entry in entries {
        writeln!(out, "* {}", entry)?;
    }
    Ok(())
}
