use crate::error::ParseError;
use crate::types::IntegrationPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedPlan {
    pub plan: IntegrationPlan,
    pub format: PlanFormat,
}

pub fn parse_plan_str(input: &str, format: PlanFormat) -> Result<ParsedPlan, ParseError> {
    match format {
        PlanFormat::Json => Ok(ParsedPlan {
            plan: serde_json::from_str::<IntegrationPlan>(input)?,
            format,
        }),
        PlanFormat::Yaml => Ok(ParsedPlan {
            plan: serde_yaml::from_str::<IntegrationPlan>(input)?,
            format,
        }),
        PlanFormat::Auto => parse_plan_auto(input),
    }
}

fn parse_plan_auto(input: &str) -> Result<ParsedPlan, ParseError> {
    // Heuristic: JSON starts with `{` or `[` after trimming.
    let looks_like_json = {
        let trimmed = input.trim_start();
        trimmed.starts_with('{') || trimmed.starts_with('[')
    };

    if looks_like_json {
        match serde_json::from_str::<IntegrationPlan>(input) {
            Ok(plan) => Ok(ParsedPlan {
                plan,
                format: PlanFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<IntegrationPlan>(input) {
                Ok(plan) => Ok(ParsedPlan {
                    plan,
                    format: PlanFormat::Yaml,
                }),
                // Report the JSON error; that is what the input looked like.
                Err(_) => Err(ParseError::Json(e)),
            },
        }
    } else {
        match serde_yaml::from_str::<IntegrationPlan>(input) {
            Ok(plan) => Ok(ParsedPlan {
                plan,
                format: PlanFormat::Yaml,
            }),
            Err(e) => match serde_json::from_str::<IntegrationPlan>(input) {
                Ok(plan) => Ok(ParsedPlan {
                    plan,
                    format: PlanFormat::Json,
                }),
                Err(_) => Err(ParseError::Yaml(e)),
            },
        }
    }
}
