//! Validation rule descriptions

use crate::config::ExportConfig;

/// Turns a field's validation rules into a description
pub trait RuleFormatter {
    fn format(&self, field: &str, rules: &[String]) -> String;
}

/// Rules listed as written, e.g. `required, email`
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRuleFormatter;

impl RuleFormatter for RawRuleFormatter {
    fn format(&self, _field: &str, rules: &[String]) -> String {
        rules.join(", ")
    }
}

/// One sentence per rule
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanRuleFormatter;

impl HumanRuleFormatter {
    fn describe(attribute: &str, rule: &str) -> String {
        let (name, args) = match rule.split_once(':') {
            Some((name, args)) => (name, args),
            None => (rule, ""),
        };

        match name {
            "required" => format!("The {} field is required.", attribute),
            "nullable" => "(Nullable)".to_string(),
            "sometimes" => "(Optional)".to_string(),
            "string" => format!("The {} field must be a string.", attribute),
            "integer" => format!("The {} field must be an integer.", attribute),
            "numeric" => format!("The {} field must be a number.", attribute),
            "boolean" => format!("The {} field must be true or false.", attribute),
            "array" => format!("The {} field must be an array.", attribute),
            "email" => format!("The {} field must be a valid email address.", attribute),
            "url" => format!("The {} field must be a valid URL.", attribute),
            "uuid" => format!("The {} field must be a valid UUID.", attribute),
            "date" => format!("The {} field must be a valid date.", attribute),
            "min" => format!("The {} field must be at least {}.", attribute, args),
            "max" => format!("The {} field must not be greater than {}.", attribute, args),
            "size" => format!("The {} field must be {}.", attribute, args),
            "between" => match args.split_once(',') {
                Some((low, high)) => {
                    format!("The {} field must be between {} and {}.", attribute, low, high)
                }
                None => rule.to_string(),
            },
            "in" => format!(
                "The {} field must be one of: {}.",
                attribute,
                args.split(',').collect::<Vec<_>>().join(", ")
            ),
            "confirmed" => format!("The {} field confirmation does not match.", attribute),
            "unique" => format!("The {} has already been taken.", attribute),
            "exists" => format!("The selected {} is invalid.", attribute),
            _ => rule.to_string(),
        }
    }
}

impl RuleFormatter for HumanRuleFormatter {
    fn format(&self, field: &str, rules: &[String]) -> String {
        let attribute = field.replace('_', " ");
        rules
            .iter()
            .map(|rule| Self::describe(&attribute, rule))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Always empty; used when rule descriptions are switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentRuleFormatter;

impl RuleFormatter for SilentRuleFormatter {
    fn format(&self, _field: &str, _rules: &[String]) -> String {
        String::new()
    }
}

/// Formatter selected by `print_rules` and `rules_to_human_readable`
pub fn formatter_for(config: &ExportConfig) -> Box<dyn RuleFormatter> {
    match (config.print_rules, config.rules_to_human_readable) {
        (false, _) => Box::new(SilentRuleFormatter),
        (true, true) => Box::new(HumanRuleFormatter),
        (true, false) => Box::new(RawRuleFormatter),
    }
}
