//! Rules — ordered regex substitutions that erase variable substrings.

use std::borrow::Cow;
use regex::Regex;

use crate::conf::SubstitutionRule;
use crate::error::SiftError;

struct CompiledRule {
    regex: Regex,
    replacement: String,
}

/// Substitution rules compiled once, applied in configured order.
#[derive(Default)]
pub struct SubstitutionRules {
    rules: Vec<CompiledRule>,
}

impl SubstitutionRules {
    pub fn compile(rules: &[SubstitutionRule]) -> Result<Self, SiftError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|source| SiftError::InvalidRegex {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    regex,
                    replacement: rule.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>, SiftError>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order. Borrows the input when nothing matched.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(line);
        for rule in &self.rules {
            let replaced = match rule.regex.replace_all(&current, rule.replacement.as_str()) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                current = Cow::Owned(s);
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, replacement: &str) -> SubstitutionRule {
        SubstitutionRule {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_no_rules_borrows() {
        let rules = SubstitutionRules::default();
        assert!(matches!(rules.apply("unchanged"), Cow::Borrowed("unchanged")));
    }

    #[test]
    fn test_erases_distinguished_names() {
        let rules = SubstitutionRules::compile(&[rule(r"CN=[^,]+", "CN=*")]).unwrap();
        assert_eq!(
            rules.apply("login failed for CN=alice,OU=ops"),
            "login failed for CN=*,OU=ops"
        );
        assert_eq!(
            rules.apply("login failed for CN=bob,OU=ops"),
            "login failed for CN=*,OU=ops"
        );
    }

    #[test]
    fn test_rules_apply_in_order() {
        // Second rule only sees the output of the first
        let rules = SubstitutionRules::compile(&[
            rule(r"user=\w+", "user=<u>"),
            rule(r"<u>", "ANON"),
        ])
        .unwrap();
        assert_eq!(rules.apply("denied user=carol"), "denied user=ANON");

        let reversed = SubstitutionRules::compile(&[
            rule(r"<u>", "ANON"),
            rule(r"user=\w+", "user=<u>"),
        ])
        .unwrap();
        assert_eq!(reversed.apply("denied user=carol"), "denied user=<u>");
    }

    #[test]
    fn test_capture_group_replacement() {
        let rules = SubstitutionRules::compile(&[rule(r"(\w+)@\w+\.com", "$1@<domain>")]).unwrap();
        assert_eq!(rules.apply("mail to dave@corp.com"), "mail to dave@<domain>");
    }

    #[test]
    fn test_invalid_rule_is_config_error() {
        let result = SubstitutionRules::compile(&[rule("(unclosed", "")]);
        let err = result.err().expect("expected an error");
        assert!(err.is_configuration());
    }
}
