//! Rule compilation and name derivation.

use regex_lite::Regex;

use super::error::ResolverError;

/// A single compiled name rule: a pattern plus an output template.
///
/// Templates use positional placeholders `{:1}`, `{:2}`, ... which are
/// substituted with the pattern's capture groups (1-based; group 0, the
/// whole match, is never substituted).
#[derive(Debug, Clone)]
pub struct NameRule {
    pattern: Regex,
    template: String,
}

impl NameRule {
    /// Compiles a rule from its raw pattern and template.
    pub fn new(pattern: &str, template: &str) -> Result<Self, ResolverError> {
        let pattern = Regex::new(pattern).map_err(|e| ResolverError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            template: template.to_string(),
        })
    }

    /// The highest placeholder index referenced by the template.
    fn max_placeholder(&self) -> usize {
        placeholder_indices(&self.template)
            .into_iter()
            .max()
            .unwrap_or(0)
    }
}

/// Extracts the `{:N}` placeholder indices referenced by a template.
fn placeholder_indices(template: &str) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{:") {
        let tail = &rest[start + 2..];
        if let Some(end) = tail.find('}') {
            if let Ok(n) = tail[..end].parse::<usize>() {
                indices.push(n);
            }
            rest = &tail[end + 1..];
        } else {
            break;
        }
    }
    indices
}

/// The stem an inbound key is matched on: the final path segment with its
/// extension removed.
fn stem(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// An ordered set of name rules sharing one conversion suffix.
///
/// Rules are immutable after startup and shared by all workers without
/// locking. Evaluation order is configuration order; the first match wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<NameRule>,
    suffix: String,
}

impl RuleSet {
    /// Compiles a rule set from (pattern, template) pairs.
    ///
    /// The set must be non-empty and every pattern must compile; both are
    /// startup-fatal conditions for the service.
    pub fn compile<S: AsRef<str>>(
        pairs: &[(S, S)],
        suffix: impl Into<String>,
    ) -> Result<Self, ResolverError> {
        let mut rules = Vec::with_capacity(pairs.len());
        for (pattern, template) in pairs {
            rules.push(NameRule::new(pattern.as_ref(), template.as_ref())?);
        }

        Ok(Self {
            rules,
            suffix: suffix.into(),
        })
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks every rule's template against its pattern's capture count.
    ///
    /// A template referencing a group the pattern cannot produce would leave
    /// the literal placeholder text in derived names at run time; this is a
    /// configuration bug and is rejected before the service starts.
    pub fn self_check(&self) -> Result<(), ResolverError> {
        for rule in &self.rules {
            // captures_len counts group 0, so N captures allow {:1}..{:N-1}.
            let available = rule.pattern.captures_len().saturating_sub(1);
            let referenced = rule.max_placeholder();
            if referenced > available {
                return Err(ResolverError::BadPlaceholder {
                    template: rule.template.clone(),
                    pattern: rule.pattern.as_str().to_string(),
                    group: referenced,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Validates an inbound key against the rule set.
    ///
    /// The key's stem must match at least one pattern; the first match
    /// short-circuits. A key that fails here is malformed input and will not
    /// self-heal on redelivery.
    pub fn validate(&self, key: &str) -> Result<(), ResolverError> {
        let stem = stem(key);
        if self.rules.iter().any(|r| r.pattern.is_match(stem)) {
            Ok(())
        } else {
            Err(ResolverError::InvalidName {
                key: key.to_string(),
            })
        }
    }

    /// Derives the output key for an inbound key.
    ///
    /// Re-runs the ordered match, substitutes the first matching rule's
    /// capture groups into its template, and appends the conversion suffix.
    pub fn derive_output_name(&self, key: &str) -> Result<String, ResolverError> {
        let stem = stem(key);
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(stem) {
                let mut output = rule.template.clone();
                // Group 0 is the whole match and is never substituted.
                for ix in 1..caps.len() {
                    if let Some(group) = caps.get(ix) {
                        output = output.replace(&format!("{{:{}}}", ix), group.as_str());
                    }
                }
                return Ok(format!("{}.{}", output, self.suffix));
            }
        }

        Err(ResolverError::NoRuleMatched {
            key: key.to_string(),
        })
    }
}
