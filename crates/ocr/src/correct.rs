use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// How a rule's pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Regex anchored at the end of each line (multi-line, CRLF-aware).
    /// Spaces or tabs between the match and the line end are dropped.
    LineEnd,
    /// Literal substring, replaced wherever it occurs.
    Anywhere,
}

/// One rewrite rule. Rules are data; the engine applies them in order.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionRule {
    pub name: &'static str,
    pub scope: RuleScope,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

const fn line_end(
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
) -> CorrectionRule {
    CorrectionRule { name, scope: RuleScope::LineEnd, pattern, replacement }
}

const fn literal(
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
) -> CorrectionRule {
    CorrectionRule { name, scope: RuleScope::Anywhere, pattern, replacement }
}

/// Built-in rule table, most specific currency rule first.
///
/// The hryvnia sign is routinely read as a trailing `2`, `z` or Cyrillic `е`
/// right after an amount. Decimal amounts are tried before integers and the
/// spaced form before the joined one, so a line is rewritten by at most one
/// currency rule.
pub const CORRECTION_RULES: &[CorrectionRule] = &[
    line_end("currency-decimal-spaced", r"(\d+[.,]\d{2}) [2zе]", "${1} ₴"),
    line_end("currency-decimal-joined", r"(\d+[.,]\d{2})[2zе]", "${1}₴"),
    line_end("currency-integer-spaced", r"(\d+) [2zе]", "${1} ₴"),
    line_end("currency-integer-joined", r"(\d+)[2zе]", "${1}₴"),
    // Latin letters inside Cyrillic words.
    literal("balance-latin-a", "Зaлишок", "Залишок"),
    literal("balance-digit-3", "3алишок", "Залишок"),
    literal("sum-latin-c", "Cума", "Сума"),
    literal("sum-latin-cy", "Cyма", "Сума"),
    literal("sum-latin-y", "Сyма", "Сума"),
    literal("total-latin-a", "Бaланс", "Баланс"),
    literal("card-latin-k", "Kартка", "Картка"),
    literal("card-latin-a", "Кaртка", "Картка"),
    literal("transfer-latin-p", "Пepeказ", "Переказ"),
    literal("hryvnia-latin-r", "rрн", "грн"),
    literal("hryvnia-latin-rp", "rpн", "грн"),
];

/// Built-in rules with their line-end patterns compiled once.
pub fn builtin() -> &'static CorrectionEngine {
    static ENGINE: OnceLock<CorrectionEngine> = OnceLock::new();
    ENGINE.get_or_init(|| {
        CorrectionEngine::new(CORRECTION_RULES).expect("invalid built-in correction rule")
    })
}

enum Matcher {
    Regex(Regex),
    Literal,
}

struct CompiledRule {
    rule: CorrectionRule,
    matcher: Matcher,
}

impl CompiledRule {
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.matcher {
            Matcher::Regex(re) => re.replace_all(text, self.rule.replacement),
            Matcher::Literal if text.contains(self.rule.pattern) => {
                Cow::Owned(text.replace(self.rule.pattern, self.rule.replacement))
            }
            Matcher::Literal => Cow::Borrowed(text),
        }
    }
}

/// Applies an ordered rule list. Each rule rewrites the whole current text
/// before the next rule sees it.
pub struct CorrectionEngine {
    rules: Vec<CompiledRule>,
}

impl CorrectionEngine {
    pub fn new(rules: &[CorrectionRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| -> Result<CompiledRule, regex::Error> {
                let matcher = match rule.scope {
                    RuleScope::LineEnd => {
                        Matcher::Regex(Regex::new(&format!("(?mR){}[ \\t]*$", rule.pattern))?)
                    }
                    RuleScope::Anywhere => Matcher::Literal,
                };
                Ok(CompiledRule { rule: *rule, matcher })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = &CorrectionRule> {
        self.rules.iter().map(|cr| &cr.rule)
    }

    pub fn apply(&self, text: &str) -> String {
        self.apply_with_report(text).0
    }

    /// Apply every rule in order, returning the corrected text and the names
    /// of the rules that changed it.
    pub fn apply_with_report(&self, text: &str) -> (String, Vec<&'static str>) {
        let mut current = text.to_string();
        let mut fired = Vec::new();
        for cr in &self.rules {
            let next = match cr.apply(&current) {
                Cow::Owned(next) if next != current => next,
                _ => continue,
            };
            fired.push(cr.rule.name);
            current = next;
        }
        if !fired.is_empty() {
            debug!(rules = ?fired, "corrections applied");
        }
        (current, fired)
    }
}
