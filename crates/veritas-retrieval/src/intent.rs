//! Query intent classification and retrieval strategy planning

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use veritas_domain::text::{tokenize, word_count};
use veritas_domain::SourceType;

/// What the user is trying to learn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    /// Looking up a fact
    Factual,
    /// Wants steps to accomplish something
    HowTo,
    /// Weighing alternatives
    Comparison,
    /// Wants a term explained
    Definition,
    /// Asking for a judgment
    Opinion,
    /// Fixing a problem
    Troubleshooting,
}

impl QueryIntent {
    /// Get the intent name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Factual => "factual",
            QueryIntent::HowTo => "howto",
            QueryIntent::Comparison => "comparison",
            QueryIntent::Definition => "definition",
            QueryIntent::Opinion => "opinion",
            QueryIntent::Troubleshooting => "troubleshooting",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How demanding the query is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Short, no technical vocabulary
    Basic,
    /// Everything in between
    Intermediate,
    /// Long or vocabulary-heavy
    Advanced,
}

/// Retrieval requirements derived from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalStrategy {
    /// Distinct sources the answer should draw on
    pub min_sources: usize,
    /// Lowest acceptable source credibility (0-100)
    pub min_credibility_score: u32,
    /// Whether more than one source must be present
    pub diversity_required: bool,
    /// Oldest acceptable source, in days; unlimited when unset
    pub max_age_days: Option<u32>,
    /// Whether opposing viewpoints must be represented
    pub requires_multiple_perspectives: bool,
    /// Source types ranked first when present
    pub preferred_source_types: Vec<SourceType>,
}

impl RetrievalStrategy {
    /// Base strategy for an intent before complexity and marker adjustments
    pub fn for_intent(intent: QueryIntent) -> Self {
        let (min_sources, min_credibility_score, diversity_required, max_age_days) = match intent {
            QueryIntent::Factual => (2, 70, false, Some(730)),
            QueryIntent::HowTo => (2, 60, false, Some(365)),
            QueryIntent::Comparison => (3, 65, true, Some(730)),
            QueryIntent::Definition => (2, 70, false, None),
            QueryIntent::Opinion => (4, 60, true, Some(365)),
            QueryIntent::Troubleshooting => (2, 60, false, Some(180)),
        };
        Self {
            min_sources,
            min_credibility_score,
            diversity_required,
            max_age_days,
            requires_multiple_perspectives: false,
            preferred_source_types: Vec::new(),
        }
    }
}

/// Result of analyzing a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    /// The query as given
    pub query: String,
    /// Classified intent
    pub intent: QueryIntent,
    /// Estimated complexity
    pub complexity: Complexity,
    /// Whether the query asks for scholarly evidence
    pub needs_academic_sources: bool,
    /// Whether the query touches a contested subject
    pub controversial: bool,
    /// Derived retrieval requirements
    pub strategy: RetrievalStrategy,
}

/// One pattern rule in an [`IntentRules`] table
#[derive(Debug, Clone)]
pub struct IntentRule {
    /// Intent assigned on match
    pub intent: QueryIntent,
    /// Query pattern
    pub pattern: Regex,
}

/// Ordered intent rules; the first match wins, no match means factual
#[derive(Debug, Clone)]
pub struct IntentRules {
    rules: Vec<IntentRule>,
}

impl IntentRules {
    /// Build a table from rules in priority order
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Build a table from `(intent, pattern)` pairs
    pub fn from_patterns(patterns: &[(QueryIntent, &str)]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|(intent, pattern)| {
                Ok(IntentRule {
                    intent: *intent,
                    pattern: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self::new(rules))
    }

    /// Classify a query
    pub fn classify(&self, query: &str) -> QueryIntent {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(query))
            .map_or(QueryIntent::Factual, |rule| rule.intent)
    }
}

static DEFAULT_INTENT_RULES: Lazy<IntentRules> = Lazy::new(|| {
    IntentRules::from_patterns(&[
        (
            QueryIntent::Troubleshooting,
            r"(?i)\b(error|errors|fix|fixing|debug\w*|troubleshoot\w*|not working|doesn't work|fails?|failing|crash\w*|broken|panics?)\b",
        ),
        (
            QueryIntent::Comparison,
            r"(?i)\b(vs\.?|versus|compar\w*|difference between|differences between|better than|pros and cons|alternatives? to)\b",
        ),
        (
            QueryIntent::HowTo,
            r"(?i)(^how (do|can|should|would) (i|you|we)\b|\bhow to\b|\bsteps? to\b|\bguide\b|\btutorial\b|\bset ?up\b|\binstall\w*\b|\bconfigure\b)",
        ),
        (
            QueryIntent::Definition,
            r"(?i)(^(what|who) (is|are)\b|\bdefin\w*|\bmeaning of\b|\bexplain\b|\bwhat does .+ mean\b)",
        ),
        (
            QueryIntent::Opinion,
            r"(?i)\b(should (i|we)|best|worth it|recommend\w*|opinions?|is it good|overrated)\b",
        ),
    ])
    .expect("valid intent rules")
});

impl Default for IntentRules {
    fn default() -> Self {
        DEFAULT_INTENT_RULES.clone()
    }
}

static ACADEMIC_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(peer[- ]reviewed|meta[- ]analys[ie]s|systematic review|clinical trials?|randomi[sz]ed|academic|scholarly|journals?|literature review|empirical)\b",
    )
    .expect("valid regex")
});

static CONTROVERSY_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(controversial|controversy|debated?|debates|disputed|contested|polari[sz]\w*|critics|criticism|myths?|arguments? (for|against))\b",
    )
    .expect("valid regex")
});

/// Vocabulary that marks a query as technical, sorted
const TECHNICAL_TERMS: &[&str] = &[
    "algorithm", "api", "architecture", "async", "asynchronous", "bandwidth", "cache",
    "compiler", "concurrency", "container", "cryptography", "database", "deployment",
    "distributed", "encryption", "framework", "inference", "infrastructure", "kernel",
    "kubernetes", "latency", "microservices", "neural", "optimization", "protocol",
    "regression", "runtime", "scalability", "schema", "statistical", "throughput",
];

/// Credibility floor when scholarly sources are requested
pub const ACADEMIC_CREDIBILITY_FLOOR: u32 = 75;

/// Classifies queries and derives retrieval strategies
#[derive(Debug, Clone, Default)]
pub struct QueryIntentPlanner {
    rules: IntentRules,
}

impl QueryIntentPlanner {
    /// Create a planner with the default intent rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the intent rule table
    pub fn with_rules(mut self, rules: IntentRules) -> Self {
        self.rules = rules;
        self
    }

    /// Classify the query intent
    pub fn classify(&self, query: &str) -> QueryIntent {
        self.rules.classify(query.trim())
    }

    /// Estimate query complexity from length and technical vocabulary
    ///
    /// Advanced: three or more technical terms, or more than 25 words.
    /// Basic: at most six words and no technical terms.
    pub fn complexity(&self, query: &str) -> Complexity {
        let words = word_count(query);
        let technical = tokenize(query)
            .iter()
            .filter(|t| TECHNICAL_TERMS.binary_search(&t.as_str()).is_ok())
            .count();
        if technical >= 3 || words > 25 {
            Complexity::Advanced
        } else if words <= 6 && technical == 0 {
            Complexity::Basic
        } else {
            Complexity::Intermediate
        }
    }

    /// Analyze a query into intent, complexity and strategy
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_retrieval::{QueryIntent, QueryIntentPlanner};
    ///
    /// let analysis = QueryIntentPlanner::new().analyze("Rust vs Go for web services");
    /// assert_eq!(analysis.intent, QueryIntent::Comparison);
    /// assert!(analysis.strategy.requires_multiple_perspectives);
    /// ```
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let intent = self.classify(query);
        let complexity = self.complexity(query);
        let needs_academic_sources = ACADEMIC_MARKERS.is_match(query);
        let controversial = CONTROVERSY_MARKERS.is_match(query);

        let mut strategy = RetrievalStrategy::for_intent(intent);
        if complexity == Complexity::Advanced {
            strategy.min_sources += 2;
            strategy.min_credibility_score += 5;
        }
        if needs_academic_sources {
            strategy.min_credibility_score = strategy.min_credibility_score.max(ACADEMIC_CREDIBILITY_FLOOR);
            strategy.preferred_source_types.push(SourceType::Academic);
        }
        if controversial || matches!(intent, QueryIntent::Opinion | QueryIntent::Comparison) {
            strategy.requires_multiple_perspectives = true;
            strategy.diversity_required = true;
        }

        QueryAnalysis {
            query: query.to_string(),
            intent,
            complexity,
            needs_academic_sources,
            controversial,
            strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_terms_sorted() {
        assert!(TECHNICAL_TERMS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_intent_classification() {
        let planner = QueryIntentPlanner::new();
        assert_eq!(planner.classify("How to configure the Tokio runtime"), QueryIntent::HowTo);
        assert_eq!(planner.classify("What is a mutex?"), QueryIntent::Definition);
        assert_eq!(planner.classify("PostgreSQL versus MySQL"), QueryIntent::Comparison);
        assert_eq!(planner.classify("cargo build fails with linker error"), QueryIntent::Troubleshooting);
        assert_eq!(planner.classify("Should I learn Haskell"), QueryIntent::Opinion);
        assert_eq!(planner.classify("When was Rust 1.0 released"), QueryIntent::Factual);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Matches both troubleshooting and howto; troubleshooting is earlier
        let planner = QueryIntentPlanner::new();
        assert_eq!(planner.classify("How to fix a borrow checker error"), QueryIntent::Troubleshooting);
    }

    #[test]
    fn test_complexity() {
        let planner = QueryIntentPlanner::new();
        assert_eq!(planner.complexity("What is Rust"), Complexity::Basic);
        assert_eq!(planner.complexity("How does the async runtime schedule tasks"), Complexity::Intermediate);
        assert_eq!(
            planner.complexity("distributed database latency and throughput"),
            Complexity::Advanced
        );
    }

    #[test]
    fn test_strategy_table() {
        let planner = QueryIntentPlanner::new();
        let factual = planner.analyze("When was Rust released").strategy;
        assert_eq!(factual.min_sources, 2);
        assert_eq!(factual.min_credibility_score, 70);
        assert_eq!(factual.max_age_days, Some(730));
        assert!(!factual.diversity_required);

        let troubleshooting = planner.analyze("linker error on macOS").strategy;
        assert_eq!(troubleshooting.max_age_days, Some(180));

        let definition = planner.analyze("What is ownership").strategy;
        assert_eq!(definition.max_age_days, None);
    }

    #[test]
    fn test_advanced_adjustment() {
        let analysis = QueryIntentPlanner::new()
            .analyze("When did distributed database latency and throughput research start");
        assert_eq!(analysis.complexity, Complexity::Advanced);
        assert_eq!(analysis.strategy.min_sources, 4);
        assert_eq!(analysis.strategy.min_credibility_score, 75);
    }

    #[test]
    fn test_academic_markers_raise_floor() {
        let analysis = QueryIntentPlanner::new().analyze("How to read a meta-analysis");
        assert!(analysis.needs_academic_sources);
        assert_eq!(analysis.strategy.min_credibility_score, 75);
        assert_eq!(analysis.strategy.preferred_source_types, vec![SourceType::Academic]);
    }

    #[test]
    fn test_controversy_forces_perspectives() {
        let analysis = QueryIntentPlanner::new().analyze("Is nuclear power controversial");
        assert!(analysis.controversial);
        assert!(analysis.strategy.requires_multiple_perspectives);
        assert!(analysis.strategy.diversity_required);

        let opinion = QueryIntentPlanner::new().analyze("Best editor for Rust");
        assert_eq!(opinion.intent, QueryIntent::Opinion);
        assert_eq!(opinion.strategy.min_sources, 4);
        assert!(opinion.strategy.requires_multiple_perspectives);
    }

    #[test]
    fn test_custom_rules() {
        let rules = IntentRules::from_patterns(&[(QueryIntent::Opinion, r"(?i)\brust\b")]).unwrap();
        let planner = QueryIntentPlanner::new().with_rules(rules);
        assert_eq!(planner.classify("rust"), QueryIntent::Opinion);
        assert_eq!(planner.classify("go"), QueryIntent::Factual);
    }
}
