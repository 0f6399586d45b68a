//! Domain weights per feature.
//!
//! Every feature name is canonicalised once and resolved to a
//! [`CanonicalFeature`]; the weight is an exhaustive `match` on that
//! identifier, so overlapping metric names cannot shadow each other.
//!
//! | Group | Features | Weight |
//! |-------|----------|--------|
//! | Popularity | stars, forks, commits, open_issues | 0.7 – 0.9 |
//! | Team | contributors, loc | 1.0 |
//! | Code quality | complexity, maintainability, duplication, comments, function length | 1.2 – 1.8 |
//! | Testing / debt | test_coverage, technical_debt, code_smells | 1.5 – 2.0 |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical identifier of a feature known to the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalFeature {
    /// GitHub stars.
    Stars,
    /// Forks.
    Forks,
    /// Contributors.
    Contributors,
    /// Commits.
    Commits,
    /// Open issues.
    OpenIssues,
    /// Lines of code.
    Loc,
    /// Cyclomatic complexity.
    CyclomaticComplexity,
    /// Maintainability index.
    MaintainabilityIndex,
    /// Duplicated code percentage.
    CodeDuplication,
    /// Comment lines ratio.
    CommentRatio,
    /// Average function length.
    AvgFunctionLength,
    /// Highest complexity of a single function.
    MaxFunctionComplexity,
    /// Test coverage estimate.
    TestCoverage,
    /// Technical debt markers.
    TechnicalDebt,
    /// Detected code smells.
    CodeSmells,
    /// Anything the table does not know.
    Other,
}

impl CanonicalFeature {
    /// Resolve a canonical feature name (see [`canonical_name`]).
    pub fn from_name(name: &str) -> Self {
        match name {
            "stars" => CanonicalFeature::Stars,
            "forks" => CanonicalFeature::Forks,
            "contributors" => CanonicalFeature::Contributors,
            "commits" => CanonicalFeature::Commits,
            "open_issues" => CanonicalFeature::OpenIssues,
            "loc" | "lines_of_code" => CanonicalFeature::Loc,
            "cyclomatic_complexity" => CanonicalFeature::CyclomaticComplexity,
            "maintainability_index" => CanonicalFeature::MaintainabilityIndex,
            "code_duplication" => CanonicalFeature::CodeDuplication,
            "comment_ratio" => CanonicalFeature::CommentRatio,
            "avg_function_length" | "average_function_length" => {
                CanonicalFeature::AvgFunctionLength
            }
            "max_function_complexity" | "maximum_function_complexity" => {
                CanonicalFeature::MaxFunctionComplexity
            }
            "test_coverage" => CanonicalFeature::TestCoverage,
            "technical_debt" => CanonicalFeature::TechnicalDebt,
            "code_smells" => CanonicalFeature::CodeSmells,
            _ => CanonicalFeature::Other,
        }
    }

    /// Built-in weight.
    pub fn default_weight(self) -> f64 {
        match self {
            CanonicalFeature::Stars => 0.8,
            CanonicalFeature::Forks => 0.8,
            CanonicalFeature::Contributors => 1.0,
            CanonicalFeature::Commits => 0.9,
            CanonicalFeature::OpenIssues => 0.7,
            CanonicalFeature::Loc => 1.0,
            CanonicalFeature::CyclomaticComplexity => 1.5,
            CanonicalFeature::MaintainabilityIndex => 1.8,
            CanonicalFeature::CodeDuplication => 1.6,
            CanonicalFeature::CommentRatio => 1.2,
            CanonicalFeature::AvgFunctionLength => 1.3,
            CanonicalFeature::MaxFunctionComplexity => 1.4,
            CanonicalFeature::TestCoverage => 2.0,
            CanonicalFeature::TechnicalDebt => 1.7,
            CanonicalFeature::CodeSmells => 1.5,
            CanonicalFeature::Other => 1.0,
        }
    }
}

/// Lowercase a feature or metric name and collapse every run of
/// non-alphanumeric characters into a single `_`.
///
/// `"Average Function Length"` becomes `"average_function_length"`.
pub fn canonical_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Feature weights: built-in defaults plus optional overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    #[serde(default)]
    overrides: BTreeMap<CanonicalFeature, f64>,
}

impl WeightTable {
    /// Table with built-in weights only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the weight of one feature.
    pub fn with_weight(mut self, feature: CanonicalFeature, weight: f64) -> Self {
        let _ = self.overrides.insert(feature, weight);
        self
    }

    /// Weight of a canonical feature.
    pub fn weight(&self, feature: CanonicalFeature) -> f64 {
        self.overrides
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_weight())
    }

    /// Canonicalise `name`, then look up its weight.
    pub fn resolve(&self, name: &str) -> (CanonicalFeature, f64) {
        let feature = CanonicalFeature::from_name(&canonical_name(name));
        (feature, self.weight(feature))
    }
}
