//! Query depth limiting
//!
//! Depth is counted the way `graphql-depth-limit` counts it: a field with a
//! sub-selection adds one level, leaf fields add nothing, introspection
//! (`__`-prefixed) and ignored fields are skipped entirely, and fragment
//! spreads are expanded in place without re-entering a fragment that is
//! already being expanded.

use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextParseQuery};
use async_graphql::parser::types::{ExecutableDocument, FragmentDefinition, Selection, SelectionSet};
use async_graphql::{ErrorExtensions, Name, Positioned, ServerResult, Variables};
use colored::Colorize;
use gqlgate_config::IgnoreRule;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::codes;

/// Measured depth per operation name; the anonymous operation is keyed by `""`
pub type OperationDepths = BTreeMap<String, usize>;

type DepthCallback = Arc<dyn Fn(&OperationDepths) + Send + Sync>;

/// Field names excluded from depth measurement
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    Exact(String),
    Pattern(Regex),
}

impl FieldMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    pub fn matches(&self, field: &str) -> bool {
        match self {
            Self::Exact(name) => name == field,
            Self::Pattern(regex) => regex.is_match(field),
        }
    }
}

impl TryFrom<&IgnoreRule> for FieldMatcher {
    type Error = regex::Error;

    fn try_from(rule: &IgnoreRule) -> Result<Self, Self::Error> {
        match rule {
            IgnoreRule::Exact { name } => Ok(Self::exact(name.clone())),
            IgnoreRule::Pattern { pattern } => Self::pattern(pattern),
        }
    }
}

/// Measure every operation in a document
pub fn measure_depths(document: &ExecutableDocument, ignore: &[FieldMatcher]) -> OperationDepths {
    let measure = DepthMeasure {
        fragments: &document.fragments,
        ignore,
    };

    document
        .operations
        .iter()
        .map(|(name, operation)| {
            let mut expanding = Vec::new();
            let depth = measure.selection_set(&operation.node.selection_set.node, &mut expanding);
            (name.map(|n| n.to_string()).unwrap_or_default(), depth)
        })
        .collect()
}

struct DepthMeasure<'a> {
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    ignore: &'a [FieldMatcher],
}

impl<'a> DepthMeasure<'a> {
    fn selection_set(&self, set: &'a SelectionSet, expanding: &mut Vec<&'a Name>) -> usize {
        set.items
            .iter()
            .map(|selection| self.selection(&selection.node, expanding))
            .max()
            .unwrap_or(0)
    }

    fn selection(&self, selection: &'a Selection, expanding: &mut Vec<&'a Name>) -> usize {
        match selection {
            Selection::Field(field) => {
                let field = &field.node;
                let name = field.name.node.as_str();
                if name.starts_with("__")
                    || self.is_ignored(name)
                    || field.selection_set.node.items.is_empty()
                {
                    0
                } else {
                    1 + self.selection_set(&field.selection_set.node, expanding)
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                if expanding.contains(&name) {
                    return 0;
                }
                match self.fragments.get(name) {
                    Some(fragment) => {
                        expanding.push(name);
                        let depth =
                            self.selection_set(&fragment.node.selection_set.node, expanding);
                        expanding.pop();
                        depth
                    }
                    None => 0,
                }
            }
            Selection::InlineFragment(inline) => {
                self.selection_set(&inline.node.selection_set.node, expanding)
            }
        }
    }

    fn is_ignored(&self, field: &str) -> bool {
        self.ignore.iter().any(|matcher| matcher.matches(field))
    }
}

/// Rejects operations nested deeper than `max_depth`
#[derive(Clone)]
pub struct DepthLimit {
    max_depth: usize,
    ignore: Arc<Vec<FieldMatcher>>,
    on_depths: Option<DepthCallback>,
}

impl DepthLimit {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ignore: Arc::new(Vec::new()),
            on_depths: None,
        }
    }

    pub fn ignore(mut self, matchers: impl IntoIterator<Item = FieldMatcher>) -> Self {
        Arc::make_mut(&mut self.ignore).extend(matchers);
        self
    }

    /// Called with the measured depths of every parsed document, before any rejection
    pub fn on_depths<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OperationDepths) + Send + Sync + 'static,
    {
        self.on_depths = Some(Arc::new(callback));
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl ExtensionFactory for DepthLimit {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(self.clone())
    }
}

#[async_trait::async_trait]
impl Extension for DepthLimit {
    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        let document = next.run(ctx, query, variables).await?;
        let depths = measure_depths(&document, &self.ignore);
        debug!("Measured operation depths: {:?}", depths);

        if let Some(callback) = &self.on_depths {
            callback(&depths);
        }

        for (name, operation) in document.operations.iter() {
            let name = name.map(|n| n.as_str()).unwrap_or_default();
            if depths.get(name).copied().unwrap_or(0) > self.max_depth {
                return Err(async_graphql::Error::new(format!(
                    "'{}' exceeds maximum operation depth of {}",
                    name, self.max_depth
                ))
                .extend_with(|_, e| e.set("code", codes::GRAPHQL_VALIDATION_FAILED))
                .into_server_error(operation.pos));
            }
        }

        Ok(document)
    }
}

/// Logs a heads-up when an operation sits exactly one level below the limit
#[derive(Debug, Clone)]
pub struct DepthWarning {
    limit: usize,
    accent: Option<(u8, u8, u8)>,
}

impl DepthWarning {
    pub fn new(limit: usize, accent: &str) -> Self {
        Self {
            limit,
            accent: parse_hex_color(accent),
        }
    }

    pub fn should_warn(&self, depths: &OperationDepths) -> bool {
        match self.limit.checked_sub(1) {
            Some(threshold) => depths.values().any(|depth| *depth == threshold),
            None => false,
        }
    }

    /// Emit at most one warning for the document; returns whether it fired
    pub fn observe(&self, depths: &OperationDepths) -> bool {
        if !self.should_warn(depths) {
            return false;
        }
        warn!(target: "graphql", "⚠️  You can only descend {} levels.", self.styled_limit());
        true
    }

    fn styled_limit(&self) -> String {
        let limit = self.limit.to_string();
        match self.accent {
            Some((r, g, b)) => limit.truecolor(r, g, b).bold().to_string(),
            None => limit.bold().to_string(),
        }
    }
}

fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_query;

    fn depth_of(query: &str) -> usize {
        let document = parse_query(query).unwrap();
        measure_depths(&document, &default_ignore()).values().copied().max().unwrap_or(0)
    }

    fn default_ignore() -> Vec<FieldMatcher> {
        vec![FieldMatcher::pattern("_trusted$").unwrap(), FieldMatcher::exact("idontcare")]
    }

    #[test]
    fn test_leaf_fields_count_zero() {
        assert_eq!(depth_of("{ hello }"), 0);
        assert_eq!(depth_of("{ viewer { name } }"), 1);
        assert_eq!(depth_of("{ viewer { friend { friend { name } } } }"), 3);
    }

    #[test]
    fn test_deepest_branch_wins() {
        assert_eq!(depth_of("{ hello viewer { name friend { name } } }"), 2);
    }

    #[test]
    fn test_introspection_and_ignored_fields_are_skipped() {
        assert_eq!(depth_of("{ __schema { types { name } } }"), 0);
        assert_eq!(depth_of("{ viewer { idontcare { friend { name } } } }"), 1);
        assert_eq!(depth_of("{ viewer { profile_trusted { friend { name } } } }"), 1);
    }

    #[test]
    fn test_fragments_are_expanded() {
        let query = r#"
            query Deep { viewer { ...Friends } }
            fragment Friends on Viewer { friend { ... on Viewer { friend { name } } } }
        "#;
        let document = parse_query(query).unwrap();
        let depths = measure_depths(&document, &[]);
        assert_eq!(depths.get("Deep"), Some(&3));
    }

    #[test]
    fn test_cyclic_fragments_terminate() {
        let query = r#"
            { viewer { ...Loop } }
            fragment Loop on Viewer { friend { ...Loop } }
        "#;
        assert_eq!(depth_of(query), 2);
    }

    #[test]
    fn test_depths_keyed_by_operation() {
        let query = "query A { viewer { name } } query B { viewer { friend { name } } }";
        let depths = measure_depths(&parse_query(query).unwrap(), &[]);
        assert_eq!(depths.get("A"), Some(&1));
        assert_eq!(depths.get("B"), Some(&2));
    }

    #[test]
    fn test_matchers() {
        assert!(FieldMatcher::exact("idontcare").matches("idontcare"));
        assert!(!FieldMatcher::exact("idontcare").matches("idontcare2"));
        assert!(FieldMatcher::pattern("_trusted$").unwrap().matches("data_trusted"));
        assert!(!FieldMatcher::pattern("_trusted$").unwrap().matches("trusted_data"));
        assert!(FieldMatcher::pattern("(").is_err());
    }

    #[test]
    fn test_matcher_from_ignore_rule() {
        let rule = IgnoreRule::Pattern {
            pattern: "_trusted$".to_string(),
        };
        assert!(FieldMatcher::try_from(&rule).unwrap().matches("x_trusted"));

        let rule = IgnoreRule::Exact {
            name: "idontcare".to_string(),
        };
        assert!(FieldMatcher::try_from(&rule).unwrap().matches("idontcare"));
    }

    #[test]
    fn test_warning_boundaries() {
        let warning = DepthWarning::new(10, "#87CEEB");
        let depths = |d: usize| OperationDepths::from([(String::new(), d)]);

        assert!(!warning.should_warn(&depths(8)));
        assert!(warning.should_warn(&depths(9)));
        assert!(!warning.should_warn(&depths(10)));
        assert!(!warning.should_warn(&depths(11)));
    }

    #[test]
    fn test_warning_fires_once_for_many_operations() {
        let warning = DepthWarning::new(3, "#87CEEB");
        let depths = OperationDepths::from([("A".to_string(), 2), ("B".to_string(), 2)]);
        assert!(warning.observe(&depths));
    }

    #[test]
    fn test_warning_with_zero_limit_never_fires() {
        let warning = DepthWarning::new(0, "#87CEEB");
        assert!(!warning.observe(&OperationDepths::from([(String::new(), 0)])));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#87CEEB"), Some((0x87, 0xCE, 0xEB)));
        assert_eq!(parse_hex_color("87CEEB"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }
}
