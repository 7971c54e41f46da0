//! Rule evaluation for Consort.
//!
//! This crate provides:
//! - [`operator`] - the pairwise and cluster operator catalog
//! - [`Condition`] - boolean condition trees and their document grammar
//! - [`RuleSet`] / [`ClusterRuleSet`] - named rules, compiled from documents
//! - [`PairwiseEngine`] - pair and matrix evaluation
//! - [`ClusterEngine`] - clique search, maximality, and relationships
//!
//! Evaluation is synchronous and pure: engines borrow their inputs and
//! return owned, serializable results.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cluster;
pub mod condition;
pub mod config;
pub mod operator;
pub mod pairwise;
pub mod rule;

pub use cluster::{
    BitSet, Cluster, ClusterAnalysis, ClusterEngine, ClusterRelationship, CompatibilityGraph,
    RelationshipType,
};
pub use condition::{ClusterCondition, Condition, PairwiseCondition};
pub use config::{
    CancelFlag, Cancellation, Clock, DEFAULT_MIN_CLUSTER_SIZE, Deadline, FixedClock, NeverCancel,
    SearchConfig, SystemClock,
};
pub use operator::{
    ClusterBinding, ClusterOperator, Comparison, Family, Operator, OperatorRegistry, Outcome,
    PairBinding, PairwiseOperator, Params,
};
pub use pairwise::{ComparisonResult, EvaluationMatrix, PairFailure, PairwiseEngine, PartialMatrix};
pub use rule::{
    ClusterRule, ClusterRuleSet, ClusterRuleSetDecl, PairwiseRule, Rule, RuleCompiler, RuleDecl,
    RuleEvaluation, RuleSet, RuleSetDecl,
};
