//! Core data structures for the analysis report

use serde::{Deserialize, Serialize};

/// Class-name suffixes that mark a class as technical plumbing rather than
/// domain state. Such classes never qualify as domain entities.
pub const TECHNICAL_SUFFIXES: [&str; 5] =
    ["Controller", "Service", "Repository", "Adapter", "Gateway"];

/// Semantic node kinds tracked by the enricher (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticKind {
    Class,
    Method,
    Property,
    Import,
    Binary,
    If,
    Throw,
    Return,
    New,
    Call,
}

/// What kind of relationship a domain relation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Calls,
    DependsOn,
    Modifies,
    Uses,
}

/// The five business-rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Invariant,
    Policy,
    Calculation,
    StateTransition,
    ContextRestriction,
}

impl RuleType {
    /// Wire name, also used as the leading segment of rule identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Invariant => "INVARIANT",
            RuleType::Policy => "POLICY",
            RuleType::Calculation => "CALCULATION",
            RuleType::StateTransition => "STATE_TRANSITION",
            RuleType::ContextRestriction => "CONTEXT_RESTRICTION",
        }
    }
}

/// Architectural violation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    DomainCallingInfra,
    RuleInController,
    AnemicEntity,
    FatService,
    ScatteredRule,
    LayerViolation,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::DomainCallingInfra => "DOMAIN_CALLING_INFRA",
            ViolationType::RuleInController => "RULE_IN_CONTROLLER",
            ViolationType::AnemicEntity => "ANEMIC_ENTITY",
            ViolationType::FatService => "FAT_SERVICE",
            ViolationType::ScatteredRule => "SCATTERED_RULE",
            ViolationType::LayerViolation => "LAYER_VIOLATION",
        }
    }
}

/// Node kinds appearing in an impact simulation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactNodeKind {
    Rule,
    Entity,
    File,
    Method,
}

/// Byte span of an AST region within its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstSpan {
    pub start: usize,
    pub end: usize,
}

/// A non-technical class carrying mutable state mutated by its own methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntity {
    pub name: String,
    pub properties: Vec<String>,
    pub methods: Vec<String>,
    /// Mutable properties that are actually assigned in methods.
    pub state_fields: Vec<String>,
    pub file_path: String,
}

/// A directed, labeled edge between two identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRelation {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub from: String,
    pub to: String,
}

/// A classified AST region encoding domain logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRule {
    /// Stable identifier `<TYPE>:<filePath>:<astStart>`.
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub entity: Option<String>,
    pub method: Option<String>,
    pub file_path: String,
    pub condition: String,
    pub consequence: String,
    pub ast_location: AstSpan,
    /// In [0, 1], rounded to two decimals.
    pub confidence: f64,
}

/// One node in an impact simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactNode {
    pub id: String,
    pub kind: ImpactNodeKind,
    pub risk_score: f64,
}

/// Measurements behind an impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactExplanation {
    pub fan_out: usize,
    pub call_depth: usize,
    pub affected_files: usize,
    pub affected_entities: usize,
    pub cross_layer_violations: usize,
}

/// Blast radius of changing one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSimulationResult {
    pub rule: BusinessRule,
    /// Root rule first, remainder sorted ascending by identifier.
    pub impacted_nodes: Vec<ImpactNode>,
    pub risk_score: f64,
    pub explanation: ImpactExplanation,
}

/// A detected architectural violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitecturalViolation {
    pub id: String,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub message: String,
    pub file_path: Option<String>,
    pub related: Vec<String>,
}

/// The full analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalReport {
    pub entities: Vec<DomainEntity>,
    pub relations: Vec<DomainRelation>,
    pub rules: Vec<BusinessRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactSimulationResult>,
    pub architectural_violations: Vec<ArchitecturalViolation>,
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scale `value` against `max` into [0, 1]; zero denominator maps to zero.
pub fn normalize(value: usize, max: usize) -> f64 {
    if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64).min(1.0)
    }
}
