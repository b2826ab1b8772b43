//! Epicenter Core — report data model, error type, and relation graph

pub mod error;
pub mod graph;
pub mod model;


pub use error::{Error, Result};
pub use graph::{RelationGraph, is_impact_bearing};
pub use model::{
    ArchitecturalViolation, AstSpan, BusinessRule, DomainEntity, DomainRelation,
    ImpactExplanation, ImpactNode, ImpactNodeKind, ImpactSimulationResult, RelationType, RuleType,
    SemanticKind, TECHNICAL_SUFFIXES, TechnicalReport, ViolationType, normalize, round2,
};
