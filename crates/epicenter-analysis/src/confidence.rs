//! Confidence scoring for extracted rules

use epicenter_core::{RuleType, round2};

/// Everything the score depends on, so tests can pin values by constructing
/// contexts directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext {
    /// The rule sits inside a qualified domain entity.
    pub in_entity: bool,
    /// The surrounding method mutates a state field.
    pub mutates_state: bool,
    /// The rule region contains an explicit throw.
    pub has_throw: bool,
    /// The owning method is public or unscoped.
    pub method_public: bool,
    /// The node uses an enum symbol.
    pub uses_enum: bool,
    /// The file is not under a controller/infrastructure/adapter directory.
    pub outside_infra_dir: bool,
    /// The file path looks like a controller.
    pub in_controller_path: bool,
    /// The kind-specific structural shape is present.
    pub strong_pattern: bool,
    /// The node executes inside a conditional branch.
    pub in_conditional: bool,
}

/// Additive signals, then caps and penalties, clamped to [0, 1] and rounded
/// to two decimals.
pub fn score(rule_type: RuleType, ctx: &RuleContext) -> f64 {
    let mut value: f64 = 0.0;
    if ctx.in_entity {
        value += 0.25;
    }
    if ctx.mutates_state {
        value += 0.25;
    }
    if ctx.has_throw {
        value += 0.15;
    }
    if ctx.method_public {
        value += 0.10;
    }
    if ctx.uses_enum {
        value += 0.10;
    }
    if ctx.outside_infra_dir {
        value += 0.10;
    }
    if ctx.strong_pattern {
        value += 0.05;
    }

    if !ctx.in_entity {
        value = value.min(0.60);
    }
    if ctx.in_controller_path {
        value -= 0.20;
    }
    if rule_type == RuleType::Calculation && !ctx.mutates_state && !ctx.in_conditional {
        value = value.min(0.70);
    }

    round2(value.clamp(0.0, 1.0))
}
