//! End-to-end scenarios over temp projects
//!
//! Each test materializes a small TypeScript project on disk, runs the full
//! pipeline, and checks the report.

use epicenter_analysis::{analyze, simulate_rule_impact};
use epicenter_core::{Error, RelationType, RuleType, TechnicalReport, ViolationType, round2};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(sources: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (rel, contents) in sources {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn report_of(sources: &[(&str, &str)]) -> TechnicalReport {
    let dir = project(sources);
    analyze(dir.path()).expect("analysis succeeds")
}

#[test]
fn missing_project_root_is_fatal() {
    let err = analyze(Path::new("/no/such/project")).unwrap_err();
    assert!(matches!(err, Error::ProjectRootNotFound(_)));
}

/// S1 — a class that never mutates its state is not an entity, and no
/// anemic-entity violation is raised for it.
#[test]
fn read_only_cart_is_not_an_entity() {
    let report = report_of(&[(
        "src/cart.ts",
        r#"
class Cart {
    items: string[] = [];
    describe(): string {
        return this.items.join(", ");
    }
}
"#,
    )]);
    assert!(report.entities.is_empty());
    assert!(report.rules.is_empty());
    assert!(
        !report
            .architectural_violations
            .iter()
            .any(|v| v.violation_type == ViolationType::AnemicEntity)
    );
}

/// S2 — a mutator produces one STATE_TRANSITION rule on the entity.
#[test]
fn shipping_an_order_is_a_state_transition() {
    let report = report_of(&[(
        "src/order.ts",
        r#"
class Order {
    status: "NEW" | "SHIPPED" = "NEW";
    ship() {
        this.status = "SHIPPED";
    }
}
"#,
    )]);
    assert_eq!(report.entities.len(), 1);
    let order = &report.entities[0];
    assert_eq!(order.name, "Order");
    assert_eq!(order.state_fields, vec!["status"]);

    assert_eq!(report.rules.len(), 1);
    let rule = &report.rules[0];
    assert_eq!(rule.rule_type, RuleType::StateTransition);
    assert_eq!(rule.entity.as_deref(), Some("Order"));
    assert_eq!(rule.method.as_deref(), Some("ship"));
    assert!(rule.confidence >= 0.65, "got {}", rule.confidence);
}

/// S3 — a guard clause before the mutation yields an invariant whose
/// confidence carries the throw bonus.
#[test]
fn cancel_guard_yields_invariant_and_state_transition() {
    let report = report_of(&[(
        "src/order.ts",
        r#"
class Order {
    status: "NEW" | "SHIPPED" | "CANCELLED" = "NEW";
    cancel() {
        if (this.status === "SHIPPED") {
            throw new Error("cannot cancel a shipped order");
        }
        this.status = "CANCELLED";
    }
}
"#,
    )]);
    assert_eq!(report.rules.len(), 2);
    let invariant = &report.rules[0];
    assert_eq!(invariant.rule_type, RuleType::Invariant);
    // entity 0.25 + mutation 0.25 + throw 0.15 + public 0.10 + enum 0.10
    // + location 0.10 + strong pattern 0.05
    assert_eq!(invariant.confidence, 1.0);

    let transition = &report.rules[1];
    assert_eq!(transition.rule_type, RuleType::StateTransition);
    assert_eq!(transition.condition, "status assignment");
}

/// S4 — a branch with an explicit else is a policy; outside an entity the
/// confidence stays capped.
#[test]
fn premium_discount_is_a_capped_policy() {
    let report = report_of(&[(
        "src/pricing.ts",
        r#"
class Pricing {
    quote(customer: Customer, base: number): number {
        if (customer.tier === "premium") {
            return base * 0.9;
        } else {
            return base;
        }
    }
}
"#,
    )]);
    let policy = report
        .rules
        .iter()
        .find(|r| r.rule_type == RuleType::Policy)
        .expect("policy rule");
    assert_eq!(policy.entity, None);
    assert!(policy.confidence <= 0.60, "got {}", policy.confidence);
}

/// S5 — a lone calculation outside any class floors the risk score.
#[test]
fn entityless_calculation_floors_the_risk_score() {
    let dir = project(&[(
        "src/tax.ts",
        "function withTax(price: number): number { return price * 1.21; }",
    )]);
    let report = analyze(dir.path()).unwrap();
    assert_eq!(report.rules.len(), 1);
    assert_eq!(report.rules[0].rule_type, RuleType::Calculation);

    let impact = report.impact.expect("seeded impact");
    assert!(impact.risk_score >= 0.85);
    assert!(impact.risk_score <= 1.0);

    let direct = simulate_rule_impact(dir.path(), &report.rules[0].id).unwrap();
    assert_eq!(direct.risk_score, impact.risk_score);

    let err = simulate_rule_impact(dir.path(), "POLICY:src/tax.ts:999").unwrap_err();
    assert!(matches!(err, Error::UnknownRule(_)));
}

/// S6 — the same (entity, type) pair in three files is a scattered rule.
#[test]
fn invoice_policy_in_three_files_is_scattered() {
    let body = r#"
class Invoice {
    total: number = 0;
    applyRounding() {
        if (this.total > 100) {
            this.total = this.total - 10;
        } else {
            this.total = this.total + 1;
        }
    }
}
"#;
    let report = report_of(&[
        ("src/billing/invoice.ts", body),
        ("src/checkout/invoice.ts", body),
        ("src/reporting/invoice.ts", body),
    ]);
    let scattered = report
        .architectural_violations
        .iter()
        .find(|v| v.id == "SCATTERED_RULE:Invoice:POLICY")
        .expect("scattered policy violation");
    assert_eq!(scattered.violation_type, ViolationType::ScatteredRule);
    assert_eq!(
        scattered.related,
        vec![
            "src/billing/invoice.ts",
            "src/checkout/invoice.ts",
            "src/reporting/invoice.ts"
        ]
    );
}

#[test]
fn reports_are_idempotent_across_runs() {
    let dir = project(&[
        (
            "src/order.ts",
            r#"
class Order {
    status: "NEW" | "SHIPPED" = "NEW";
    ship() {
        if (this.status !== "NEW") {
            throw new Error("not new");
        }
        this.status = "SHIPPED";
        this.notify();
    }
    notify() {}
}
"#,
        ),
        (
            "src/tax.ts",
            "function withTax(price: number): number { return price * 1.21; }",
        ),
    ]);
    let first = analyze(dir.path()).unwrap();
    let second = analyze(dir.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn report_invariants_hold_on_a_mixed_project() {
    let report = report_of(&[
        (
            "src/domain/order.ts",
            r#"
import { publish } from "../infrastructure/bus";

class Order {
    status: "NEW" | "PAID" | "SHIPPED" = "NEW";
    total: number = 0;
    pay(amount: number) {
        if (this.status !== "NEW") {
            throw new Error("already paid");
        }
        this.total = this.total + amount;
        this.status = "PAID";
        publish("order.paid");
    }
}
"#,
        ),
        (
            "src/controllers/order-controller.ts",
            r#"
class OrderController {
    handlers: string[] = [];
    create(payload: Payload) {
        if (payload.amount > 0) {
            this.handlers = [];
        } else {
            this.handlers = ["rejected"];
        }
    }
}
"#,
        ),
    ]);

    // spans are well-formed and confidences rounded into [0, 1]
    for rule in &report.rules {
        assert!(rule.ast_location.start < rule.ast_location.end, "{}", rule.id);
        assert!((0.0..=1.0).contains(&rule.confidence));
        assert_eq!(rule.confidence, round2(rule.confidence));
        if let Some(entity) = &rule.entity {
            assert!(report.entities.iter().any(|e| &e.name == entity));
        }
        if rule.rule_type == RuleType::StateTransition {
            let field = rule
                .condition
                .strip_suffix(" assignment")
                .expect("state transition condition shape");
            let entity = report
                .entities
                .iter()
                .find(|e| Some(&e.name) == rule.entity.as_ref())
                .expect("owning entity");
            assert!(entity.state_fields.iter().any(|f| f == field));
        }
    }

    // no (type, from, to) duplicates
    let mut seen = HashSet::new();
    for relation in &report.relations {
        assert!(seen.insert((
            relation.relation_type,
            relation.from.clone(),
            relation.to.clone()
        )));
    }
    // USES mirrors CALLS in the serialized output
    assert!(
        report
            .relations
            .iter()
            .any(|r| r.relation_type == RelationType::Uses)
    );

    // technical suffixes never qualify
    for entity in &report.entities {
        for suffix in ["Controller", "Service", "Repository", "Adapter", "Gateway"] {
            assert!(!entity.name.ends_with(suffix));
        }
    }

    // the controller rule is flagged architecturally
    assert!(
        report
            .architectural_violations
            .iter()
            .any(|v| v.violation_type == ViolationType::RuleInController)
    );
    // the seeded impact lists the root rule first, exactly once
    let impact = report.impact.expect("impact");
    assert_eq!(impact.impacted_nodes[0].id, impact.rule.id);
    assert_eq!(
        impact
            .impacted_nodes
            .iter()
            .filter(|n| n.id == impact.rule.id)
            .count(),
        1
    );
}

#[test]
fn tsconfig_narrows_the_analyzed_source_set() {
    let dir = project(&[
        (
            "tsconfig.json",
            r#"{ "include": ["src"], "exclude": ["src/legacy"] }"#,
        ),
        (
            "src/order.ts",
            r#"
class Order {
    status: "NEW" | "SHIPPED" = "NEW";
    ship() { this.status = "SHIPPED"; }
}
"#,
        ),
        (
            "src/legacy/old.ts",
            "function legacyTax(price: number): number { return price * 2.0; }",
        ),
        (
            "scripts/tool.ts",
            "function tool(x: number): number { return x * 3.0; }",
        ),
    ]);
    let report = analyze(dir.path()).unwrap();
    let files: HashSet<&str> = report.rules.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(files, HashSet::from(["src/order.ts"]));
}
