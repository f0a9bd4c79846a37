use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use routegate::backend::MockModelService;
use routegate::domain::{ConditionRule, OperatorKind, PolicyRule, QueryRequest, RuleAction};
use routegate::execution::ExecutionCoordinator;
use routegate::rules::{evaluate, StaticRuleProvider};

fn create_rules(count: usize) -> Vec<PolicyRule> {
    let mut rules: Vec<PolicyRule> = (0..count)
        .map(|i| {
            PolicyRule::new(format!("rule-{}", i), i as i32 + 10, RuleAction::ForceLocal)
                .with_condition(ConditionRule::content_contains(format!("keyword{}", i)))
        })
        .collect();

    rules.push(
        PolicyRule::new(
            "block-passwords",
            1,
            RuleAction::Block {
                reason: "Sensitive data detected".to_string(),
            },
        )
        .with_condition(ConditionRule::content_contains("password")),
    );

    rules
}

fn bench_evaluate_miss(c: &mut Criterion) {
    let rules = create_rules(50);
    let request = QueryRequest::new("What is the weather forecast for tomorrow afternoon?");

    c.bench_function("evaluate_50_rules_miss", |b| {
        b.iter(|| evaluate(black_box(&rules), black_box(&request)))
    });
}

fn bench_evaluate_first_hit(c: &mut Criterion) {
    let rules = create_rules(50);
    let request = QueryRequest::new("I forgot my password again");

    c.bench_function("evaluate_50_rules_first_hit", |b| {
        b.iter(|| evaluate(black_box(&rules), black_box(&request)))
    });
}

fn bench_evaluate_regex(c: &mut Criterion) {
    let rules = vec![PolicyRule::new("card-numbers", 1, RuleAction::ForceLocal).with_condition(
        ConditionRule::new("content", OperatorKind::Matches, r"\b\d{4}-\d{4}-\d{4}-\d{4}\b"),
    )];
    let request = QueryRequest::new("my card is 1234-5678-9012-3456");

    c.bench_function("evaluate_regex_condition", |b| {
        b.iter(|| evaluate(black_box(&rules), black_box(&request)))
    });
}

fn bench_execute_local(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let coordinator = Arc::new(
        ExecutionCoordinator::new(Arc::new(MockModelService::with_answer("local", "ok")))
            .with_rule_provider(Arc::new(StaticRuleProvider::new(create_rules(50)))),
    );

    c.bench_function("execute_local_dispatch", |b| {
        b.to_async(&runtime).iter(|| {
            let coordinator = coordinator.clone();
            async move {
                coordinator
                    .execute(QueryRequest::new("summarize this paragraph"))
                    .await
            }
        })
    });
}

criterion_group!(
    benches,
    bench_evaluate_miss,
    bench_evaluate_first_hit,
    bench_evaluate_regex,
    bench_execute_local,
);

criterion_main!(benches);
