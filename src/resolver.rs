use rusqlite::Connection;

use crate::error::Result;
use crate::models::{ClientContext, Rule, RuleScope, RuleType, TransactionFact};

/// One matching constraint carried by a rule. A rule's constraints are
/// AND-composed; a rule with none is unconstrained and matches any
/// transaction of its type.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    SupplierContains(String),
    AmountAtLeast(i64),
    AmountAtMost(i64),
}

impl Predicate {
    pub fn matches(&self, fact: &TransactionFact) -> bool {
        match self {
            // Case-insensitive substring containment. A pattern rule never
            // matches a transaction whose supplier is unknown.
            Predicate::SupplierContains(pattern) => match &fact.supplier {
                Some(supplier) => supplier.to_lowercase().contains(&pattern.to_lowercase()),
                None => false,
            },
            Predicate::AmountAtLeast(min) => fact.amount >= *min,
            Predicate::AmountAtMost(max) => fact.amount <= *max,
        }
    }
}

/// Constraints derived from a rule's nullable matcher fields.
pub fn predicates(rule: &Rule) -> Vec<Predicate> {
    let mut preds = Vec::new();
    if let Some(pattern) = &rule.supplier_pattern {
        if !pattern.is_empty() {
            preds.push(Predicate::SupplierContains(pattern.clone()));
        }
    }
    if let Some(min) = rule.amount_min {
        preds.push(Predicate::AmountAtLeast(min));
    }
    if let Some(max) = rule.amount_max {
        preds.push(Predicate::AmountAtMost(max));
    }
    preds
}

fn rule_matches(rule: &Rule, fact: &TransactionFact) -> bool {
    predicates(rule).iter().all(|p| p.matches(fact))
}

/// Resolve the governing rule for a transaction, or `None` when no rule
/// applies (a valid outcome, not an error).
///
/// Scope tiers are tried in order client → industry → shared and never
/// merged: a matching client rule beats any industry or shared rule no
/// matter their numeric priorities. Priority orders candidates only within
/// a tier (lower value wins); equal priorities break by creation order
/// (`created_at`, then id).
///
/// When the context has `use_custom_rules` off, client-scoped rules are
/// skipped entirely.
pub fn resolve<'a>(
    rules: &'a [Rule],
    rule_type: RuleType,
    fact: &TransactionFact,
    ctx: &ClientContext,
) -> Option<&'a Rule> {
    let tiers = [RuleScope::Client, RuleScope::Industry, RuleScope::Shared];
    for tier in tiers {
        let candidate = rules
            .iter()
            .filter(|r| r.is_active && r.rule_type == rule_type)
            .filter(|r| in_tier(r, tier, ctx))
            .filter(|r| rule_matches(r, fact))
            .min_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.created_at.cmp(&b.created_at))
                    .then_with(|| a.id.cmp(&b.id))
            });
        if let Some(rule) = candidate {
            return Some(rule);
        }
    }
    None
}

fn in_tier(rule: &Rule, tier: RuleScope, ctx: &ClientContext) -> bool {
    match tier {
        RuleScope::Client => {
            ctx.use_custom_rules && rule.scope() == RuleScope::Client && rule.client_id == Some(ctx.client_id)
        }
        RuleScope::Industry => {
            ctx.industry_id.is_some()
                && rule.scope() == RuleScope::Industry
                && rule.industry_id == ctx.industry_id
        }
        RuleScope::Shared => rule.scope() == RuleScope::Shared,
    }
}

/// Fetch the active rule snapshot for one direction. Ordered by creation so
/// the in-tier tie-break is stable across fetches. Callers re-fetch per
/// classification run rather than caching across a session.
pub fn load_active_rules(conn: &Connection, rule_type: RuleType) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, priority, rule_type, industry_id, client_id, supplier_pattern, \
                amount_min, amount_max, account_item_id, tax_category_id, is_active, created_at \
         FROM rules WHERE is_active = 1 AND rule_type = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map([rule_type.as_str()], |row| {
            Ok(Rule {
                id: row.get(0)?,
                priority: row.get(1)?,
                rule_type: RuleType::parse(&row.get::<_, String>(2)?)
                    .unwrap_or(RuleType::Expense),
                industry_id: row.get(3)?,
                client_id: row.get(4)?,
                supplier_pattern: row.get(5)?,
                amount_min: row.get(6)?,
                amount_max: row.get(7)?,
                account_item_id: row.get(8)?,
                tax_category_id: row.get(9)?,
                is_active: row.get(10)?,
                created_at: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
