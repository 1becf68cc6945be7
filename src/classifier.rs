use std::collections::HashMap;

use rusqlite::Connection;

use crate::error::{KichoError, Result};
use crate::models::{
    Classification, ClientContext, EntryCategory, Provenance, Rule, RuleType, TransactionFact,
};
use crate::resolver;

/// A best-guess classification from the external AI service. Names come back
/// as free text and are mapped to master-data ids by the pipeline.
#[derive(Debug, Clone)]
pub struct AiJudgement {
    pub category: EntryCategory,
    pub account_item: String,
    pub account_item_code: String,
    pub tax_category: String,
    pub notes: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// External AI classification backend. Invoked only when no rule matches.
pub trait AiClassifier {
    fn classify(&self, fact: &TransactionFact, industry_hint: Option<&str>) -> Result<AiJudgement>;
}

/// Lookup from AI-returned names/codes to master-data ids.
pub struct MasterIndex {
    account_by_code: HashMap<String, i64>,
    account_by_name: HashMap<String, i64>,
    tax_by_name: HashMap<String, i64>,
}

impl MasterIndex {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut account_by_code = HashMap::new();
        let mut account_by_name = HashMap::new();
        let mut stmt = conn.prepare("SELECT id, code, name FROM account_items")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        for row in rows {
            let (id, code, name) = row?;
            account_by_code.insert(code, id);
            account_by_name.insert(name, id);
        }

        let mut tax_by_name = HashMap::new();
        let mut stmt = conn.prepare("SELECT id, name FROM tax_categories")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (id, name) = row?;
            tax_by_name.insert(name, id);
        }

        Ok(Self { account_by_code, account_by_name, tax_by_name })
    }

    /// Code match first (codes are the stable identifier), then name.
    pub fn account_item_id(&self, code: &str, name: &str) -> Option<i64> {
        self.account_by_code
            .get(code)
            .or_else(|| self.account_by_name.get(name))
            .copied()
    }

    pub fn tax_category_id(&self, name: &str) -> Option<i64> {
        self.tax_by_name.get(name).copied()
    }
}

/// Ids used when classification has to degrade: the misc-expense account
/// item, the standard 10% taxable category, and the out-of-scope category.
#[derive(Debug, Clone, Copy)]
pub struct FallbackDefaults {
    pub misc_account_item_id: i64,
    pub taxable_10_id: i64,
    pub out_of_scope_id: i64,
}

impl FallbackDefaults {
    pub fn load(conn: &Connection, fallback_account_code: &str) -> Result<Self> {
        let misc_account_item_id: i64 = conn
            .query_row(
                "SELECT id FROM account_items WHERE code = ?1",
                [fallback_account_code],
                |row| row.get(0),
            )
            .map_err(|_| KichoError::UnknownAccountItem(fallback_account_code.to_string()))?;
        let taxable_10_id: i64 = conn
            .query_row("SELECT id FROM tax_categories WHERE name = '課税仕入 10%'", [], |row| row.get(0))
            .map_err(|_| KichoError::UnknownTaxCategory("課税仕入 10%".to_string()))?;
        let out_of_scope_id: i64 = conn
            .query_row("SELECT id FROM tax_categories WHERE name = '対象外'", [], |row| row.get(0))
            .map_err(|_| KichoError::UnknownTaxCategory("対象外".to_string()))?;
        Ok(Self { misc_account_item_id, taxable_10_id, out_of_scope_id })
    }

    /// Tax category inferred from whether the receipt showed a tax amount.
    fn tax_for(&self, fact: &TransactionFact) -> i64 {
        if fact.tax_amount.is_some() {
            self.taxable_10_id
        } else {
            self.out_of_scope_id
        }
    }
}

/// Rule-first classification over a fixed rule snapshot. Never fails: a rule
/// hit is certain, an AI answer is taken as reported, and an AI failure
/// degrades to a low-confidence misc-expense guess for staff review.
pub struct Pipeline<'a> {
    pub rules: &'a [Rule],
    pub ai: &'a dyn AiClassifier,
    pub index: &'a MasterIndex,
    pub defaults: FallbackDefaults,
    pub industry_hint: Option<String>,
}

impl Pipeline<'_> {
    pub fn classify(&self, rule_type: RuleType, fact: &TransactionFact, ctx: &ClientContext) -> Classification {
        if let Some(rule) = resolver::resolve(self.rules, rule_type, fact, ctx) {
            return Classification {
                account_item_id: rule.account_item_id,
                tax_category_id: rule.tax_category_id,
                category: EntryCategory::Business,
                confidence: 1.0,
                provenance: Provenance::Rule,
                matched_rule_id: Some(rule.id),
                notes: None,
            };
        }

        match self.ai.classify(fact, self.industry_hint.as_deref()) {
            Ok(judgement) => {
                // Unresolvable names degrade field-by-field to the defaults.
                let account_item_id = self
                    .index
                    .account_item_id(&judgement.account_item_code, &judgement.account_item)
                    .unwrap_or(self.defaults.misc_account_item_id);
                let tax_category_id = self
                    .index
                    .tax_category_id(&judgement.tax_category)
                    .unwrap_or_else(|| self.defaults.tax_for(fact));
                Classification {
                    account_item_id,
                    tax_category_id,
                    category: judgement.category,
                    confidence: judgement.confidence.clamp(0.0, 1.0),
                    provenance: Provenance::Ai,
                    matched_rule_id: None,
                    notes: Some(if judgement.reasoning.is_empty() {
                        judgement.notes
                    } else {
                        format!("{} ({})", judgement.notes, judgement.reasoning)
                    }),
                }
            }
            Err(e) => Classification {
                account_item_id: self.defaults.misc_account_item_id,
                tax_category_id: self.defaults.tax_for(fact),
                category: EntryCategory::Business,
                confidence: 0.5,
                provenance: Provenance::Ai,
                matched_rule_id: None,
                notes: Some(format!("AI classification failed, defaulted to misc expense: {e}")),
            },
        }
    }
}

// (keyword, account item name, code)
const KEYWORD_TABLE: &[(&str, &str, &str)] = &[
    ("ガソリン", "燃料費", "501"),
    ("eneos", "燃料費", "501"),
    ("出光", "燃料費", "501"),
    ("洗車", "車両費", "502"),
    ("オートバックス", "車両費", "502"),
    ("配信機材", "消耗品費", "503"),
    ("文具", "消耗品費", "503"),
    ("事務用品", "消耗品費", "503"),
    ("通信", "通信費", "504"),
    ("ソフトウェア", "通信費", "504"),
    ("docomo", "通信費", "504"),
    ("softbank", "通信費", "504"),
    ("居酒屋", "接待交際費", "505"),
    ("レストラン", "接待交際費", "505"),
    ("タクシー", "旅費交通費", "507"),
    ("鉄道", "旅費交通費", "507"),
    ("jr", "旅費交通費", "507"),
];

/// Deterministic offline classifier used by `demo` and tests. Scans supplier
/// text and line-item names against a small keyword table distilled from
/// common filings for the seeded industries.
pub struct KeywordClassifier;

impl AiClassifier for KeywordClassifier {
    fn classify(&self, fact: &TransactionFact, _industry_hint: Option<&str>) -> Result<AiJudgement> {
        let mut haystack = fact.supplier.clone().unwrap_or_default().to_lowercase();
        if let Some(items) = &fact.line_items {
            for item in items {
                haystack.push(' ');
                haystack.push_str(&item.name.to_lowercase());
            }
        }

        let hit = KEYWORD_TABLE.iter().find(|(kw, _, _)| haystack.contains(&kw.to_lowercase()));
        let (name, code, confidence, reasoning) = match hit {
            Some((kw, name, code)) => {
                (*name, *code, 0.85, format!("matched keyword '{kw}'"))
            }
            None => ("雑費", "599", 0.6, "no keyword matched".to_string()),
        };

        let tax_category = if fact.tax_amount.is_some() { "課税仕入 10%" } else { "対象外" };
        let supplier = fact.supplier.as_deref().unwrap_or("不明");
        Ok(AiJudgement {
            category: EntryCategory::Business,
            account_item: name.to_string(),
            account_item_code: code.to_string(),
            tax_category: tax_category.to_string(),
            notes: supplier.to_string(),
            confidence,
            reasoning,
        })
    }
}
