use serde::{Deserialize, Serialize};

use crate::error::{KichoError, Result};

/// Direction a rule applies to: expense (outflow) or income (inflow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Expense,
    Income,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Expense => "expense",
            RuleType::Income => "income",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "expense" => Ok(RuleType::Expense),
            "income" => Ok(RuleType::Income),
            other => Err(KichoError::Other(format!("unknown rule type: {other}"))),
        }
    }
}

/// Scope tier a rule belongs to, derived from which foreign key is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Client,
    Industry,
    Shared,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: i64,
    pub priority: i64,
    pub rule_type: RuleType,
    pub industry_id: Option<i64>,
    pub client_id: Option<i64>,
    pub supplier_pattern: Option<String>,
    pub amount_min: Option<i64>,
    pub amount_max: Option<i64>,
    pub account_item_id: i64,
    pub tax_category_id: i64,
    pub is_active: bool,
    pub created_at: String,
}

impl Rule {
    /// Client and industry are mutually exclusive (schema CHECK); client is
    /// checked first so a bad row can never widen its own scope.
    pub fn scope(&self) -> RuleScope {
        if self.client_id.is_some() {
            RuleScope::Client
        } else if self.industry_id.is_some() {
            RuleScope::Industry
        } else {
            RuleScope::Shared
        }
    }
}

/// One line item extracted from a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit_price: Option<i64>,
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Transaction facts extracted from one document. Immutable once produced;
/// amounts are integer yen.
#[derive(Debug, Clone)]
pub struct TransactionFact {
    pub date: String,
    pub supplier: Option<String>,
    pub amount: i64,
    pub tax_amount: Option<i64>,
    pub line_items: Option<Vec<LineItem>>,
}

/// The client-side inputs to rule resolution.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub client_id: i64,
    pub industry_id: Option<i64>,
    pub use_custom_rules: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Rule,
    Ai,
    Manual,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Rule => "rule",
            Provenance::Ai => "ai",
            Provenance::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCategory {
    Business,
    Private,
}

impl EntryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::Business => "business",
            EntryCategory::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "business" => Ok(EntryCategory::Business),
            "private" => Ok(EntryCategory::Private),
            other => Err(KichoError::Other(format!("unknown entry category: {other}"))),
        }
    }
}

/// Where a journal entry sits in the review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Approved,
    Exported,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Approved => "approved",
            EntryStatus::Exported => "exported",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl OcrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrStatus::Pending => "pending",
            OcrStatus::Processing => "processing",
            OcrStatus::Completed => "completed",
            OcrStatus::Failed => "failed",
        }
    }
}

/// The outcome of classifying one transaction. Derived, not persisted as its
/// own record; its fields land on the journal entry.
#[derive(Debug, Clone)]
pub struct Classification {
    pub account_item_id: i64,
    pub tax_category_id: i64,
    pub category: EntryCategory,
    pub confidence: f64,
    pub provenance: Provenance,
    pub matched_rule_id: Option<i64>,
    pub notes: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub industry_id: Option<i64>,
    pub annual_sales: Option<i64>,
    pub tax_treatment: String,
    pub invoice_registered: bool,
    pub use_custom_rules: bool,
    pub is_active: bool,
}

impl Client {
    pub fn context(&self) -> ClientContext {
        ClientContext {
            client_id: self.id,
            industry_id: self.industry_id,
            use_custom_rules: self.use_custom_rules,
        }
    }
}
