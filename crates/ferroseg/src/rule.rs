use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, RuleStatus};

/// A named rule governing how IDs for one business key are allocated.
///
/// `key` and `id` are identity: `key` is chosen by the caller and never
/// changes, `id` is assigned by the repository on insert and never reused.
/// Everything else is mutable through
/// [`RuleRepository::update_rule_by_key`].
///
/// # Example
///
/// ```
/// use ferroseg::{RuleStatus, SequenceRuleDefinition};
///
/// let rule = SequenceRuleDefinition::new("order_id", 1000)
///     .with_name("Orders")
///     .with_attribute("owner", "checkout");
///
/// assert_eq!(rule.id, 0);
/// assert_eq!(rule.status, RuleStatus::Enabled);
/// ```
///
/// [`RuleRepository::update_rule_by_key`]: crate::RuleRepository::update_rule_by_key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRuleDefinition {
    /// Assigned on insert; `0` until then.
    #[serde(default)]
    pub id: u64,
    pub key: String,
    /// Segment size granted per allocation call. Always positive.
    pub step: u64,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl SequenceRuleDefinition {
    /// Creates an enabled rule with no metadata and an unassigned id.
    pub fn new(key: impl Into<String>, step: u64) -> Self {
        Self {
            id: 0,
            key: key.into(),
            step,
            status: RuleStatus::Enabled,
            name: None,
            description: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Checks the invariants every stored rule must satisfy.
    ///
    /// # Errors
    /// - [`Error::InvalidRule`] if the key is empty or the step is zero.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::invalid("key must not be empty"));
        }
        if self.step == 0 {
            return Err(Error::invalid(format!(
                "step for [{}] must be greater than 0",
                self.key
            )));
        }
        Ok(())
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| Error::CorruptRecord {
            key: self.key.clone(),
            source,
        })
    }

    pub(crate) fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| Error::CorruptRecord {
            key: key.to_owned(),
            source,
        })
    }
}

/// Selects rules for [`RuleRepository::list_rules_by_page`] and
/// [`RuleRepository::count_rules`].
///
/// Both operations interpret a filter through [`RuleFilter::matches`] and the
/// same key short-circuit, so a count always equals the number of rules the
/// listing would return across all pages.
///
/// When `key` is set it wins: the result is that one rule (or nothing) and
/// `status` is ignored.
///
/// [`RuleRepository::list_rules_by_page`]: crate::RuleRepository::list_rules_by_page
/// [`RuleRepository::count_rules`]: crate::RuleRepository::count_rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub key: Option<String>,
    pub status: Option<RuleStatus>,
}

impl RuleFilter {
    /// Matches every rule.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            status: None,
        }
    }

    pub fn by_status(status: RuleStatus) -> Self {
        Self {
            key: None,
            status: Some(status),
        }
    }

    /// Whether `rule` passes the status part of this filter.
    ///
    /// The key part is resolved by direct lookup, not by scanning.
    pub fn matches(&self, rule: &SequenceRuleDefinition) -> bool {
        self.status.is_none_or(|status| rule.status == status)
    }
}

/// A one-based page window.
///
/// Page `0` is treated as page `1`. A window that starts past the end of the
/// result set is simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// A single page large enough to hold any result set.
    pub const fn unbounded() -> Self {
        Self::new(1, u32::MAX)
    }

    /// Index of the first element in the window.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Returns the part of `items` covered by this window, clamped to the
    /// available length.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        &items[start..end]
    }
}
