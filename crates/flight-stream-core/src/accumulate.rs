//! Append-only accumulation of display records and provider summaries.
//!
//! The [`ResultAccumulator`] owns the running view model. Each call to
//! [`apply`](ResultAccumulator::apply) appends a batch of records in
//! arrival order and bumps the summary of every provider the batch
//! mentions. Nothing is ever removed or rewritten.
//!
//! Summaries are grouped per record rather than per frame, so a frame
//! mixing providers is counted correctly too.
//!
//! Badge styles are cosmetic and assigned once per provider by a
//! pluggable [`StylePolicy`]; tests use [`RotatingStyle`] for
//! deterministic output.

use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::models::{DisplayRecord, ProviderSummary};

/// Display-style tag attached to a provider summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
    Info,
    Dark,
}

impl BadgeStyle {
    pub const ALL: [BadgeStyle; 7] = [
        BadgeStyle::Primary,
        BadgeStyle::Secondary,
        BadgeStyle::Success,
        BadgeStyle::Danger,
        BadgeStyle::Warning,
        BadgeStyle::Info,
        BadgeStyle::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeStyle::Primary => "primary",
            BadgeStyle::Secondary => "secondary",
            BadgeStyle::Success => "success",
            BadgeStyle::Danger => "danger",
            BadgeStyle::Warning => "warning",
            BadgeStyle::Info => "info",
            BadgeStyle::Dark => "dark",
        }
    }
}

impl fmt::Display for BadgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses a badge style for a newly seen provider.
pub trait StylePolicy: Send {
    fn pick(&mut self, provider_id: &str) -> BadgeStyle;
}

/// Uniform random choice over [`BadgeStyle::ALL`].
#[derive(Debug, Default)]
pub struct RandomStyle;

impl StylePolicy for RandomStyle {
    fn pick(&mut self, _provider_id: &str) -> BadgeStyle {
        let i = rand::thread_rng().gen_range(0..BadgeStyle::ALL.len());
        BadgeStyle::ALL[i]
    }
}

/// Cycles through [`BadgeStyle::ALL`] in order.
#[derive(Debug, Default)]
pub struct RotatingStyle {
    next: usize,
}

impl StylePolicy for RotatingStyle {
    fn pick(&mut self, _provider_id: &str) -> BadgeStyle {
        let style = BadgeStyle::ALL[self.next % BadgeStyle::ALL.len()];
        self.next += 1;
        style
    }
}

/// What one [`apply`](ResultAccumulator::apply) changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchUpdate {
    /// Records appended by this batch, in order.
    pub appended: Vec<DisplayRecord>,
    /// Current state of every summary the batch touched, first-touched order.
    pub summaries: Vec<ProviderSummary>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty()
    }
}

/// Running view model for one search.
pub struct ResultAccumulator {
    records: Vec<DisplayRecord>,
    summaries: Vec<ProviderSummary>,
    by_provider: HashMap<String, usize>,
    styles: Box<dyn StylePolicy>,
}

impl ResultAccumulator {
    pub fn new(styles: Box<dyn StylePolicy>) -> Self {
        Self {
            records: Vec::new(),
            summaries: Vec::new(),
            by_provider: HashMap::new(),
            styles,
        }
    }

    /// Append a batch and update provider summaries.
    pub fn apply(&mut self, batch: Vec<DisplayRecord>) -> BatchUpdate {
        let mut touched: Vec<usize> = Vec::new();

        for record in &batch {
            let slot = match self.by_provider.get(&record.provider_id) {
                Some(&slot) => slot,
                None => {
                    let style = self.styles.pick(&record.provider_id);
                    self.summaries.push(ProviderSummary {
                        provider_id: record.provider_id.clone(),
                        presentation_name: record.provider_presentation_name.clone(),
                        count: 0,
                        style,
                    });
                    let slot = self.summaries.len() - 1;
                    self.by_provider.insert(record.provider_id.clone(), slot);
                    slot
                }
            };
            self.summaries[slot].count += 1;
            if !touched.contains(&slot) {
                touched.push(slot);
            }
        }

        self.records.extend(batch.iter().cloned());

        BatchUpdate {
            appended: batch,
            summaries: touched
                .into_iter()
                .map(|slot| self.summaries[slot].clone())
                .collect(),
        }
    }

    /// Every record so far, in arrival order.
    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    /// Every provider summary, in first-seen order.
    pub fn summaries(&self) -> &[ProviderSummary] {
        &self.summaries
    }

    pub fn summary(&self, provider_id: &str) -> Option<&ProviderSummary> {
        self.by_provider
            .get(provider_id)
            .map(|&slot| &self.summaries[slot])
    }
}

impl Default for ResultAccumulator {
    fn default() -> Self {
        Self::new(Box::new(RandomStyle))
    }
}

impl fmt::Debug for ResultAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultAccumulator")
            .field("records", &self.records.len())
            .field("summaries", &self.summaries)
            .finish()
    }
}
