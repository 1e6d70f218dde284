// ── Filter combinators ──
//
// Groups exclusively own their children and are immutable once built,
// so the tree can never contain a cycle. Children are evaluated in
// declaration order; that order decides which reason gets reported.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{Evaluation, Filter};
use crate::error::CoreError;
use crate::model::DeviceSnapshot;

/// Logical mode of a [`FilterGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Every child must match. Empty group matches everything.
    #[strum(serialize = "and", serialize = "all")]
    #[serde(rename = "and", alias = "all")]
    All,
    /// At least one child must match. Empty group matches nothing.
    #[strum(serialize = "or", serialize = "any")]
    #[serde(rename = "or", alias = "any")]
    Any,
}

// ── FilterGroup ─────────────────────────────────────────────────────

/// AND / OR over an ordered list of child filters (leaves or groups).
#[derive(Debug)]
pub struct FilterGroup {
    mode: Mode,
    children: Vec<Box<dyn Filter>>,
}

impl FilterGroup {
    pub fn new(mode: Mode, children: Vec<Box<dyn Filter>>) -> Self {
        Self { mode, children }
    }

    pub fn all(children: Vec<Box<dyn Filter>>) -> Self {
        Self::new(Mode::All, children)
    }

    pub fn any(children: Vec<Box<dyn Filter>>) -> Self {
        Self::new(Mode::Any, children)
    }

    /// Start an incremental build; the result is immutable.
    pub fn builder(mode: Mode) -> FilterGroupBuilder {
        FilterGroupBuilder {
            mode,
            children: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Filter for FilterGroup {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        match self.mode {
            Mode::All => self.children.iter().all(|c| c.matches(device)),
            Mode::Any => self.children.iter().any(|c| c.matches(device)),
        }
    }

    fn describe(&self) -> String {
        if self.children.is_empty() {
            return match self.mode {
                Mode::All => "ALL()".into(),
                Mode::Any => "ANY()".into(),
            };
        }
        let sep = match self.mode {
            Mode::All => " AND ",
            Mode::Any => " OR ",
        };
        let parts: Vec<String> = self.children.iter().map(|c| c.describe()).collect();
        format!("({})", parts.join(sep))
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        let eval = self.evaluate(device);
        if eval.matched { None } else { eval.reason }
    }

    fn evaluate(&self, device: &DeviceSnapshot) -> Evaluation {
        match self.mode {
            Mode::All => {
                for child in &self.children {
                    let eval = child.evaluate(device);
                    if !eval.matched {
                        let reason = eval
                            .reason
                            .unwrap_or_else(|| format!("{} did not match", child.describe()));
                        return Evaluation::fail(reason);
                    }
                }
                Evaluation::pass()
            }
            Mode::Any => {
                let mut failures = Vec::with_capacity(self.children.len());
                for child in &self.children {
                    let eval = child.evaluate(device);
                    if eval.matched {
                        let reason = eval.reason.unwrap_or_else(|| child.describe());
                        return Evaluation::pass_because(reason);
                    }
                    if let Some(reason) = eval.reason {
                        failures.push(reason);
                    }
                }
                if failures.is_empty() {
                    Evaluation::fail("empty OR group matches nothing")
                } else {
                    Evaluation::fail(format!("no alternative matched: {}", failures.join("; ")))
                }
            }
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Incremental constructor for [`FilterGroup`].
#[derive(Debug)]
pub struct FilterGroupBuilder {
    mode: Mode,
    children: Vec<Box<dyn Filter>>,
}

impl FilterGroupBuilder {
    pub fn with(mut self, child: impl Filter + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn push(&mut self, child: Box<dyn Filter>) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn build(self) -> FilterGroup {
        FilterGroup::new(self.mode, self.children)
    }
}

// ── NOT ─────────────────────────────────────────────────────────────

/// Inverts exactly one child.
#[derive(Debug)]
pub struct NotFilter {
    inner: Box<dyn Filter>,
}

impl NotFilter {
    pub fn new(inner: impl Filter + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Build from a child list, rejecting anything but exactly one child.
    pub fn from_children(mut children: Vec<Box<dyn Filter>>) -> Result<Self, CoreError> {
        if children.len() != 1 {
            return Err(CoreError::config(format!(
                "NOT takes exactly one child, got {}",
                children.len()
            )));
        }
        match children.pop() {
            Some(inner) => Ok(Self { inner }),
            None => Err(CoreError::config("NOT takes exactly one child, got 0")),
        }
    }
}

impl Filter for NotFilter {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        !self.inner.matches(device)
    }

    fn describe(&self) -> String {
        format!("NOT {}", self.inner.describe())
    }

    fn evaluate(&self, device: &DeviceSnapshot) -> Evaluation {
        let eval = self.inner.evaluate(device);
        if eval.matched {
            Evaluation::fail(format!("{} matched", self.inner.describe()))
        } else {
            let why = eval
                .reason
                .unwrap_or_else(|| format!("{} did not match", self.inner.describe()));
            Evaluation::pass_because(format!("not: {why}"))
        }
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        self.inner
            .matches(device)
            .then(|| format!("{} matched", self.inner.describe()))
    }
}
