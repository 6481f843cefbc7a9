// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View configuration.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Slots per container row.
pub const ROW_WIDTH: usize = 9;

/// Layout character that marks slots open to
/// [`Placement::NextAvailable`](crate::Placement::NextAvailable) items.
pub const AVAILABLE_SLOT: char = 'O';

/// Default of [`ViewConfig::max_update_rounds`].
pub(crate) const DEFAULT_UPDATE_ROUNDS: usize = 32;

/// Static settings of a [`View`](crate::View).
///
/// Built code-first:
///
/// ```
/// use coffer_view::ViewConfig;
///
/// let config = ViewConfig::rows(3)
///     .title("Shop")
///     .layout(["#########", "#OOOOOOO#", "#<##X##>#"])
///     .cancel_on_click(false);
/// assert_eq!(config.size, 27);
/// assert!(config.validate().is_ok());
/// ```
///
/// With the `serde` feature it can also be deserialized; missing fields take
/// their [`Default`] values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ViewConfig {
    /// Container title.
    pub title: String,
    /// Number of slots.
    pub size: usize,
    /// One string per row, one character per slot. Empty means no layout.
    pub layout: Vec<String>,
    /// Default click cancellation for components that do not choose.
    pub cancel_on_click: bool,
    /// Default close-on-click for items that do not choose.
    pub close_on_click: bool,
    /// Default update-on-click for items that do not choose.
    pub update_on_click: bool,
    /// How many update rounds a single flush may drain.
    pub max_update_rounds: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: 3 * ROW_WIDTH,
            layout: Vec::new(),
            cancel_on_click: true,
            close_on_click: false,
            update_on_click: false,
            max_update_rounds: DEFAULT_UPDATE_ROUNDS,
        }
    }
}

impl ViewConfig {
    /// A configuration with `rows` full rows.
    #[must_use]
    pub fn rows(rows: usize) -> Self {
        Self::with_size(rows * ROW_WIDTH)
    }

    /// A configuration with exactly `size` slots.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the layout, one string per row.
    #[must_use]
    pub fn layout<S: Into<String>>(mut self, rows: impl IntoIterator<Item = S>) -> Self {
        self.layout = rows.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default click cancellation.
    #[must_use]
    pub fn cancel_on_click(mut self, cancel: bool) -> Self {
        self.cancel_on_click = cancel;
        self
    }

    /// Sets the default close-on-click.
    #[must_use]
    pub fn close_on_click(mut self, close: bool) -> Self {
        self.close_on_click = close;
        self
    }

    /// Sets the default update-on-click.
    #[must_use]
    pub fn update_on_click(mut self, update: bool) -> Self {
        self.update_on_click = update;
        self
    }

    /// Sets the flush round limit.
    #[must_use]
    pub fn max_update_rounds(mut self, rounds: usize) -> Self {
        self.max_update_rounds = rounds;
        self
    }

    /// Checks that the layout covers the view exactly.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(invalid(String::from("a view needs at least one slot")));
        }
        if self.max_update_rounds == 0 {
            return Err(invalid(String::from("max_update_rounds must be positive")));
        }
        if self.layout.is_empty() {
            return Ok(());
        }
        if self.size % ROW_WIDTH != 0 {
            return Err(invalid(format!(
                "a layout needs full rows, but the view has {} slots",
                self.size
            )));
        }
        let rows = self.size / ROW_WIDTH;
        if self.layout.len() != rows {
            return Err(invalid(format!(
                "expected {rows} layout rows, found {}",
                self.layout.len()
            )));
        }
        for (row, line) in self.layout.iter().enumerate() {
            let width = line.chars().count();
            if width != ROW_WIDTH {
                return Err(invalid(format!(
                    "row {row} has {width} characters, expected {ROW_WIDTH}"
                )));
            }
        }
        Ok(())
    }

    /// Layout character of every slot, or `None` without a layout.
    pub(crate) fn layout_chars(&self) -> Option<Vec<char>> {
        if self.layout.is_empty() {
            return None;
        }
        Some(self.layout.iter().flat_map(|row| row.chars()).collect())
    }

    /// Slots marked with `character`, in index order.
    #[must_use]
    pub fn slots_of(&self, character: char) -> Vec<usize> {
        self.layout
            .iter()
            .flat_map(|row| row.chars())
            .enumerate()
            .filter(|&(_, c)| c == character)
            .map(|(slot, _)| slot)
            .collect()
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidLayout { reason }
}
