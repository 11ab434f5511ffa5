//! Modal dialog model.
//!
//! A [`Dialog`] offers a small fixed set of choices. Only one dialog may be
//! presented at a time; [`DialogSlot`] is the read side of that invariant,
//! consulted by the proximity engine before it fires a handler.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::config::CoreConfig;

const MAX_CHOICES: usize = CoreConfig::MAX_DIALOG_CHOICES;

/// Reports whether a modal dialog is currently presented.
pub trait DialogSlot {
    fn is_open(&self) -> bool;
}

impl DialogSlot for bool {
    fn is_open(&self) -> bool {
        *self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DialogChoice {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("dialog {id} cannot offer more than {max} choices")]
    TooManyChoices { id: String, max: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dialog {
    pub id: String,
    pub title: String,
    pub body: String,
    pub choices: ArrayVec<DialogChoice, MAX_CHOICES>,
}

impl Dialog {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            choices: ArrayVec::new(),
        }
    }

    /// Appends a choice, failing once the choice list is full.
    pub fn with_choice(
        mut self,
        key: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, DialogError> {
        let choice = DialogChoice {
            key: key.into(),
            label: label.into(),
        };
        if self.choices.try_push(choice).is_err() {
            return Err(DialogError::TooManyChoices {
                id: self.id,
                max: MAX_CHOICES,
            });
        }
        Ok(self)
    }

    pub fn choice(&self, index: usize) -> Option<&DialogChoice> {
        self.choices.get(index)
    }
}

/// How a presented dialog ended.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DialogOutcome {
    Chosen { index: usize, key: String },
    Dismissed,
}
