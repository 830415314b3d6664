use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GuardError;

/// The screen a template is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    List,
    FormCreate,
    FormEdit,
    FormView,
}

/// Field access applied when a role has no stored permission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPolicy {
    pub visible: bool,
    pub editable: bool,
}

impl ViewType {
    pub const ALL: [ViewType; 4] = [
        ViewType::List,
        ViewType::FormCreate,
        ViewType::FormEdit,
        ViewType::FormView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::List => "list",
            ViewType::FormCreate => "form_create",
            ViewType::FormEdit => "form_edit",
            ViewType::FormView => "form_view",
        }
    }

    /// The one place the fallback access rules live.
    pub const fn defaults(&self) -> DefaultPolicy {
        match self {
            ViewType::List => DefaultPolicy {
                visible: true,
                editable: false,
            },
            ViewType::FormCreate | ViewType::FormEdit => DefaultPolicy {
                visible: true,
                editable: true,
            },
            ViewType::FormView => DefaultPolicy {
                visible: true,
                editable: false,
            },
        }
    }

    /// View mode never allows editing, whatever is stored.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ViewType::FormView)
    }

    pub fn is_form(&self) -> bool {
        !matches!(self, ViewType::List)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewType {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewType::ALL
            .into_iter()
            .find(|view| view.as_str() == s)
            .ok_or_else(|| GuardError::UnknownViewType {
                value: s.to_string(),
            })
    }
}
