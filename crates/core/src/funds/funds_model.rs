use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Fund identity record. Created lazily the first time a code is referenced
/// and immutable afterwards except for a name backfill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub fund_code: String,
    pub fund_name: String,
    pub fund_type: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFund {
    pub fund_code: String,
    pub fund_name: String,
    pub fund_type: String,
}

impl NewFund {
    pub fn validate(&self) -> Result<()> {
        if self.fund_code.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Fund code cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// Outcome of a fund lookup-or-register, tagged with whether the row already
/// existed so callers can distinguish a first reference from a repeat one.
#[derive(Debug, Clone, PartialEq)]
pub enum FundLookup {
    Created(Fund),
    Existing(Fund),
}

impl FundLookup {
    pub fn fund(&self) -> &Fund {
        match self {
            FundLookup::Created(fund) | FundLookup::Existing(fund) => fund,
        }
    }

    pub fn into_fund(self) -> Fund {
        match self {
            FundLookup::Created(fund) | FundLookup::Existing(fund) => fund,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, FundLookup::Created(_))
    }
}
