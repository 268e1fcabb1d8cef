use crate::utils::error::{PortageError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    /// CDI
    #[serde(rename = "CDI", alias = "INDEFINITE")]
    Indefinite,
    /// CDD
    #[serde(rename = "CDD", alias = "FIXED_TERM")]
    FixedTerm,
}

/// Statutory rates attached to a contract type, as fractions of gross pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractModifiers {
    pub end_of_assignment_indemnity_rate: Decimal,
    pub paid_leave_rate: Decimal,
    pub precarity_rate: Decimal,
}

impl ContractType {
    pub fn modifiers(self) -> ContractModifiers {
        match self {
            ContractType::Indefinite => ContractModifiers {
                end_of_assignment_indemnity_rate: dec!(0.02),
                paid_leave_rate: dec!(0.10),
                precarity_rate: Decimal::ZERO,
            },
            ContractType::FixedTerm => ContractModifiers {
                end_of_assignment_indemnity_rate: Decimal::ZERO,
                paid_leave_rate: Decimal::ZERO,
                precarity_rate: dec!(0.10),
            },
        }
    }

    pub fn allows_negotiated_provision(self) -> bool {
        matches!(self, ContractType::Indefinite)
    }

    pub fn code(self) -> &'static str {
        match self {
            ContractType::Indefinite => "CDI",
            ContractType::FixedTerm => "CDD",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ContractType {
    type Err = PortageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CDI" | "INDEFINITE" => Ok(ContractType::Indefinite),
            "CDD" | "FIXED_TERM" => Ok(ContractType::FixedTerm),
            other => Err(PortageError::invalid_parameter(
                "contract_type",
                format!("unrecognized contract type '{}', expected CDI or CDD", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub daily_rate: Decimal,
    pub days_worked: u32,
    pub contract_type: ContractType,
    /// Percentage points.
    #[serde(default)]
    pub operating_expense_rate: Option<Decimal>,
    /// Percentage points.
    #[serde(default)]
    pub management_fee_rate: Option<Decimal>,
    /// Percentage points, CDI only.
    #[serde(default)]
    pub negotiated_provision_rate: Option<Decimal>,
    #[serde(default)]
    pub meal_voucher_enabled: bool,
    #[serde(default)]
    pub supplemental_insurance_enabled: bool,
    #[serde(default)]
    pub commune_code: Option<String>,
}

impl CalculationRequest {
    pub fn new(daily_rate: Decimal, days_worked: u32, contract_type: ContractType) -> Self {
        Self {
            daily_rate,
            days_worked,
            contract_type,
            operating_expense_rate: None,
            management_fee_rate: None,
            negotiated_provision_rate: None,
            meal_voucher_enabled: false,
            supplemental_insurance_enabled: false,
            commune_code: None,
        }
    }

    pub fn with_operating_expense_rate(mut self, rate: Decimal) -> Self {
        self.operating_expense_rate = Some(rate);
        self
    }

    pub fn with_management_fee_rate(mut self, rate: Decimal) -> Self {
        self.management_fee_rate = Some(rate);
        self
    }

    pub fn with_negotiated_provision_rate(mut self, rate: Decimal) -> Self {
        self.negotiated_provision_rate = Some(rate);
        self
    }

    pub fn with_meal_vouchers(mut self, enabled: bool) -> Self {
        self.meal_voucher_enabled = enabled;
        self
    }

    pub fn with_supplemental_insurance(mut self, enabled: bool) -> Self {
        self.supplemental_insurance_enabled = enabled;
        self
    }

    pub fn with_commune_code(mut self, code: impl Into<String>) -> Self {
        self.commune_code = Some(code.into());
        self
    }

    /// The commune code trimmed, or `None` when absent or blank.
    pub fn commune_code(&self) -> Option<&str> {
        self.commune_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCharges {
    pub end_of_assignment_indemnity: Decimal,
    pub paid_leave: Decimal,
    pub precarity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub daily_rate: Decimal,
    pub days_worked: u32,
    pub contract_type: ContractType,
    pub gross_monthly: Decimal,
    pub net_monthly: Decimal,
    pub operating_expense_amount: Decimal,
    pub management_fee_amount: Decimal,
    pub negotiated_provision_amount: Decimal,
    pub meal_voucher_contribution: Decimal,
    pub insurance_contribution: Decimal,
    pub contract_charges: ContractCharges,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune_code: Option<String>,
}
