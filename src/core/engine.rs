//! Payroll calculation engine.
//!
//! Canonical model, used on every path:
//! - `gross_monthly = daily_rate * days_worked`
//! - `operating_expense_amount = gross_monthly * operating_expense_rate / 100`
//! - `management_fee_amount = (gross_monthly - operating_expense_amount) * management_fee_rate / 100`
//! - `negotiated_provision_amount = gross_monthly * negotiated_provision_rate / 100` (CDI only)
//! - `net_monthly = gross_monthly * net_ratio`
//!
//! Every monetary figure is rounded to the cent, midpoint away from zero, and
//! carries exactly two decimal places.

use crate::core::{CalculationRequest, CalculationResult, ContractCharges};
use crate::utils::error::{PortageError, Result};
use crate::utils::validation::{validate_non_negative, validate_range, Validate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Named constants of the calculation. Values differ between payroll
/// workbook revisions, so they are configuration rather than literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Meal voucher amount per worked day.
    pub per_diem_rate: Decimal,
    /// Monthly supplemental insurance contribution.
    pub insurance_flat_amount: Decimal,
    /// Share of gross pay left after statutory deductions.
    pub net_ratio: Decimal,
    pub min_daily_rate: Option<Decimal>,
    pub max_days_worked: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            per_diem_rate: dec!(11.0),
            insurance_flat_amount: dec!(50.0),
            net_ratio: dec!(0.75),
            min_daily_rate: None,
            max_days_worked: None,
        }
    }
}

impl Validate for EngineSettings {
    fn validate(&self) -> Result<()> {
        validate_non_negative("engine.per_diem_rate", self.per_diem_rate)?;
        validate_non_negative("engine.insurance_flat_amount", self.insurance_flat_amount)?;
        if self.net_ratio <= Decimal::ZERO {
            return Err(PortageError::InvalidConfigValueError {
                field: "engine.net_ratio".to_string(),
                value: self.net_ratio.to_string(),
                reason: "Value must be greater than 0".to_string(),
            });
        }
        validate_range("engine.net_ratio", self.net_ratio, Decimal::ZERO, Decimal::ONE)?;
        if let Some(min) = self.min_daily_rate {
            if min <= Decimal::ZERO {
                return Err(PortageError::InvalidConfigValueError {
                    field: "engine.min_daily_rate".to_string(),
                    value: min.to_string(),
                    reason: "Value must be greater than 0".to_string(),
                });
            }
        }
        if self.max_days_worked == Some(0) {
            return Err(PortageError::InvalidConfigValueError {
                field: "engine.max_days_worked".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalculationEngine {
    settings: EngineSettings,
}

impl CalculationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn compute(&self, request: &CalculationRequest) -> Result<CalculationResult> {
        self.check_request(request)?;

        let gross = product(
            "daily_rate",
            request.daily_rate,
            Decimal::from(request.days_worked),
        )?;
        let modifiers = request.contract_type.modifiers();

        let operating_expense = percent_of(
            "operating_expense_rate",
            gross,
            request.operating_expense_rate,
        )?;
        let fee_basis = gross - operating_expense;
        let management_fee =
            percent_of("management_fee_rate", fee_basis, request.management_fee_rate)?;

        let negotiated_provision = if request.contract_type.allows_negotiated_provision() {
            percent_of(
                "negotiated_provision_rate",
                gross,
                request.negotiated_provision_rate,
            )?
        } else {
            if request.negotiated_provision_rate.is_some() {
                tracing::debug!(
                    "Ignoring negotiated provision rate for {} contract",
                    request.contract_type
                );
            }
            Decimal::ZERO
        };

        let meal_voucher = if request.meal_voucher_enabled {
            product(
                "per_diem_rate",
                Decimal::from(request.days_worked),
                self.settings.per_diem_rate,
            )?
        } else {
            Decimal::ZERO
        };

        let insurance = if request.supplemental_insurance_enabled {
            self.settings.insurance_flat_amount
        } else {
            Decimal::ZERO
        };

        let result = CalculationResult {
            daily_rate: request.daily_rate,
            days_worked: request.days_worked,
            contract_type: request.contract_type,
            gross_monthly: money(gross),
            net_monthly: money(product("daily_rate", gross, self.settings.net_ratio)?),
            operating_expense_amount: money(operating_expense),
            management_fee_amount: money(management_fee),
            negotiated_provision_amount: money(negotiated_provision),
            meal_voucher_contribution: money(meal_voucher),
            insurance_contribution: money(insurance),
            contract_charges: ContractCharges {
                end_of_assignment_indemnity: money(product(
                    "daily_rate",
                    gross,
                    modifiers.end_of_assignment_indemnity_rate,
                )?),
                paid_leave: money(product("daily_rate", gross, modifiers.paid_leave_rate)?),
                precarity: money(product("daily_rate", gross, modifiers.precarity_rate)?),
            },
            commune_code: None,
        };

        tracing::debug!(
            daily_rate = %result.daily_rate,
            days_worked = result.days_worked,
            contract = %result.contract_type,
            gross = %result.gross_monthly,
            net = %result.net_monthly,
            "Computed payroll simulation"
        );

        Ok(result)
    }

    fn check_request(&self, request: &CalculationRequest) -> Result<()> {
        if request.daily_rate <= Decimal::ZERO {
            return Err(PortageError::invalid_parameter(
                "daily_rate",
                "must be strictly positive",
            ));
        }
        if request.days_worked == 0 {
            return Err(PortageError::invalid_parameter(
                "days_worked",
                "must be strictly positive",
            ));
        }
        if let Some(min) = self.settings.min_daily_rate {
            if request.daily_rate < min {
                return Err(PortageError::invalid_parameter(
                    "daily_rate",
                    format!("must be at least {}", min),
                ));
            }
        }
        if let Some(max) = self.settings.max_days_worked {
            if request.days_worked > max {
                return Err(PortageError::invalid_parameter(
                    "days_worked",
                    format!("must be between 1 and {}", max),
                ));
            }
        }

        let rates = [
            ("operating_expense_rate", request.operating_expense_rate),
            ("management_fee_rate", request.management_fee_rate),
            ("negotiated_provision_rate", request.negotiated_provision_rate),
        ];
        for (field, rate) in rates {
            if matches!(rate, Some(r) if r < Decimal::ZERO) {
                return Err(PortageError::invalid_parameter(field, "cannot be negative"));
            }
        }
        if matches!(request.operating_expense_rate, Some(r) if r > Decimal::ONE_HUNDRED) {
            return Err(PortageError::invalid_parameter(
                "operating_expense_rate",
                "cannot exceed 100",
            ));
        }
        Ok(())
    }
}

/// Overflow is reported against `field` instead of panicking.
fn product(field: &str, a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| PortageError::invalid_parameter(field, "amount too large"))
}

fn percent_of(field: &str, base: Decimal, rate: Option<Decimal>) -> Result<Decimal> {
    match rate {
        None => Ok(Decimal::ZERO),
        Some(r) => product(field, base, r)?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(|| PortageError::invalid_parameter(field, "amount too large")),
    }
}

fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
