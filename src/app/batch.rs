use crate::core::simulator::PayrollSimulator;
use crate::core::{CalculationRequest, CalculationResult, ContractType, ReferenceRows};
use crate::utils::error::{PortageError, Result};
use crate::utils::validation::parse_flag;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

/// One input line. Fields stay textual so a malformed cell rejects its own
/// row instead of the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub daily_rate: String,
    pub days_worked: String,
    pub contract_type: String,
    #[serde(default)]
    pub operating_expense_rate: Option<String>,
    #[serde(default)]
    pub management_fee_rate: Option<String>,
    #[serde(default)]
    pub negotiated_provision_rate: Option<String>,
    #[serde(default)]
    pub meal_voucher: Option<String>,
    #[serde(default)]
    pub supplemental_insurance: Option<String>,
    #[serde(default)]
    pub commune_code: Option<String>,
}

impl BatchRow {
    pub fn to_request(&self) -> Result<CalculationRequest> {
        let daily_rate = parse_decimal("daily_rate", &self.daily_rate)?;
        let days_worked = self.days_worked.trim().parse::<u32>().map_err(|_| {
            PortageError::invalid_parameter("days_worked", "expected a whole number of days")
        })?;
        let contract_type = ContractType::from_str(&self.contract_type)?;

        Ok(CalculationRequest {
            daily_rate,
            days_worked,
            contract_type,
            operating_expense_rate: parse_optional_decimal(
                "operating_expense_rate",
                self.operating_expense_rate.as_deref(),
            )?,
            management_fee_rate: parse_optional_decimal(
                "management_fee_rate",
                self.management_fee_rate.as_deref(),
            )?,
            negotiated_provision_rate: parse_optional_decimal(
                "negotiated_provision_rate",
                self.negotiated_provision_rate.as_deref(),
            )?,
            meal_voucher_enabled: self.meal_voucher.as_deref().map(parse_flag).unwrap_or(false),
            supplemental_insurance_enabled: self
                .supplemental_insurance
                .as_deref()
                .map(parse_flag)
                .unwrap_or(false),
            commune_code: self.commune_code.clone(),
        })
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|_| PortageError::invalid_parameter(field, "expected a decimal number"))
}

fn parse_optional_decimal(field: &str, value: Option<&str>) -> Result<Option<Decimal>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_decimal(field, v).map(Some),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Ok,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub row: usize,
    pub status: BatchStatus,
    pub reason: Option<String>,
    pub daily_rate: Option<Decimal>,
    pub days_worked: Option<u32>,
    pub contract_type: Option<ContractType>,
    pub gross_monthly: Option<Decimal>,
    pub net_monthly: Option<Decimal>,
    pub management_fee_amount: Option<Decimal>,
    pub negotiated_provision_amount: Option<Decimal>,
    pub meal_voucher_contribution: Option<Decimal>,
    pub insurance_contribution: Option<Decimal>,
    pub commune_code: Option<String>,
}

impl BatchOutcome {
    fn accepted(row: usize, result: CalculationResult) -> Self {
        Self {
            row,
            status: BatchStatus::Ok,
            reason: None,
            daily_rate: Some(result.daily_rate),
            days_worked: Some(result.days_worked),
            contract_type: Some(result.contract_type),
            gross_monthly: Some(result.gross_monthly),
            net_monthly: Some(result.net_monthly),
            management_fee_amount: Some(result.management_fee_amount),
            negotiated_provision_amount: Some(result.negotiated_provision_amount),
            meal_voucher_contribution: Some(result.meal_voucher_contribution),
            insurance_contribution: Some(result.insurance_contribution),
            commune_code: result.commune_code,
        }
    }

    fn rejected(row: usize, error: &PortageError) -> Self {
        Self {
            row,
            status: BatchStatus::Rejected,
            reason: Some(error.user_friendly_message()),
            daily_rate: None,
            days_worked: None,
            contract_type: None,
            gross_monthly: None,
            net_monthly: None,
            management_fee_amount: None,
            negotiated_provision_amount: None,
            meal_voucher_contribution: None,
            insurance_contribution: None,
            commune_code: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == BatchStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub rejected: usize,
}

/// Extract, simulate and write a CSV of requests.
pub struct BatchRunner<'a, R: ReferenceRows> {
    simulator: &'a PayrollSimulator<R>,
}

impl<'a, R: ReferenceRows> BatchRunner<'a, R> {
    pub fn new(simulator: &'a PayrollSimulator<R>) -> Self {
        Self { simulator }
    }

    /// Reads every data line. A line that cannot be decoded into a
    /// [`BatchRow`] is kept as an error so it is rejected on its own;
    /// only an I/O failure aborts extraction.
    pub fn extract(&self, input: impl Read) -> Result<Vec<Result<BatchRow>>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let row = match record {
                Ok(record) => record
                    .deserialize::<BatchRow>(Some(&headers))
                    .map_err(malformed_row),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => Err(malformed_row(e)),
            };
            rows.push(row);
        }
        tracing::debug!("Extracted {} batch rows", rows.len());
        Ok(rows)
    }

    pub fn transform(&self, rows: &[Result<BatchRow>]) -> Vec<BatchOutcome> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let row_number = index + 1;
                let simulated = match row {
                    Ok(row) => row
                        .to_request()
                        .and_then(|request| self.simulator.simulate(&request)),
                    Err(e) => {
                        tracing::warn!("Row {} rejected: {}", row_number, e);
                        return BatchOutcome::rejected(row_number, e);
                    }
                };
                match simulated {
                    Ok(result) => BatchOutcome::accepted(row_number, result),
                    Err(e) => {
                        tracing::warn!("Row {} rejected: {}", row_number, e);
                        BatchOutcome::rejected(row_number, &e)
                    }
                }
            })
            .collect()
    }

    pub fn load(&self, outcomes: &[BatchOutcome], output: impl Write) -> Result<BatchSummary> {
        let mut writer = csv::Writer::from_writer(output);
        for outcome in outcomes {
            writer.serialize(outcome)?;
        }
        writer.flush()?;

        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        Ok(BatchSummary {
            total: outcomes.len(),
            succeeded,
            rejected: outcomes.len() - succeeded,
        })
    }

    pub fn run(&self, input: impl Read, output: impl Write) -> Result<BatchSummary> {
        let rows = self.extract(input)?;
        let outcomes = self.transform(&rows);
        let summary = self.load(&outcomes, output)?;
        tracing::info!(
            "Batch finished: {} rows, {} ok, {} rejected",
            summary.total,
            summary.succeeded,
            summary.rejected
        );
        Ok(summary)
    }
}

fn malformed_row(error: csv::Error) -> PortageError {
    tracing::debug!("Undecodable batch line: {}", error);
    PortageError::invalid_parameter("row", "missing or malformed columns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRows;
    use crate::core::engine::CalculationEngine;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_to_request() {
        let row = BatchRow {
            daily_rate: " 500 ".to_string(),
            days_worked: "18".to_string(),
            contract_type: "CDI".to_string(),
            operating_expense_rate: Some("".to_string()),
            management_fee_rate: Some("8".to_string()),
            negotiated_provision_rate: None,
            meal_voucher: Some("yes".to_string()),
            supplemental_insurance: Some("Non".to_string()),
            commune_code: None,
        };

        let request = row.to_request().unwrap();
        assert_eq!(request.daily_rate, dec!(500));
        assert_eq!(request.operating_expense_rate, None);
        assert_eq!(request.management_fee_rate, Some(dec!(8)));
        assert!(request.meal_voucher_enabled);
        assert!(!request.supplemental_insurance_enabled);
    }

    #[test]
    fn test_malformed_row_is_rejected_alone() {
        let simulator = PayrollSimulator::new(
            CalculationEngine::default(),
            InMemoryRows::with_header("communes", "code", ["75001"]),
        );
        let runner = BatchRunner::new(&simulator);
        let input = "daily_rate,days_worked,contract_type\nabc,18,CDI\n500,18,CDD\n";

        let rows = runner.extract(input.as_bytes()).unwrap();
        let outcomes = runner.transform(&rows);

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert_eq!(outcomes[1].gross_monthly, Some(dec!(9000)));
    }

    #[test]
    fn test_short_line_does_not_abort_batch() {
        let simulator = PayrollSimulator::new(
            CalculationEngine::default(),
            InMemoryRows::with_header("communes", "code", ["75001"]),
        );
        let runner = BatchRunner::new(&simulator);
        let input = "daily_rate,days_worked,contract_type\n500,18,CDI\n600,20\n700,10,CDD\n";

        let rows = runner.extract(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        let outcomes = runner.transform(&rows);

        assert_eq!(outcomes[0].status, BatchStatus::Ok);
        assert_eq!(outcomes[1].status, BatchStatus::Rejected);
        assert_eq!(
            outcomes[1].reason.as_deref(),
            Some("Invalid value for row: missing or malformed columns")
        );
        assert_eq!(outcomes[2].status, BatchStatus::Ok);
        assert_eq!(outcomes[2].gross_monthly, Some(dec!(7000)));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BatchStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&BatchStatus::Rejected).unwrap(),
            "\"rejected\""
        );
    }
}
