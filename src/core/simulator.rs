use crate::core::commune_cache::CommuneCodeCache;
use crate::core::engine::CalculationEngine;
use crate::core::{CalculationRequest, CalculationResult};
use crate::domain::ports::ReferenceRows;
use crate::utils::error::{PortageError, Result};
use std::sync::Arc;

/// Request path: engine first, then commune validation when a code is given.
///
/// An unreadable reference dataset rejects the request with
/// [`PortageError::ReferenceDataUnavailable`]; it is never treated as a pass.
pub struct PayrollSimulator<R: ReferenceRows> {
    engine: CalculationEngine,
    communes: Arc<CommuneCodeCache>,
    reference: R,
}

impl<R: ReferenceRows> PayrollSimulator<R> {
    pub fn new(engine: CalculationEngine, reference: R) -> Self {
        Self::with_cache(engine, Arc::new(CommuneCodeCache::new()), reference)
    }

    /// Shares an existing cache, e.g. one preloaded at startup.
    pub fn with_cache(engine: CalculationEngine, communes: Arc<CommuneCodeCache>, reference: R) -> Self {
        Self {
            engine,
            communes,
            reference,
        }
    }

    pub fn engine(&self) -> &CalculationEngine {
        &self.engine
    }

    pub fn communes(&self) -> &Arc<CommuneCodeCache> {
        &self.communes
    }

    pub fn reference(&self) -> &R {
        &self.reference
    }

    pub fn preload(&self) -> Result<usize> {
        self.communes.preload(&self.reference)
    }

    pub fn check_commune(&self, code: &str) -> Result<bool> {
        self.communes.lookup(code, &self.reference)
    }

    pub fn simulate(&self, request: &CalculationRequest) -> Result<CalculationResult> {
        let mut result = self.engine.compute(request)?;

        if let Some(code) = request.commune_code() {
            if !self.check_commune(code)? {
                return Err(PortageError::UnknownCommuneCode {
                    code: code.to_string(),
                });
            }
            result.commune_code = Some(code.to_string());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRows;
    use crate::core::ContractType;
    use crate::domain::ports::RawCell;
    use rust_decimal_macros::dec;

    struct BrokenSource;

    impl ReferenceRows for BrokenSource {
        fn source_id(&self) -> &str {
            "broken"
        }

        fn read_rows(&self) -> Result<Vec<RawCell>> {
            Err(PortageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "sheet not found",
            )))
        }
    }

    fn paris_simulator() -> PayrollSimulator<InMemoryRows> {
        PayrollSimulator::new(
            CalculationEngine::default(),
            InMemoryRows::with_header("communes", "code", ["75001", "75002"]),
        )
    }

    #[test]
    fn test_known_commune_is_echoed() {
        let simulator = paris_simulator();
        let request = CalculationRequest::new(dec!(500), 18, ContractType::Indefinite)
            .with_commune_code(" 75001 ");

        let result = simulator.simulate(&request).unwrap();

        assert_eq!(result.commune_code.as_deref(), Some("75001"));
        assert_eq!(result.gross_monthly, dec!(9000));
    }

    #[test]
    fn test_unknown_commune_is_rejected() {
        let simulator = paris_simulator();
        let request = CalculationRequest::new(dec!(500), 18, ContractType::Indefinite)
            .with_commune_code("99999");

        assert!(matches!(
            simulator.simulate(&request),
            Err(PortageError::UnknownCommuneCode { code }) if code == "99999"
        ));
    }

    #[test]
    fn test_invalid_parameters_win_over_commune_check() {
        let simulator = PayrollSimulator::new(CalculationEngine::default(), BrokenSource);
        let request = CalculationRequest::new(dec!(0), 18, ContractType::Indefinite)
            .with_commune_code("75001");

        assert!(matches!(
            simulator.simulate(&request),
            Err(PortageError::InvalidParameter { .. })
        ));
        assert_eq!(simulator.communes().load_passes(), 0);
    }

    #[test]
    fn test_unavailable_reference_rejects_request() {
        let simulator = PayrollSimulator::new(CalculationEngine::default(), BrokenSource);
        let request = CalculationRequest::new(dec!(500), 18, ContractType::FixedTerm)
            .with_commune_code("75001");

        assert!(matches!(
            simulator.simulate(&request),
            Err(PortageError::ReferenceDataUnavailable { source_id, .. }) if source_id == "broken"
        ));
        assert!(!simulator.communes().is_populated());
    }

    #[test]
    fn test_no_commune_skips_reference() {
        let simulator = PayrollSimulator::new(CalculationEngine::default(), BrokenSource);
        let request = CalculationRequest::new(dec!(500), 18, ContractType::FixedTerm);

        assert!(simulator.simulate(&request).is_ok());
        assert_eq!(simulator.communes().load_passes(), 0);
    }
}
