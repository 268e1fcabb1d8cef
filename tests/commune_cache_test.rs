use anyhow::Result;
use portage_sim::{
    CalculationEngine, CalculationRequest, CommuneCodeCache, ContractType, CsvReferenceSource,
    InMemoryRows, PayrollSimulator, PortageError, RawCell, ReferenceRows,
};
use rust_decimal_macros::dec;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Counts reads and sleeps to widen the race window.
struct SlowSource {
    reads: AtomicUsize,
    codes: Vec<&'static str>,
}

impl ReferenceRows for SlowSource {
    fn source_id(&self) -> &str {
        "slow"
    }

    fn read_rows(&self) -> portage_sim::Result<Vec<RawCell>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        let mut rows = vec![RawCell::from("code_commune")];
        rows.extend(self.codes.iter().map(|c| RawCell::from(*c)));
        Ok(rows)
    }
}

/// Fails until `available` is flipped.
struct FlakySource {
    available: AtomicBool,
}

impl ReferenceRows for FlakySource {
    fn source_id(&self) -> &str {
        "flaky"
    }

    fn read_rows(&self) -> portage_sim::Result<Vec<RawCell>> {
        if self.available.load(Ordering::SeqCst) {
            Ok(vec![RawCell::from("code"), RawCell::from("75001")])
        } else {
            Err(PortageError::ReferenceDataUnavailable {
                source_id: "flaky".to_string(),
                reason: "workbook locked".to_string(),
            })
        }
    }
}

#[test]
fn test_concurrent_first_lookups_populate_once() {
    let cache = Arc::new(CommuneCodeCache::new());
    let source = Arc::new(SlowSource {
        reads: AtomicUsize::new(0),
        codes: vec!["75001", "75002", "69123", "13055"],
    });
    let callers = 16;
    let barrier = Arc::new(Barrier::new(callers));

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let cache = cache.clone();
            let source = source.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                let found = cache.is_valid_code("069123", &source);
                (found, cache.len())
            })
        })
        .collect();

    for handle in handles {
        let (found, len) = handle.join().unwrap();
        assert!(found);
        assert_eq!(len, 4);
    }
    assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.load_passes(), 1);
}

#[test]
fn test_unavailable_source_reads_as_not_found_then_recovers() {
    let cache = CommuneCodeCache::new();
    let source = FlakySource {
        available: AtomicBool::new(false),
    };

    assert!(!cache.is_valid_code("75001", &source));
    assert!(matches!(
        cache.lookup("75001", &source),
        Err(PortageError::ReferenceDataUnavailable { .. })
    ));
    assert!(!cache.is_populated());

    source.available.store(true, Ordering::SeqCst);
    assert!(cache.is_valid_code("75001", &source));
    assert_eq!(cache.load_passes(), 3);
}

#[test]
fn test_registry_is_never_refreshed() {
    let cache = CommuneCodeCache::new();
    let first = InMemoryRows::with_header("communes", "code", ["75001"]);
    let updated = InMemoryRows::with_header("communes", "code", ["75001", "75002"]);

    assert_eq!(cache.preload(&first).unwrap(), 1);
    assert_eq!(cache.preload(&updated).unwrap(), 1);
    assert!(!cache.is_valid_code("75002", &updated));
}

#[test]
fn test_csv_backed_simulation() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "code_commune,libelle,taux")?;
    writeln!(file, "75056.0,Paris,0.5")?;
    writeln!(file, "1004.0,Ambérieu-en-Bugey,0.2")?;
    writeln!(file, "75001,Paris 1er,0.5")?;

    let simulator = PayrollSimulator::new(
        CalculationEngine::default(),
        CsvReferenceSource::new("tauxTransport.20240102", file.path(), 0),
    );
    assert_eq!(simulator.preload()?, 3);

    let request = CalculationRequest::new(dec!(500), 18, ContractType::Indefinite)
        .with_meal_vouchers(true)
        .with_commune_code("01004");
    let result = simulator.simulate(&request)?;
    assert_eq!(result.commune_code.as_deref(), Some("01004"));
    assert_eq!(result.gross_monthly, dec!(9000));

    let unknown = request.clone().with_commune_code("99999");
    let err = simulator.simulate(&unknown).unwrap_err();
    assert!(matches!(err, PortageError::UnknownCommuneCode { .. }));
    assert_eq!(
        err.user_friendly_message(),
        "The commune code is not in the reference database"
    );
    Ok(())
}

#[test]
fn test_missing_reference_file_rejects_commune_requests() {
    let simulator = PayrollSimulator::new(
        CalculationEngine::default(),
        CsvReferenceSource::new("tauxTransport", "/nonexistent/taux.csv", 0),
    );
    let request = CalculationRequest::new(dec!(500), 18, ContractType::Indefinite)
        .with_commune_code("75001");

    let err = simulator.simulate(&request).unwrap_err();

    assert!(matches!(err, PortageError::ReferenceDataUnavailable { .. }));
    assert!(!err.user_friendly_message().contains("nonexistent"));
}

#[test]
fn test_shared_cache_between_simulators() -> Result<()> {
    let cache = Arc::new(CommuneCodeCache::new());
    let source = InMemoryRows::with_header("communes", "code", ["75001", "75002"]);
    let a = PayrollSimulator::with_cache(CalculationEngine::default(), cache.clone(), source.clone());
    let b = PayrollSimulator::with_cache(CalculationEngine::default(), cache.clone(), source);

    a.preload()?;
    assert!(b.check_commune("75002")?);
    assert_eq!(cache.load_passes(), 1);
    Ok(())
}
