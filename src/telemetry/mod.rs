pub mod layout;
pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests {
    use super::layout::STATUS_COMPLETED;
    use super::reader::TelemetryReader;
    use super::writer::TelemetryWriter;
    use crate::simulation::result::EquityResult;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    fn job_id(tag: &str) -> String {
        // unique per test process so parallel runs never collide
        format!("test_{}_{}", tag, std::process::id())
    }

    #[test]
    fn writer_is_exclusive() {
        let id = job_id("excl");
        let writer = TelemetryWriter::create(&id).unwrap();
        assert!(TelemetryWriter::create(&id).is_err());
        TelemetryReader::open(&id).unwrap().unlink();
        drop(writer);
    }

    #[test]
    fn header_round_trips() {
        let id = job_id("header");
        let writer = TelemetryWriter::create(&id).unwrap();
        let reader = TelemetryReader::open(&id).unwrap();

        writer.update_hands(42);
        let snapshot = reader.header().unwrap();
        assert_eq!(snapshot.hands_processed, 42);
        assert_eq!(snapshot.status, 0);
        assert!(snapshot.job_start_ns > 0);

        writer.set_status(STATUS_COMPLETED);
        assert_eq!(reader.header().unwrap().status, STATUS_COMPLETED);
        reader.unlink();
    }

    #[test]
    fn results_round_trip_byte_identical() {
        let id = job_id("results");
        let writer = TelemetryWriter::create(&id).unwrap();
        let reader = TelemetryReader::open(&id).unwrap();

        let mut results = BTreeMap::new();
        for (i, name) in ["AA", "AKs", "72o"].iter().enumerate() {
            let mut result = EquityResult::named(name);
            result.wins = 10 * (i as u32 + 1);
            result.ties = 3;
            result.losses = 7;
            result.simulations = result.wins + result.ties + result.losses;
            result.win_method_matrix[1][2] = result.wins;
            result.loss_method_matrix[4][0] = result.losses;
            result.refresh();
            results.insert(name.to_string(), result);
        }
        writer.update_results(&results);

        let rows = reader.results().unwrap();
        assert_eq!(rows.len(), 3);
        for (name, record) in rows {
            let expected = &results[&name];
            assert_eq!(record.wins, expected.wins);
            assert_eq!(record.ties, expected.ties);
            assert_eq!(record.losses, expected.losses);
            assert_eq!(record.simulations, expected.simulations);
            assert_eq!(record.win_method_matrix, expected.win_method_matrix);
            assert_eq!(record.loss_method_matrix, expected.loss_method_matrix);
            assert!((record.equity - expected.equity).abs() < f64::EPSILON);
        }
        reader.unlink();
    }

    #[test]
    fn reads_are_torn_free_under_writer_traffic() {
        let id = job_id("torn");
        let writer = TelemetryWriter::create(&id).unwrap();
        let reader = TelemetryReader::open(&id).unwrap();
        let stop = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut count = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    count += 1;
                    writer.update_hands(count);
                }
            });

            let mut last = 0u64;
            for _ in 0..1_000_000 {
                let snapshot = reader.header().unwrap();
                assert!(
                    snapshot.hands_processed >= last,
                    "hands_processed went backwards"
                );
                last = snapshot.hands_processed;
            }
            stop.store(true, Ordering::Relaxed);
        });
        reader.unlink();
    }
}
