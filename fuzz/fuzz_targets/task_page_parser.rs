#![no_main]

use libfuzzer_sys::fuzz_target;
use queuestat::concurrency::analyze_concurrency;
use queuestat::loader::TaskCorpus;
use queuestat::normalize::{normalize_tasks, parse_raw_tasks};
use queuestat::task_record::TaskPage;

fuzz_target!(|data: &[u8]| {
    // Arbitrary page files must either be rejected or analyzed, never panic
    let Ok(page) = serde_json::from_slice::<TaskPage>(data) else {
        return;
    };
    let corpus = TaskCorpus::from_pages(vec![page]);
    let Ok(raws) = parse_raw_tasks(&corpus.tasks) else {
        return;
    };
    if let Ok(normalized) = normalize_tasks(&raws) {
        let _ = analyze_concurrency(&normalized.records, 4);
    }
});
