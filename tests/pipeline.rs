use std::time::Duration;

use bounded_stream::{
    BufferConfig, InputSource, OverflowPolicy, Pipeline, PipelineConfig, UnderflowPolicy,
};

fn displayed_values(out: &str) -> Vec<i64> {
    out.split('\r')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().unwrap())
        .collect()
}

#[test]
fn three_stages_double_every_value() {
    let config = PipelineConfig {
        buffer: BufferConfig::new(16).with_wait_timeout(Duration::from_millis(4)),
        input: InputSource::Counter(200),
        stage_delay: Duration::from_millis(1),
    };
    let mut out = String::new();
    let report = Pipeline::run(&config, &mut out).unwrap();

    assert_eq!(report.produced, 200);
    let values = displayed_values(&out);
    assert_eq!(values.len() as u64, report.displayed);
    assert!(values.iter().all(|v| v % 2 == 0 && (0..400).contains(v)));
    // stale repeats may show up, going backwards may not
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn reject_policies_run_to_completion() {
    let config = PipelineConfig {
        buffer: BufferConfig::new(2)
            .with_wait_timeout(Duration::from_millis(1))
            .with_overflow(OverflowPolicy::Reject)
            .with_underflow(UnderflowPolicy::Reject),
        input: InputSource::Counter(200),
        stage_delay: Duration::ZERO,
    };
    let mut out = String::new();
    let report = Pipeline::run(&config, &mut out).unwrap();

    // a full ring drops frames, it never ends the run
    assert_eq!(report.produced + report.input_rejected, 200);
    assert_eq!(report.input_evictions, 0);
    assert_eq!(report.output_evictions, 0);
    assert_eq!(report.input_stale_reads, 0);
    assert_eq!(report.output_stale_reads, 0);
    let values = displayed_values(&out);
    assert_eq!(values.len() as u64, report.displayed);
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}
