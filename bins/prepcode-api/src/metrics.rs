// Prometheus collectors shared by the engine client, grader and handlers

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref ENGINE_EXECUTIONS: IntCounterVec = register_int_counter_vec!(
        "prepcode_engine_executions_total",
        "Engine round-trips by language and classified outcome",
        &["language", "outcome"]
    )
    .expect("engine execution counter registers once");

    pub static ref ENGINE_LATENCY: HistogramVec = register_histogram_vec!(
        "prepcode_engine_latency_seconds",
        "Engine round-trip latency",
        &["language"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("engine latency histogram registers once");

    pub static ref GRADING_RUNS: IntCounterVec = register_int_counter_vec!(
        "prepcode_grading_runs_total",
        "Grading runs by mode (test, submit) and result",
        &["mode", "result"]
    )
    .expect("grading run counter registers once");

    pub static ref QUESTIONS_SOLVED: IntCounterVec = register_int_counter_vec!(
        "prepcode_questions_solved_total",
        "Questions newly recorded as solved, by difficulty",
        &["difficulty"]
    )
    .expect("solved counter registers once");
}

/// Render the default registry in the text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_touched_collectors() {
        GRADING_RUNS.with_label_values(&["test", "passed"]).inc();
        let text = render().unwrap();
        assert!(text.contains("prepcode_grading_runs_total"));
    }
}
