use std::collections::HashMap;

use canopy::application::render::{
    METRIC_RENDER_ELEMENTS_TOTAL, METRIC_RENDER_FAILURES_TOTAL, METRIC_RENDER_MS,
    METRIC_RENDER_TOTAL,
};
use canopy::{Component, Node, RenderConfig, RenderMetrics, Renderer, element};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;

fn page() -> Node {
    Node::from(json!({ "ul": [{ "li": "a" }, { "li": "b" }, "tail"] }))
}

#[test]
fn metrics_start_empty_and_track_the_latest_pass() {
    let renderer = Renderer::new(RenderConfig::default());
    assert_eq!(renderer.metrics(), Some(RenderMetrics::default()));

    renderer.render(&page()).expect("render");
    let metrics = renderer.metrics().expect("monitoring enabled");
    assert!(metrics.start_time.is_some());
    assert!(metrics.end_time >= metrics.start_time);
    // ul, two li and the trailing text node
    assert_eq!(metrics.elements_processed, 4);
    assert!(metrics.duration().is_some());

    renderer.render(&Node::from("just text")).expect("render");
    assert_eq!(renderer.metrics().map(|m| m.elements_processed), Some(1));
}

#[test]
fn disabled_monitoring_reports_nothing() {
    let renderer = Renderer::new(RenderConfig {
        enable_monitoring: false,
        ..RenderConfig::default()
    });
    renderer.render(&page()).expect("render");
    assert_eq!(renderer.metrics(), None);
}

#[test]
fn failed_passes_still_close_the_metrics() {
    let renderer = Renderer::new(RenderConfig::default());
    let broken = Component::fallible(|_| Err("boom".into()));
    let node = element("div").child(element("p").text("x")).child(broken).build();

    assert!(renderer.render(&node).is_err());
    let metrics = renderer.metrics().expect("monitoring enabled");
    assert!(metrics.is_finished());
    assert_eq!(metrics.elements_processed, 1);
}

#[test]
fn streamed_pass_finishes_when_drained() {
    let renderer = Renderer::new(RenderConfig::default());
    let mut stream = renderer.render_stream(page());

    let running = renderer.metrics().expect("monitoring enabled");
    assert!(running.start_time.is_some());
    assert!(!running.is_finished());

    let html: String = stream.by_ref().collect::<Result<_, _>>().expect("stream");
    assert_eq!(html, "<ul><li>a</li><li>b</li>tail</ul>");

    let done = renderer.metrics().expect("monitoring enabled");
    assert!(done.is_finished());
    assert_eq!(done.elements_processed, 4);
}

#[test]
fn older_pass_finishing_does_not_close_the_newer_one() {
    let renderer = Renderer::new(RenderConfig {
        yield_threshold: std::num::NonZeroUsize::new(1).expect("non-zero"),
        ..RenderConfig::default()
    });
    let short = renderer.render_stream(page());
    let mut long = renderer.render_stream(
        element("ul")
            .children((0..10).map(|i| element("li").text(i)))
            .build(),
    );

    // The first chunk of the longer pass holds `<ul>` and one `<li>`.
    assert!(long.next().is_some());
    let html: String = short.collect::<Result<_, _>>().expect("short stream");
    assert_eq!(html, "<ul><li>a</li><li>b</li>tail</ul>");

    let running = renderer.metrics().expect("monitoring enabled");
    assert!(!running.is_finished());
    assert_eq!(running.elements_processed, 1);

    let rest: Result<Vec<_>, _> = long.collect();
    rest.expect("long stream");
    let done = renderer.metrics().expect("monitoring enabled");
    assert!(done.is_finished());
    assert_eq!(done.elements_processed, 11);
}

#[test]
fn passes_emit_labelled_metric_series() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let renderer = Renderer::new(RenderConfig::default());
        renderer.render(&page()).expect("render");
        let streamed: Result<Vec<_>, _> = renderer.render_stream(page()).collect();
        streamed.expect("stream");
        let broken = Node::from(Component::fallible(|_| Err("boom".into())));
        assert!(renderer.render(&broken).is_err());
    });

    let mut counters: HashMap<(String, Vec<(String, String)>), u64> = HashMap::new();
    let mut histograms = 0;
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = composite_key.key();
        let mut labels: Vec<(String, String)> = key
            .labels()
            .map(|label| (label.key().to_string(), label.value().to_string()))
            .collect();
        labels.sort();
        match value {
            DebugValue::Counter(count) => {
                counters.insert((key.name().to_string(), labels), count);
            }
            DebugValue::Histogram(samples) if key.name() == METRIC_RENDER_MS => {
                histograms += samples.len();
            }
            _ => {}
        }
    }

    let mode = |value: &str| vec![("mode".to_string(), value.to_string())];
    assert_eq!(counters.get(&(METRIC_RENDER_TOTAL.to_string(), mode("full"))), Some(&2));
    assert_eq!(counters.get(&(METRIC_RENDER_TOTAL.to_string(), mode("stream"))), Some(&1));
    assert_eq!(
        counters.get(&(METRIC_RENDER_ELEMENTS_TOTAL.to_string(), mode("stream"))),
        Some(&4)
    );
    let failure_labels = vec![
        ("kind".to_string(), "component".to_string()),
        ("mode".to_string(), "full".to_string()),
    ];
    assert_eq!(
        counters.get(&(METRIC_RENDER_FAILURES_TOTAL.to_string(), failure_labels)),
        Some(&1)
    );
    assert_eq!(histograms, 3);
}
