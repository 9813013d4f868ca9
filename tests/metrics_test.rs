use cas_exporter::casadm::Cache;
use cas_exporter::metrics::{Category, MetricsCollector, PointKind};
use std::time::Duration;

fn cache(id: u16, device: &str) -> Cache {
    Cache::new(id, device)
}

#[test]
fn test_metrics_registration() {
    // Verify that all metrics can be created and registered without panicking
    let metrics: cas_exporter::error::Result<MetricsCollector> = MetricsCollector::new();
    let metrics = metrics.expect("Failed to create metrics collector");

    let output = metrics.render().expect("Failed to render metrics");

    // Scalar metrics always appear; the vectors only once they have values
    assert!(output.contains("ocf_success"), "Missing ocf_success metric");
    assert!(
        output.contains("ocf_duration_seconds"),
        "Missing duration metric"
    );
    assert!(
        output.contains("ocf_exporter_build_info"),
        "Missing build info metric"
    );
    assert!(!output.contains("ocf_count{"));
}

#[test]
fn test_observe_count_and_percent_render_with_labels() {
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");

    metrics.observe_count(&sda, Category::Usage, "occupancy", 100.0);
    metrics.observe_percent(&sda, Category::Usage, "occupancy", 42.5);

    let rendered = metrics.render().unwrap();
    assert!(rendered.contains(
        "ocf_count{category=\"usage\",device=\"/dev/sda\",id=\"1\",subcategory=\"occupancy\"} 100"
    ));
    assert!(rendered.contains(
        "ocf_percentage{category=\"usage\",device=\"/dev/sda\",id=\"1\",subcategory=\"occupancy\"} 42.5"
    ));
}

#[test]
fn test_last_observation_wins() {
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");

    metrics.observe_count(&sda, Category::Requests, "rd_hits", 10.0);
    metrics.observe_count(&sda, Category::Requests, "rd_hits", 7.0);

    assert_eq!(
        metrics.value(PointKind::Count, 1, Category::Requests, "rd_hits"),
        Some(7.0)
    );
    assert_eq!(metrics.points().len(), 1);
}

#[test]
fn test_count_and_percent_are_independent() {
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");

    metrics.observe_count(&sda, Category::Errors, "total", 3.0);

    assert_eq!(
        metrics.value(PointKind::Count, 1, Category::Errors, "total"),
        Some(3.0)
    );
    assert_eq!(
        metrics.value(PointKind::Percentage, 1, Category::Errors, "total"),
        None
    );
}

#[test]
fn test_unknown_subcategory_is_ignored() {
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");

    // "rd_hits" belongs to requests, not usage
    metrics.observe_count(&sda, Category::Usage, "rd_hits", 1.0);
    metrics.observe_percent(&sda, Category::Blocks, "bogus", 1.0);

    assert!(metrics.points().is_empty());
    assert!(!metrics.render().unwrap().contains("ocf_count{"));
}

#[test]
fn test_points_enumerates_every_observation() {
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");
    let sdb = cache(2, "/dev/sdb");

    metrics.observe_count(&sda, Category::Usage, "free", 1.0);
    metrics.observe_count(&sdb, Category::Usage, "free", 2.0);
    metrics.observe_percent(&sdb, Category::Blocks, "volume_total", 3.0);

    let points = metrics.points();
    assert_eq!(points.len(), 3);
    assert!(points
        .iter()
        .any(|p| p.id == 2 && p.device == "/dev/sdb" && p.kind == PointKind::Percentage));
}

#[test]
fn test_observe_cycle() {
    let metrics = MetricsCollector::new().unwrap();

    metrics.observe_cycle(Duration::from_millis(1500), true);
    let outcome = metrics.last_cycle();
    assert!(outcome.success);
    assert!((outcome.duration_seconds - 1.5).abs() < 1e-9);
    assert!(metrics.render().unwrap().contains("ocf_success 1"));

    metrics.observe_cycle(Duration::from_millis(250), false);
    let outcome = metrics.last_cycle();
    assert!(!outcome.success);
    assert!((outcome.duration_seconds - 0.25).abs() < 1e-9);
    assert!(metrics.render().unwrap().contains("ocf_success 0"));
}

#[test]
fn test_category_table() {
    let total: usize = Category::ALL.iter().map(|c| c.subcategories().len()).sum();
    assert_eq!(total, 32);

    for category in Category::ALL {
        assert_eq!(Category::from_label(category.as_str()), Some(category));
    }
    assert_eq!(Category::Errors.subcategory("total"), Some("total"));
    assert_eq!(Category::Usage.subcategory("total"), None);
}

#[test]
fn test_concurrent_render_never_sees_torn_values() {
    // Given: A writer flipping one key between two values
    let metrics = MetricsCollector::new().unwrap();
    let sda = cache(1, "/dev/sda");
    metrics.observe_count(&sda, Category::Usage, "dirty", 1.0);

    let writer = {
        let metrics = metrics.clone();
        std::thread::spawn(move || {
            for i in 0..20_000 {
                let value = if i % 2 == 0 { 123_456_789.0 } else { 1.0 };
                metrics.observe_count(&sda, Category::Usage, "dirty", value);
            }
        })
    };

    // When: Reading concurrently
    for _ in 0..500 {
        let value = metrics
            .value(PointKind::Count, 1, Category::Usage, "dirty")
            .unwrap();

        // Then: Only whole written values are ever observed
        assert!(value == 1.0 || value == 123_456_789.0, "torn value {}", value);
        assert!(metrics.render().is_ok());
    }

    writer.join().unwrap();
}
