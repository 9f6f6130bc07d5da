// Rendering tests over the public API
use bench_report::format::{format_seconds, format_seconds_as_millis};
use bench_report::histogram;
use bench_report::{
    render, Bucket, LatencyDistribution, OutputMode, Renderer, Report, ReportError,
    TemplateError, CSV_HEADER,
};

/// Three requests with distinct per-phase timings
fn sample_report() -> Report {
    let mut report = Report {
        total: 1.5,
        slowest: 0.3,
        fastest: 0.01,
        average: 0.12,
        rps: 2.0,
        histogram: vec![
            Bucket::new(0.01, 2),
            Bucket::new(0.1, 0),
            Bucket::new(0.2, 1),
        ],
        latency_distribution: vec![
            LatencyDistribution::new(50, 0.05),
            LatencyDistribution::new(99, 0.3),
        ],
        lats: vec![0.01, 0.05, 0.3],
        conn_lats: vec![0.001, 0.002, 0.003],
        dns_lats: vec![0.0005, 0.0, 0.001],
        req_lats: vec![0.0001, 0.0002, 0.0003],
        delay_lats: vec![0.008, 0.04, 0.29],
        res_lats: vec![0.0004, 0.0078, 0.0057],
        status_codes: vec![200, 404, 200],
        offsets: vec![0.0, 0.25, 1.2],
        ..Default::default()
    };
    report.status_code_dist.insert(200, 2);
    report.status_code_dist.insert(404, 1);
    report
}

fn bars(rendered: &str) -> Vec<usize> {
    rendered
        .lines()
        .map(|line| line.split_once("\t|").unwrap().1.chars().count())
        .collect()
}

#[test]
fn test_fullest_bucket_has_full_bar() {
    let buckets = vec![
        Bucket::new(0.001, 7),
        Bucket::new(0.002, 0),
        Bucket::new(0.003, 1000),
        Bucket::new(0.004, 999),
    ];
    let lengths = bars(&histogram::render(&buckets));
    assert_eq!(lengths[2], 40);
    assert_eq!(lengths[1], 0);
    assert!(lengths.iter().all(|&len| len <= 40));
}

#[test]
fn test_all_zero_buckets_render_empty_bars() {
    let buckets = vec![Bucket::new(0.1, 0), Bucket::new(0.2, 0)];
    assert_eq!(bars(&histogram::render(&buckets)), vec![0, 0]);
    assert_eq!(histogram::render(&[]), "");
}

#[test]
fn test_millis_rounding_boundary() {
    assert_eq!(format_seconds_as_millis(1.2344), "1234");
    assert_eq!(format_seconds_as_millis(1.2345), "1235");
    assert_eq!(format_seconds(0.5), "0.5000");
}

#[test]
fn test_csv_with_zero_requests_is_header_only() {
    let report = Report::default();
    assert_eq!(render("csv", &report).unwrap(), CSV_HEADER);
}

#[test]
fn test_csv_rows_follow_parallel_columns() {
    let report = sample_report();
    let csv = render("csv", &report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), report.lats.len() + 1);
    assert_eq!(lines[0], CSV_HEADER);
    for (i, line) in lines[1..].iter().enumerate() {
        let expected = [
            format_seconds_as_millis(report.lats[i]),
            format_seconds_as_millis(report.conn_lats[i]),
            format_seconds_as_millis(report.dns_lats[i]),
            format_seconds_as_millis(report.req_lats[i]),
            format_seconds_as_millis(report.delay_lats[i]),
            format_seconds_as_millis(report.res_lats[i]),
            report.status_codes[i].to_string(),
            format_seconds_as_millis(report.offsets[i]),
        ]
        .join(",");
        assert_eq!(*line, expected, "row {}", i + 1);
    }
    assert_eq!(lines[2], "  50,   2,   0,   0,  40,   8,404, 250");
}

#[test]
fn test_summary_size_lines_depend_on_size_total() {
    let mut report = sample_report();
    let summary = render("", &report).unwrap();
    assert!(!summary.contains("Total data"));
    assert!(!summary.contains("Size/request"));

    report.size_total = 2048;
    report.size_req = 1024;
    let summary = render("", &report).unwrap();
    assert!(summary.contains(
        "  Requests/sec:\t2.0000\n  Total data:\t2048 bytes\n  Size/request:\t1024 bytes\n\nResponse time histogram:\n"
    ));
}

#[test]
fn test_summary_error_block_only_when_errors() {
    let mut report = sample_report();
    assert!(!render("", &report).unwrap().contains("Error distribution"));

    report.error_dist.insert("connection refused".to_string(), 3);
    let summary = render("", &report).unwrap();
    assert!(summary.contains("Error distribution:\n  [3]\tconnection refused\n"));
}

#[test]
fn test_summary_sections_in_order() {
    let summary = render("", &sample_report()).unwrap();
    let sections = [
        "Summary:",
        "  Total:\t1500 millis",
        "  Slowest:\t 300 millis",
        "  Fastest:\t  10 millis",
        "  Average:\t 120 millis",
        "  Requests/sec:\t2.0000",
        "Response time histogram:",
        "Latency distribution:",
        "  50% in   50 millis",
        "  99% in  300 millis",
        "Details (average, fastest, slowest):",
        "  DNS+dialup:",
        "  DNS-lookup:",
        "  req write:",
        "  resp wait:",
        "  resp read:",
        "Status code distribution:",
    ];
    let mut from = 0;
    for section in sections {
        let at = summary[from..]
            .find(section)
            .unwrap_or_else(|| panic!("{:?} missing or out of order", section));
        from += at + section.len();
    }
}

#[test]
fn test_summary_and_csv_are_distinct() {
    let report = sample_report();
    let summary = render("", &report).unwrap();
    let csv = render("csv", &report).unwrap();
    assert_ne!(summary, csv);

    assert!(summary.trim_start().starts_with("Summary:"));
    for line in csv.lines().skip(1) {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 8);
        for field in fields {
            assert!(field.trim().parse::<f64>().is_ok(), "bad field {:?}", field);
        }
    }
}

#[test]
fn test_status_code_counts_sum_to_requests() {
    let report = sample_report();
    let summary = render("", &report).unwrap();
    let total: u64 = summary
        .lines()
        .filter(|line| line.ends_with(" responses"))
        .map(|line| {
            let count = line.split('\t').nth(1).unwrap().trim_end_matches(" responses");
            count.parse::<u64>().unwrap()
        })
        .sum();
    assert_eq!(total, report.lats.len() as u64);
    assert_eq!(total, report.status_codes.len() as u64);
}

#[test]
fn test_distribution_disagreeing_with_requests_is_rejected() {
    let mut report = sample_report();
    report.status_code_dist.insert(503, 2);
    let err = render("", &report).unwrap_err();
    assert!(matches!(err, ReportError::InvalidReport(_)), "{:?}", err);
}

#[test]
fn test_identical_latencies_render_in_every_mode() {
    // One request: every histogram mark equals the fastest latency
    let mut report = Report {
        total: 0.05,
        slowest: 0.05,
        fastest: 0.05,
        average: 0.05,
        rps: 20.0,
        histogram: vec![Bucket::new(0.05, 0); 11],
        lats: vec![0.05],
        conn_lats: vec![0.001],
        dns_lats: vec![0.0],
        req_lats: vec![0.0],
        delay_lats: vec![0.048],
        res_lats: vec![0.001],
        status_codes: vec![200],
        offsets: vec![0.0],
        ..Default::default()
    };
    report.histogram[0].count = 1;
    report.status_code_dist.insert(200, 1);

    let summary = render("", &report).unwrap();
    let histogram_lines = summary.lines().filter(|l| l.starts_with("  0.050 [")).count();
    assert_eq!(histogram_lines, 11);
    assert!(summary.contains("  0.050 [1]\t|"));

    let csv = render("csv", &report).unwrap();
    assert_eq!(csv.lines().count(), 2);

    let custom = render("{{ len .Histogram }}", &report).unwrap();
    assert_eq!(custom, "11");
}

#[test]
fn test_custom_template() {
    let report = sample_report();
    let out = render(
        "{{ range $i, $v := .Lats }}{{ $i }}={{ formatNumberToMillis $v | len }} {{ end }}{{ jsonify .StatusCodeDist }}",
        &report,
    )
    .unwrap();
    assert_eq!(out, "0=4 1=4 2=4 {\"200\":2,\"404\":1}");

    let renderer = Renderer::new();
    assert_eq!(
        renderer
            .render_mode(OutputMode::Custom("{{ .Rps }}"), &report)
            .unwrap(),
        "2.0"
    );
}

#[test]
fn test_malformed_custom_template_is_fatal() {
    let err = render("{{ if .Total }}never closed", &sample_report()).unwrap_err();
    match err {
        ReportError::Template(TemplateError::Parse { name, .. }) => assert_eq!(name, "custom"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_mismatched_columns_are_rejected() {
    let mut report = sample_report();
    report.status_codes.push(500);
    for output in ["", "csv", "{{ .Total }}"] {
        let err = render(output, &report).unwrap_err();
        assert!(matches!(err, ReportError::InvalidReport(_)), "{:?}", err);
    }
}

#[test]
fn test_non_finite_values_are_rejected() {
    let mut report = sample_report();
    report.average = f64::NAN;
    assert!(matches!(render("", &report), Err(ReportError::InvalidReport(_))));
}

#[test]
fn test_negative_count_fails_to_load() {
    let json = r#"{ "Histogram": [{ "Mark": 0.1, "Count": -1 }] }"#;
    assert!(serde_json::from_str::<Report>(json).is_err());

    let json = r#"{ "Lats": [0.1], "ConnLats": [0], "DnsLats": [0], "ReqLats": [0],
        "DelayLats": [0], "ResLats": [0], "StatusCodes": [200], "Offsets": [0],
        "StatusCodeDist": { "200": 1 } }"#;
    let report: Report = serde_json::from_str(json).unwrap();
    assert_eq!(report.num_requests(), 1);
    assert_eq!(render("csv", &report).unwrap().lines().count(), 2);
}
