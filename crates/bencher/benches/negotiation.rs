use bencher::{TestCase, TestHeaders};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::header::{ACCEPT, ACCEPT_LANGUAGE};
use http::{Request, StatusCode};
use micro_conneg::{BufferedResponse, MediaRanges, Negotiator, Offer, PrecedenceValues};
use serde_json::json;
use std::hint::black_box;

static CURL: TestHeaders = TestHeaders::new("*/*", "");
static API_CLIENT: TestHeaders = TestHeaders::new("application/json, application/xml;q=0.9, */*;q=0.1", "en-US, en;q=0.8");
static BROWSER: TestHeaders = TestHeaders::new(
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    "de-CH, de;q=0.9, fr-CH;q=0.8, fr;q=0.7, en-GB;q=0.6, en-US;q=0.5, en;q=0.4, *;q=0.1",
);

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("curl", CURL), TestCase::normal("api_client", API_CLIENT), TestCase::large("browser", BROWSER)]
}

fn offers() -> Vec<Offer> {
    vec![
        Offer::new("text/html").languages(&["en", "fr", "de"]),
        Offer::new("application/json").with(json!({"id": 1, "name": "tom"}), &[]),
        Offer::new("application/xml").with(json!({"id": 1, "name": "tom"}), &[]),
        Offer::new("text/csv").with(json!([1, "tom"]), &[]),
    ]
}

fn benchmark_header_parsing(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("header_parsing");

    for case in create_test_cases() {
        group.throughput(Throughput::Bytes(case.headers().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                let accepted = MediaRanges::parse(black_box(case.headers().accept()));
                let languages = PrecedenceValues::parse(black_box(case.headers().accept_language()));
                black_box((accepted, languages));
            });
        });
    }

    group.finish();
}

fn benchmark_negotiate(criterion: &mut Criterion) {
    let negotiator = Negotiator::default();
    let mut group = criterion.benchmark_group("negotiate_and_render");

    for case in create_test_cases() {
        let req = Request::builder()
            .header(ACCEPT, case.headers().accept())
            .header(ACCEPT_LANGUAGE, case.headers().accept_language())
            .body(())
            .expect("sample headers should be valid");

        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &req, |b, req| {
            b.iter(|| {
                let mut response = BufferedResponse::new();
                negotiator.render(&mut response, req, StatusCode::OK, offers()).expect("rendering should succeed");
                black_box(response);
            });
        });
    }

    group.finish();
}

criterion_group!(negotiation, benchmark_header_parsing, benchmark_negotiate);
criterion_main!(negotiation);
