use http::header::{
    ACCEPT, ACCEPT_CHARSET, CACHE_CONTROL, CONTENT_LANGUAGE, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, VARY,
};
use http::{HeaderName, HeaderValue, Method, Request, StatusCode};
use micro_conneg::render::{Json, Xml, processor_fn};
use micro_conneg::{BufferedResponse, Data, Metadata, Negotiator, Offer, RenderError, Value};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, UNIX_EPOCH};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).with_test_writer().finish();
        tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
    });
}

fn request(method: Method, headers: &[(HeaderName, &str)]) -> Request<()> {
    let mut builder = Request::builder().method(method);
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    builder.body(()).unwrap()
}

fn render(negotiator: &Negotiator, req: &Request<()>, offers: Vec<Offer>) -> Result<BufferedResponse, RenderError> {
    let mut response = BufferedResponse::new();
    negotiator.render(&mut response, req, StatusCode::OK, offers)?;
    Ok(response)
}

#[derive(Serialize)]
struct Book {
    title: &'static str,
    pages: u32,
}

#[test]
fn json_with_refused_xml() {
    init_tracing();
    let book = Value::model(&Book { title: "Dune", pages: 412 }).unwrap();
    let req = request(Method::GET, &[(ACCEPT, "application/json, application/xml;q=0")]);
    let offers = vec![
        Offer::new("application/xml").with(json!({"title": "Dune"}), &["en"]),
        Offer::new("application/json").with(book, &["en"]),
    ];

    let response = render(&Negotiator::default(), &req, offers).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json;charset=utf-8");
    assert_eq!(response.headers()[CONTENT_LANGUAGE], "en");
    assert_eq!(response.body_bytes(), b"{\"title\":\"Dune\",\"pages\":412}\n");
}

#[test]
fn missing_headers_vary_on_accept_only() {
    init_tracing();
    let req = request(Method::GET, &[]);
    let response = render(&Negotiator::default(), &req, vec![Offer::new("text/test").with("ok", &[])]).unwrap();

    assert_eq!(response.headers()[CONTENT_TYPE], "text/test;charset=utf-8");
    assert_eq!(response.headers()[VARY], "accept");
    assert!(!response.headers().contains_key(CONTENT_LANGUAGE));
    assert_eq!(response.body_bytes(), b"ok\n");
}

#[test]
fn matching_etag_is_not_modified() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let data = Data::lazy(move |_, _, required| {
        counter.fetch_add(1, Ordering::SeqCst);
        let value = required.then(|| Value::from(json!({"expensive": true})));
        Ok((value, Some(Metadata::new().with_hash("abc"))))
    });
    let req = request(Method::GET, &[(IF_NONE_MATCH, "\"abc\"")]);

    let response = render(&Negotiator::default(), &req, vec![Offer::new("application/json").with(data, &[])]).unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[ETAG], "\"abc\"");
    assert!(response.body_bytes().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn stale_etag_renders_the_value() {
    init_tracing();
    let data = Data::value(json!([1, 2])).with_metadata(Metadata::new().with_hash("v2"));
    let req = request(Method::GET, &[(IF_NONE_MATCH, "\"v1\"")]);

    let response = render(&Negotiator::default(), &req, vec![Offer::new("application/json").with(data, &[])]).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ETAG], "\"v2\"");
    assert_eq!(response.body_bytes(), b"[1,2]\n");
}

#[test]
fn unmodified_since_is_not_modified() {
    init_tracing();
    let modified = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let data = Data::value("body").with_metadata(Metadata::new().with_last_modified(modified));
    let since = httpdate::fmt_http_date(modified + Duration::from_secs(10));
    let req = request(Method::HEAD, &[(IF_MODIFIED_SINCE, since.as_str())]);

    let response = render(&Negotiator::default(), &req, vec![Offer::new("text/plain").with(data, &[])]).unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[LAST_MODIFIED], httpdate::fmt_http_date(modified).as_str());
}

#[test]
fn conditional_headers_are_ignored_for_post() {
    init_tracing();
    let data = Data::value("created").with_metadata(Metadata::new().with_hash("abc"));
    let req = request(Method::POST, &[(IF_NONE_MATCH, "*")]);

    let mut response = BufferedResponse::new();
    let offers = vec![Offer::new("text/plain").with(data, &[])];
    Negotiator::default().render(&mut response, &req, StatusCode::CREATED, offers).unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(!response.headers().contains_key(ETAG));
    assert_eq!(response.body_bytes(), b"created\n");
}

#[test]
fn json_sequence_is_one_array() {
    init_tracing();
    let mut remaining = 3;
    let data = Data::sequence(move |_, _| {
        remaining -= 1;
        Ok((Some(Value::from(json!({"left": remaining}))), remaining > 0))
    });
    let req = request(Method::GET, &[(ACCEPT, "application/json")]);

    let response = render(&Negotiator::default(), &req, vec![Offer::new("application/json").with(data, &[])]).unwrap();
    assert_eq!(response.body_bytes(), b"[{\"left\":2},{\"left\":1},{\"left\":0}]\n");
}

#[test]
fn xml_sequence_uses_configured_elements() {
    init_tracing();
    let negotiator = Negotiator::builder().processor(Xml::new().with_root("books").with_item("book")).build();
    let mut titles = vec!["Emma", "Dune"];
    let data = Data::sequence(move |_, _| Ok((titles.pop().map(|title| Value::from(json!({"title": title}))), true)));
    let req = request(Method::GET, &[(ACCEPT, "text/xml")]);

    let response = render(&negotiator, &req, vec![Offer::new("text/xml").with(data, &[])]).unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "text/xml;charset=utf-8");
    assert_eq!(response.body_bytes(), b"<books><book><title>Dune</title></book><book><title>Emma</title></book></books>\n");
}

#[test]
fn csv_rows() {
    init_tracing();
    let req = request(Method::GET, &[(ACCEPT, "text/csv")]);
    let data = Data::value(json!([{"title": "Dune", "pages": 412}, {"title": "Emma", "pages": 474}]));

    let response = render(&Negotiator::default(), &req, vec![Offer::new("text/csv").with(data, &[])]).unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "text/csv;charset=utf-8");
    assert_eq!(response.body_bytes(), b"Dune,412\nEmma,474\n");
}

#[test]
fn body_is_transcoded_to_accepted_charset() {
    init_tracing();
    let req = request(Method::GET, &[(ACCEPT_CHARSET, "iso-8859-1")]);
    let offer = Offer::new("text/plain").with("Grüße", &[]);

    let response = render(&Negotiator::default(), &req, vec![offer]).unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain;charset=windows-1252");
    assert_eq!(response.headers()[VARY], "accept, accept-charset");
    assert_eq!(response.body_bytes(), b"Gr\xfc\xdfe\n");
}

#[test]
fn unknown_charset_falls_back_to_utf8() {
    init_tracing();
    let req = request(Method::GET, &[(ACCEPT_CHARSET, "x-unknown")]);
    let response = render(&Negotiator::default(), &req, vec![Offer::new("text/plain").with("Grüße", &[])]).unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain;charset=utf-8");
    assert_eq!(response.body_bytes(), "Grüße\n".as_bytes());
}

#[test]
fn binary_bytes_are_copied_unmodified() {
    init_tracing();
    let req = request(Method::GET, &[(ACCEPT, "application/octet-stream"), (ACCEPT_CHARSET, "iso-8859-1")]);
    let payload = bytes::Bytes::from_static(&[0xff, 0x00, 0xc3, 0x28]);
    let offer = Offer::new("application/octet-stream").with(payload.clone(), &[]);

    let response = render(&Negotiator::default(), &req, vec![offer]).unwrap();
    assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    assert_eq!(response.body_bytes(), &payload[..]);
}

#[test]
fn not_acceptable_default_response() {
    init_tracing();
    let req = request(Method::GET, &[(ACCEPT, "image/png")]);
    let response = render(&Negotiator::default(), &req, vec![Offer::new("application/json").with("x", &[])]).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain;charset=utf-8");
    assert_eq!(response.body_bytes(), b"Not Acceptable\n");
}

#[test]
fn supplier_failure_is_returned() {
    init_tracing();
    let req = request(Method::GET, &[]);
    let mut first = true;
    let data = Data::sequence(move |_, _| {
        if first {
            first = false;
            Ok((Some(Value::from(json!(1))), true))
        } else {
            Err("cursor closed".into())
        }
    });

    let err = render(&Negotiator::default(), &req, vec![Offer::new("application/json").with(data, &[])]).unwrap_err();
    match err {
        RenderError::Supplier { source } => assert_eq!(source.to_string(), "cursor closed"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn data_headers_and_template_reach_the_response() {
    init_tracing();
    let page = processor_fn("text/html", |w, _req, stream, template, language| {
        while let Some(item) = stream.next_item()? {
            if let Value::Text(text) = item {
                write!(w, "<{template} lang=\"{language}\">{text}</{template}>")?;
            }
        }
        Ok(())
    });
    let negotiator = Negotiator::builder().processor(page).with_default_processors().build();
    let data = Data::lazy(|template, language, _| Ok((Some(Value::from(format!("{template}:{language}"))), None)))
        .with_header(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
    let req = request(Method::GET, &[(ACCEPT, "text/html")]);

    let response = render(&negotiator, &req, vec![Offer::new("text/html").with(data, &["nl"]).template("p")]).unwrap();
    assert_eq!(response.headers()[CACHE_CONTROL], "max-age=60");
    assert_eq!(response.headers()[CONTENT_LANGUAGE], "nl");
    assert_eq!(response.headers()[VARY], "accept");
    assert_eq!(response.body_bytes(), b"<p lang=\"nl\">p:nl</p>");
}

#[test]
fn pretty_json_processor() {
    init_tracing();
    let negotiator = Negotiator::builder().processor(Json::new().with_indent("  ")).build();
    let req = request(Method::GET, &[]);
    let response = render(&negotiator, &req, vec![Offer::new("application/json").with(json!({"a": 1}), &[])]).unwrap();
    assert_eq!(response.body_bytes(), b"{\n  \"a\": 1\n}\n");
}

#[test]
fn into_http_response() {
    init_tracing();
    let req = request(Method::GET, &[]);
    let response = render(&Negotiator::default(), &req, vec![Offer::new("text/plain").with("hi", &[])]).unwrap().into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"hi\n");
}
