//! Full runs against a mock upstream API

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    context, dte_json, fast_config, list_body, mount_dte_details, mount_reference_collections,
    FailingExporter, RecordingExporter,
};
use dte_extractor::downloader::{DateRange, EnrichmentPipeline, Orchestrator, RangeOutcome, YearMonth};
use dte_extractor::model::{Dte, Estimate, Seller};
use dte_extractor::output::{OutputNaming, RecordExporter, XlsxExporter};

fn month(year: i32, month: u32) -> DateRange {
    DateRange::for_month(YearMonth::new(year, month)).unwrap()
}

#[tokio::test]
async fn test_records_over_two_pages_are_exported_once() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;
    mount_dte_details(&server).await;

    Mock::given(method("GET"))
        .and(path("/dtes"))
        .and(query_param("page", "1"))
        .and(query_param("type_document", "33"))
        .and(query_param("range_date", "01-01-2024 / 31-01-2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            (1..=20).map(|id| dte_json(id, Some(1))).collect(),
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            (21..=25).map(|id| dte_json(id, Some(1))).collect(),
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = fast_config(tmp.path());
    let ctx = context(&server, &config);
    let pipeline = EnrichmentPipeline::<Dte>::new(ctx.clone()).with_filter("type_document", "33");
    let recorder = Arc::new(RecordingExporter::default());
    let exporter: Arc<dyn RecordExporter<Dte>> = recorder.clone();

    let report = Orchestrator::new(pipeline, exporter, OutputNaming::dtes(tmp.path(), 33), config.range_delay)
        .run(&[month(2024, 1)])
        .await;

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.ends_with("dtes_type33_2024_01.xlsx"));
    assert_eq!(calls[0].1, (1..=25).collect::<Vec<i64>>());

    assert_eq!(report.exported(), 1);
    assert_eq!(report.records_exported(), 25);
    assert_eq!(report.data_loss(), 0);
    assert_eq!(ctx.stats().snapshot().data_loss, 0);
}

#[tokio::test]
async fn test_rate_limited_detail_degrades_one_record() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;

    Mock::given(method("GET"))
        .and(path("/dtes/2"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .expect(3)
        .mount(&server)
        .await;
    mount_dte_details(&server).await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            (1..=3).map(|id| dte_json(id, Some(1))).collect(),
            1,
        )))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let ctx = context(&server, &fast_config(tmp.path()));
    let records = EnrichmentPipeline::<Dte>::new(ctx.clone())
        .run(&month(2024, 1))
        .await;

    assert_eq!(records.len(), 3);
    assert!(records[0].detail.is_some());
    assert!(records[1].detail.is_none());
    assert!(records[2].detail.is_some());
    assert_eq!(records[0].detail.as_ref().unwrap().products.len(), 1);
    assert_eq!(records[1].seller.as_ref().map(Seller::display_name).as_deref(), Some("Ana Rojas"));

    let stats = ctx.stats().snapshot();
    assert_eq!(stats.rate_limited, 3);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.failed_after_retries, 1);
    assert_eq!(stats.data_loss, 1);
}

#[tokio::test]
async fn test_empty_ranges_are_not_exported() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body("dtes", vec![], 1)))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = fast_config(tmp.path());
    let recorder = Arc::new(RecordingExporter::default());
    let exporter: Arc<dyn RecordExporter<Dte>> = recorder.clone();

    let report = Orchestrator::new(
        EnrichmentPipeline::<Dte>::new(context(&server, &config)),
        exporter,
        OutputNaming::dtes(tmp.path(), 33),
        config.range_delay,
    )
    .run(&[month(2024, 1), month(2024, 2)])
    .await;

    assert!(recorder.calls().is_empty());
    assert_eq!(report.empty(), 2);
    assert!(report.ranges.iter().all(|r| r.outcome == RangeOutcome::Empty));
}

#[tokio::test]
async fn test_failed_export_does_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;
    mount_dte_details(&server).await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            vec![dte_json(7, None)],
            1,
        )))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = fast_config(tmp.path());
    let exporter: Arc<dyn RecordExporter<Dte>> = Arc::new(FailingExporter);

    let report = Orchestrator::new(
        EnrichmentPipeline::<Dte>::new(context(&server, &config)),
        exporter,
        OutputNaming::dtes(tmp.path(), 33),
        config.range_delay,
    )
    .run(&[month(2024, 5), month(2024, 6)])
    .await;

    assert_eq!(report.failed(), 2);
    assert!(matches!(
        &report.ranges[1].outcome,
        RangeOutcome::ExportFailed { records: 1, error } if error.contains("disk full")
    ));
}

#[tokio::test]
async fn test_unknown_seller_recovered_from_print_layout() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;
    mount_dte_details(&server).await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            vec![dte_json(5, Some(99))],
            1,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dtes/5/imprimir"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "print_content": ["<p>Cliente: ACME</p>", "<b>Vendedor:</b> Juan Perez Soto<br/>"],
                "print_content_v2": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let ctx = context(&server, &fast_config(tmp.path()));
    let records = EnrichmentPipeline::<Dte>::new(ctx.clone())
        .run(&month(2024, 1))
        .await;

    let seller = records[0].seller.clone().expect("seller synthesized");
    assert_eq!(seller.id, 99);
    assert_eq!(seller.first_name, "Juan");
    assert_eq!(seller.last_name, "Perez Soto");
    assert_eq!(seller.role.as_deref(), Some(Seller::UNKNOWN_ROLE));
    assert!(ctx.cache.sellers.contains(99));
}

#[tokio::test]
async fn test_estimates_are_written_to_spreadsheet() {
    let server = MockServer::start().await;
    mount_reference_collections(&server).await;

    let estimates = vec![
        json!({"id": 1, "folio": 10, "amount_total": "1190.00", "seller_id": 1}),
        json!({"id": 2, "folio": 11, "amount_total": "595.50"}),
    ];
    Mock::given(method("GET"))
        .and(path("/cotizaciones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body("estimates", estimates, 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/cotizaciones/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 1,
                "folio": 10,
                "amount_total": "1190.00",
                "products": [{"name": "Service", "quantity": "2", "price": "500"}]
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let config = fast_config(tmp.path());
    let exporter: Arc<dyn RecordExporter<Estimate>> = Arc::new(XlsxExporter::new());

    let report = Orchestrator::new(
        EnrichmentPipeline::<Estimate>::new(context(&server, &config)),
        exporter,
        OutputNaming::estimates(tmp.path()),
        config.range_delay,
    )
    .run(&[month(2024, 3)])
    .await;

    let expected = tmp.path().join("estimates").join("estimates_2024_03.xlsx");
    assert_eq!(
        report.ranges[0].outcome,
        RangeOutcome::Exported {
            path: expected.clone(),
            records: 2
        }
    );
    assert!(expected.is_file());
}

#[tokio::test]
async fn test_reference_codes_are_joined_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/references"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "references",
            vec![json!({"id": 801, "code": "801", "name": "Orden de Compra"})],
            1,
        )))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_reference_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/dtes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(
            "dtes",
            vec![dte_json(1, Some(1))],
            1,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dtes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 1,
                "references": [
                    {"id": 10, "tpo_doc_ref_id": 801, "folio_ref": "OC-55"},
                    {"id": 11, "tpo_doc_ref_id": 801},
                    {"id": 12, "tpo_doc_ref_id": 999}
                ]
            }
        })))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let ctx = context(&server, &fast_config(tmp.path()));
    let records = EnrichmentPipeline::<Dte>::new(ctx)
        .run(&month(2024, 1))
        .await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.reference_codes.len(), 1);
    assert_eq!(record.reference_name(Some(801)), Some("Orden de Compra"));
    assert_eq!(record.reference_name(Some(999)), None);
}
