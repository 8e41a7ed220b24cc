//! End-to-end tests exercising the public API surface only

use pretty_assertions::assert_eq;
use serde_json::json;
use simple_qualtrics::{
    Cell, Config, CurrentUser, Error, Responses, Session, Survey, SurveyCache,
};
use std::io::{Cursor, Write};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn zip_csv(contents: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    writer.start_file("responses.csv", options).unwrap();
    writer.write_all(contents.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

const RESPONSES_CSV: &str = "\
StartDate,EndDate,Q1,Q2_1,Q2_2
Start Date,End Date,Any comments?,Rate - price,Rate - quality
meta,meta,meta,meta,meta
2021-06-01 08:00:00,2021-06-01 08:05:00,Loved it,5,4
2021-06-02 12:30:00,2021-06-02 12:33:10,,3,3
";

/// Stand up a mock account: two surveys, question metadata and a response
/// export for the second one.
async fn mock_account() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .and(header("x-api-token", "integrationToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"elements": [
            {"id": "SV_alpha", "name": "Employee onboarding"},
            {"id": "SV_beta", "name": "Product feedback 2021"},
        ]}})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/survey-definitions/SV_beta/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"elements": [
            {
                "DataExportTag": "Q1",
                "QuestionDescription": "Any comments?",
                "QuestionType": "TE",
            },
            {
                "DataExportTag": "Q2",
                "QuestionDescription": "Rate the following aspects",
                "QuestionType": "Matrix",
                "Answers": {
                    "1": {"Display": "Poor"},
                    "2": {"Display": "Average"},
                    "3": {"Display": "Excellent"},
                },
                "Choices": {
                    "1": {"Display": "The price"},
                    "2": {"Display": "The quality"},
                },
                "ChoiceOrder": ["1", "2"],
            },
        ]}})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/surveys/SV_beta/export-responses"))
        .and(body_json(json!({"format": "csv"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": {"progressId": "job1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/surveys/SV_beta/export-responses/job1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": {"status": "in progress"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/surveys/SV_beta/export-responses/job1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"result": {"status": "complete", "fileId": "file1"}}),
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/surveys/SV_beta/export-responses/file1/file"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_csv(RESPONSES_CSV)))
        .mount(&server)
        .await;

    server
}

/// Write a YAML credentials file and build a session from it, pointed at the
/// mock server instead of the real data-center URL.
fn yaml_session(server: &MockServer) -> Session {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qualtrics.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        "token: integrationToken\ndataCenter: fra1\nfileCreationPollIntervalMillis: 0"
    )
    .unwrap();

    let config = Config::builder().yaml(&path).build().unwrap();
    assert_eq!(config.data_center, "fra1");
    Session::with_base_url(config, server.uri())
}

#[tokio::test]
async fn test_survey_to_responses_flow() {
    let server = mock_account().await;
    let session = yaml_session(&server);
    let cache = SurveyCache::new();

    // Resolve by title pattern, then walk the entity graph.
    let survey = Survey::resolve(&session, &cache, "feedback").await.unwrap();
    assert_eq!(survey.id, "SV_beta");

    let questions = survey.questions().await.unwrap();
    let tags: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(tags, vec!["Q1", "Q2"]);

    let q1 = survey.question("comments").await.unwrap();
    let column = q1.responses().await.unwrap();
    assert_eq!(column.cells[0].as_str(), Some("Loved it"));
    assert!(column.cells[1].is_empty());

    let q2 = survey.question("Q2").await.unwrap();
    let quality = q2.sub_question("quality").unwrap();
    match quality.responses().await.unwrap() {
        Responses::Column(column) => {
            assert_eq!(column.name, "Q2_2");
            assert_eq!(column.cells[0].as_str(), Some("4"));
        }
        Responses::Table(table) => panic!("expected one column, got {:?}", table.columns()),
    }

    // Both question lookups went through the same memoized export: the
    // creation mock's expect(1) would have failed otherwise.
}

#[tokio::test]
async fn test_choice_lookup_through_public_api() {
    let server = mock_account().await;
    let session = yaml_session(&server);
    let cache = SurveyCache::new();

    let survey = Survey::resolve(&session, &cache, "SV_beta").await.unwrap();
    let q2 = survey.question("Q2").await.unwrap();

    let excellent = q2.choice("Excellent").unwrap();
    assert_eq!(excellent.id, 3);
    assert_eq!(q2.choice(1).unwrap().name, "Poor");

    let choices = q2.choices().unwrap();
    assert_eq!(choices.len(), 3);

    let price = q2.sub_question("price").unwrap();
    assert_eq!(price.id, 1);
}

#[tokio::test]
async fn test_response_dates_are_decoded() {
    let server = mock_account().await;
    let session = yaml_session(&server);
    let cache = SurveyCache::new();

    let survey = Survey::resolve(&session, &cache, "SV_beta").await.unwrap();
    let table = survey.responses().await.unwrap();

    let start = table.column("StartDate").unwrap();
    assert!(matches!(start.cells[0], Cell::Timestamp(_)));
    assert_eq!(
        start.cells[0].as_timestamp().unwrap().to_string(),
        "2021-06-01 08:00:00"
    );
}

#[tokio::test]
async fn test_generic_verbs_and_whoami() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"result": {"userId": "UR_1", "firstName": "Grace", "lastName": "Hopper"}}),
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/distributions"))
        .and(body_json(json!({"surveyId": "SV_beta"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"result": {"distributionId": "EMD_1"}}),
        ))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/distributions/EMD_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config::builder().token("t").data_center("d").build().unwrap();
    let session = Session::with_base_url(config, server.uri());

    let user = CurrentUser::fetch(&session).await.unwrap();
    assert_eq!(user.name, "Grace Hopper");

    let id = session
        .post_create("distributions", &json!({"surveyId": "SV_beta"}))
        .await
        .unwrap();
    assert_eq!(id, "EMD_1");
    session.delete(&format!("distributions/{id}")).await.unwrap();
}

#[tokio::test]
async fn test_api_errors_surface_through_the_graph() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/surveys"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"meta": {"error": {"errorMessage": "Invalid API token"}}}),
        ))
        .mount(&server)
        .await;

    let config = Config::builder().token("bad").data_center("d").build().unwrap();
    let session = Session::with_base_url(config, server.uri());
    let cache = SurveyCache::new();

    let err = Survey::resolve(&session, &cache, "anything").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API token");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // A failed fetch must not poison the cache.
    assert!(!cache.is_populated());
}
