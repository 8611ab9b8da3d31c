use actix_web::{get, post, web, HttpResponse, Responder};
use tracing::info;

use crate::error::AppError;
use crate::progress::RunPhase;
use crate::registry::{RunId, RunRegistry};
use crate::runner::{BatchRunner, RunRequest};

#[get("/health")]
pub async fn health() -> impl Responder {
    web::Json(serde_json::json!({ "status": "ok" }))
}

/* ------------------------ POST /runs ------------------------ */

#[post("/runs")]
pub async fn start_run(
    payload: web::Json<RunRequest>,
    runner: web::Data<BatchRunner>,
) -> actix_web::Result<impl Responder> {
    match runner.start(payload.into_inner()).await {
        Ok(run_id) => Ok(HttpResponse::Accepted().json(serde_json::json!({
            "runId": run_id,
            "message": "Run started. Poll progress and download the table when complete."
        }))),
        Err(e @ AppError::RunsSaturated) => {
            Ok(HttpResponse::ServiceUnavailable().json(e))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(e)),
    }
}

/* ------------------------ GET /runs/{id}/progress ------------------------ */

#[get("/runs/{id}/progress")]
pub async fn run_progress(
    path: web::Path<RunId>,
    registry: web::Data<RunRegistry>,
) -> actix_web::Result<impl Responder> {
    let run_id = path.into_inner();
    match registry.progress(run_id).await {
        Some(state) => Ok(HttpResponse::Ok().json(state)),
        None => Ok(HttpResponse::NotFound().json(AppError::RunNotFound(run_id.to_string()))),
    }
}

/* ------------------------ GET /runs/{id}/download ------------------------ */

#[get("/runs/{id}/download")]
pub async fn download_run(
    path: web::Path<RunId>,
    registry: web::Data<RunRegistry>,
) -> actix_web::Result<impl Responder> {
    let run_id = path.into_inner();

    let Some(state) = registry.progress(run_id).await else {
        return Ok(HttpResponse::NotFound().json(AppError::RunNotFound(run_id.to_string())));
    };

    match state.phase {
        // In progress is distinguishable from not-found for pollers.
        RunPhase::Idle | RunPhase::Running => {
            Ok(HttpResponse::Conflict().json(AppError::ExportNotReady(run_id.to_string())))
        }
        RunPhase::Failed => Ok(HttpResponse::NotFound()
            .json(AppError::CsvExport("the run failed before producing a table".into()))),
        RunPhase::Completed => {
            let Some(artifact_path) = registry.artifact_path(run_id).await else {
                return Ok(
                    HttpResponse::NotFound().json(AppError::RunNotFound(run_id.to_string()))
                );
            };

            match tokio::fs::read(&artifact_path).await {
                Ok(bytes) => {
                    let filename = artifact_path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("results.csv")
                        .to_string();
                    info!("[RUN] {} download served ({} bytes)", run_id, bytes.len());
                    Ok(HttpResponse::Ok()
                        .content_type("text/csv; charset=utf-8")
                        .insert_header((
                            "Content-Disposition",
                            format!("attachment; filename=\"{}\"", filename),
                        ))
                        .body(bytes))
                }
                Err(_) => Ok(HttpResponse::NotFound()
                    .json(AppError::CsvExport("artifact file is missing".into()))),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use actix_web::{test, App};
    use secrecy::SecretString;
    use tempfile::TempDir;
    use url::Url;
    use uuid::Uuid;
    use wiremock::matchers::{method, path as mock_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::places::PlacesClient;
    use crate::scheduler::RunScheduler;

    fn test_components(mock_url: &str, output_dir: PathBuf) -> (BatchRunner, RunRegistry) {
        let registry = RunRegistry::new();
        let client = PlacesClient::new(
            Url::parse(mock_url).unwrap(),
            SecretString::from("test_key".to_string()),
        )
        .unwrap()
        .with_page_token_delay(Duration::ZERO);
        let runner = BatchRunner::new(client, registry.clone(), RunScheduler::new(1), output_dir)
            .with_inter_query_delay(Duration::ZERO);
        (runner, registry)
    }

    macro_rules! test_app {
        ($runner:expr, $registry:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($runner))
                    .app_data(web::Data::new($registry))
                    .service(health)
                    .service(start_run)
                    .service(run_progress)
                    .service(download_run),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let (runner, registry) = test_components(&mock_server.uri(), temp_dir.path().into());
        let app = test_app!(runner, registry);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request())
            .await;

        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn progress_for_unknown_run_is_not_found() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let (runner, registry) = test_components(&mock_server.uri(), temp_dir.path().into());
        let app = test_app!(runner, registry);

        let uri = format!("/runs/{}/progress", Uuid::new_v4());
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Run Not Found");
    }

    #[actix_web::test]
    async fn download_for_unknown_run_is_not_found() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let (runner, registry) = test_components(&mock_server.uri(), temp_dir.path().into());
        let app = test_app!(runner, registry);

        let uri = format!("/runs/{}/download", Uuid::new_v4());
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn download_while_running_is_a_conflict_not_a_404() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let (runner, registry) = test_components(&mock_server.uri(), temp_dir.path().into());

        // Slow search keeps the run in flight while we probe the download.
        Mock::given(method("POST"))
            .and(mock_path("/v1/places:searchText"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "places": [] }))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let app = test_app!(runner, registry.clone());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/runs")
                .set_json(serde_json::json!({
                    "queries": ["slow query"],
                    "fields": ["displayName"],
                    "outputName": "slow"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 202);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let run_id = body["runId"].as_str().unwrap().to_string();

        let uri = format!("/runs/{}/download", run_id);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), 409);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Export Not Ready");

        // Drain the run so the temp dir outlives it cleanly.
        let run_id: Uuid = run_id.parse().unwrap();
        if let Some(handle) = registry.take_handle(run_id).await {
            handle.await.unwrap();
        }
    }

    #[actix_web::test]
    async fn completed_run_serves_the_csv() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let (runner, registry) = test_components(&mock_server.uri(), temp_dir.path().into());

        Mock::given(method("POST"))
            .and(mock_path("/v1/places:searchText"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "places": [{ "id": "ChIJaaaa" }]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(mock_path("/v1/places/ChIJaaaa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "displayName": { "text": "Cafe" },
                "rating": 4.5
            })))
            .mount(&mock_server)
            .await;

        let app = test_app!(runner, registry.clone());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/runs")
                .set_json(serde_json::json!({
                    "queries": ["coffee"],
                    "fields": ["displayName", "rating"],
                    "outputName": "coffee run"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 202);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let run_id: Uuid = body["runId"].as_str().unwrap().parse().unwrap();

        // The join handle is the completion signal.
        registry
            .take_handle(run_id)
            .await
            .expect("run handle")
            .await
            .expect("run task");

        let uri = format!("/runs/{}/progress", run_id);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        let state: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(state["phase"], "completed");
        assert_eq!(state["percent"], 100);

        let uri = format!("/runs/{}/download", run_id);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), 200);
        assert!(resp
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("coffee_run.csv"));
        let bytes = test::read_body(resp).await;
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("displayName,rating"));
        assert!(text.contains("Cafe,4.5"));
    }
}
