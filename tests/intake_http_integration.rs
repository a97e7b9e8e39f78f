//! Integration tests for the intake HTTP surface.
//!
//! Each test spins up a fake farm backend and the intake server on random
//! ports, then drives whole conversations over HTTP with reqwest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use kisaan_saathi::backend::{
    AgronomyAdvisor, FarmServices, GoogleTranslate, Language, RestClient, Translator,
};
use kisaan_saathi::config::BackendConfig;
use kisaan_saathi::error::LlmError;
use kisaan_saathi::intake::{FlowController, SessionContext};
use kisaan_saathi::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use kisaan_saathi::shell::intake_routes;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stub LLM that always returns a fenced yield prediction.
struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: "```json\n{\"predictedYieldKgPerAcre\": 1500, \"yieldCategory\": \"Medium\", \
                      \"soilHealthScore\": 70, \"soilHealthCategory\": \"Good\", \
                      \"climateScore\": 80, \"suggestedCrops\": []}\n```"
                .to_string(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
        })
    }
}

/// What the fake farm backend received.
#[derive(Default)]
struct Recorded {
    loans: Vec<Value>,
    claims: Vec<(String, Vec<u8>)>,
    analyze: Vec<Value>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn apply_loan(State(rec): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let status = if body["loanPurpose"] == "reject me" {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };
    rec.lock().unwrap().loans.push(body);
    if status == StatusCode::BAD_REQUEST {
        return (status, Json(json!({"message": "Loan limit exceeded"})));
    }
    (
        status,
        Json(json!({"id": 77, "status": "pending", "fraudScore": 0.1})),
    )
}

async fn create_claim(
    State(rec): State<Shared>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    rec.lock().unwrap().claims.push((content_type, body.to_vec()));
    Json(json!({"id": "CLM-9", "status": "submitted"}))
}

async fn analyze(State(rec): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let reply = match body["type"].as_str() {
        Some("chat") => json!({"analysis": format!("Advice on: {}", body["prompt"].as_str().unwrap_or(""))}),
        _ => json!({"ok": true}),
    };
    rec.lock().unwrap().analyze.push(body);
    Json(reply)
}

async fn serve(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Start the fake backend and the intake server; return (intake port, recorder).
async fn start_servers() -> (u16, Shared) {
    let recorded: Shared = Arc::default();
    let fake = Router::new()
        .route("/loan/apply", post(apply_loan))
        .route("/insurance/create", post(create_claim))
        .route("/api/ai/analyze", post(analyze))
        .with_state(Arc::clone(&recorded));
    let backend_port = serve(fake).await;

    let rest = RestClient::new(BackendConfig {
        backend_url: format!("http://127.0.0.1:{backend_port}"),
        api_url: format!("http://127.0.0.1:{backend_port}/api"),
    });
    let advisor = AgronomyAdvisor::new(Arc::new(StubLlm), Arc::new(StubLlm));
    let controller = FlowController::new(
        Arc::new(FarmServices::new(rest, advisor)),
        SessionContext::new("farmer-42", "Sunita Devi"),
    );
    let intake_port = serve(intake_routes(Arc::new(controller))).await;

    // Give the servers a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (intake_port, recorded)
}

/// Client that threads the session through successive turns.
struct Widget {
    client: reqwest::Client,
    port: u16,
    session: Value,
}

impl Widget {
    fn new(port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            port,
            session: Value::Null,
        }
    }

    async fn send(&mut self, mut body: Value) -> Value {
        if !self.session.is_null() {
            body["session"] = self.session.clone();
        }
        let resp = self
            .client
            .post(format!("http://127.0.0.1:{}/api/intake/turn", self.port))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let v: Value = resp.json().await.unwrap();
        self.session = v["session"].clone();
        v["reply"].clone()
    }

    async fn say(&mut self, text: &str) -> Value {
        self.send(json!({"text": text})).await
    }
}

#[tokio::test]
async fn loan_conversation_reaches_backend() {
    timeout(TEST_TIMEOUT, async {
        let (port, recorded) = start_servers().await;
        let mut widget = Widget::new(port);

        let reply = widget.say("I want to apply for a loan").await;
        assert_eq!(reply["text"], "What is the purpose of the loan?");
        widget.say("Crop Cultivation").await;
        widget.say("Wheat").await;

        let reply = widget.say("fifty thousand").await;
        assert_eq!(reply["kind"], "corrective");
        assert_eq!(widget.session["step"], 3);

        widget.say("₹50,000").await;
        let reply = widget.say("2").await;
        assert_eq!(reply["kind"], "submitted");
        assert!(reply["text"].as_str().unwrap().contains("ID: 77"));
        assert_eq!(widget.session["flowState"], "idle");
        assert_eq!(widget.session["step"], 0);

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.loans.len(), 1);
        let loan = &rec.loans[0];
        assert_eq!(loan["farmerUid"], "farmer-42");
        assert_eq!(loan["farmerName"], "Sunita Devi");
        assert_eq!(loan["loanPurpose"], "Crop Cultivation");
        assert_eq!(loan["cropType"], "Wheat");
        assert_eq!(loan["requestedAmount"].as_f64(), Some(50000.0));
        assert_eq!(loan["tenureMonths"], 24);
        assert_eq!(loan["acres"].as_f64(), Some(5.0));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rejected_loan_shows_backend_message_and_resets() {
    timeout(TEST_TIMEOUT, async {
        let (port, _recorded) = start_servers().await;
        let mut widget = Widget::new(port);

        for text in ["loan", "reject me", "Rice", "10000", "1"] {
            widget.say(text).await;
        }
        let log = widget.session["messageLog"].as_array().unwrap();
        let last = log.last().unwrap()["text"].as_str().unwrap();
        assert!(last.contains("Loan limit exceeded"), "{last}");
        assert_eq!(widget.session["flowState"], "idle");
        assert!(widget.session["collectedFields"].as_object().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn insurance_claim_is_sent_as_multipart_with_photo() {
    timeout(TEST_TIMEOUT, async {
        let (port, recorded) = start_servers().await;
        let mut widget = Widget::new(port);

        widget.say("I need to file an insurance claim").await;
        widget.say("PMFBY").await;
        widget.say("UIN-123").await;
        widget.say("POL-456").await;
        let reply = widget
            .send(json!({
                "text": "",
                "attachment": {"name": "field.jpg", "mimeType": "image/jpeg", "data": "/9j/AA=="}
            }))
            .await;
        assert_eq!(reply["kind"], "submitted");
        assert!(reply["text"].as_str().unwrap().contains("CLM-9"));

        let rec = recorded.lock().unwrap();
        let (content_type, body) = &rec.claims[0];
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(body);
        for needle in ["name=\"uid\"", "farmer-42", "name=\"policyNumber\"", "POL-456", "name=\"damageImage\"", "field.jpg"] {
            assert!(body.contains(needle), "missing {needle}");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn yield_prediction_parses_model_json() {
    timeout(TEST_TIMEOUT, async {
        let (port, _recorded) = start_servers().await;
        let mut widget = Widget::new(port);

        let reply = widget.send(json!({"workflow": "yield"})).await;
        assert_eq!(reply["text"], "What type of crop are you growing?");
        widget.say("Maize").await;
        widget.say("3").await;
        let reply = widget.say("2024-07-01").await;
        assert_eq!(reply["kind"], "submitted");
        let text = reply["text"].as_str().unwrap();
        assert!(text.contains("1500 kg/acre (Medium)"), "{text}");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn general_chat_and_feedback_hit_analyze_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, recorded) = start_servers().await;
        let mut widget = Widget::new(port);

        let reply = widget.say("When should I sow mustard?").await;
        assert_eq!(reply["kind"], "general");
        assert_eq!(reply["text"], "Advice on: When should I sow mustard?");

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/api/intake/feedback"))
            .json(&json!({"prompt": "When should I sow mustard?", "rating": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);

        let rec = recorded.lock().unwrap();
        assert_eq!(rec.analyze.len(), 2);
        assert_eq!(rec.analyze[0]["type"], "chat");
        assert_eq!(rec.analyze[1]["type"], "feedback");
        assert_eq!(rec.analyze[1]["data"]["userRating"], 1);
        assert_eq!(
            rec.analyze[1]["data"]["originalPrompt"],
            "When should I sow mustard?"
        );
    })
    .await
    .expect("test timed out");
}

/// `translate_a/single` look-alike: echoes the query as two segments.
async fn fake_translate(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let q = params.get("q").cloned().unwrap_or_default();
    let pair = format!("{}>{}", params["sl"], params["tl"]);
    Json(json!([[[format!("{pair}: "), "", null], [q, "", null]], null, params["sl"]]))
}

#[tokio::test]
async fn google_translate_sends_gtx_query_and_joins_segments() {
    timeout(TEST_TIMEOUT, async {
        let port = serve(Router::new().route("/translate_a/single", get(fake_translate))).await;
        let translator = GoogleTranslate::new(format!("http://127.0.0.1:{port}/translate_a/single"));

        let text = translator
            .translate("गेहूं कब बोएं?", Language::Hindi, Language::English)
            .await
            .unwrap();
        assert_eq!(text, "hi>en: गेहूं कब बोएं?");

        let missing = GoogleTranslate::new(format!("http://127.0.0.1:{port}/nowhere"));
        assert!(
            missing
                .translate("hello", Language::English, Language::Hindi)
                .await
                .is_err()
        );
    })
    .await
    .expect("test timed out");
}
