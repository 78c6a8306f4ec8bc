//! Triage prediction endpoints: LLM intake, record save, history and
//! PDF export.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::endpoints::required;
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::prediction::{
    fetch_predictions, render_prediction_report, save_prediction, Confidence, SavePrediction,
};
use crate::report;
use crate::triage;

/// `GET /api/predict` — run the intake Q&A through the LLM.
///
/// Question/answer pairs arrive either as a single `qna` JSON parameter
/// or as the remaining query parameters themselves, in request order.
pub async fn predict(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let mut qna = params
        .iter()
        .find(|(key, _)| key == "qna")
        .and_then(|(_, raw)| parse_qna_json(raw))
        .unwrap_or_default();
    if qna.is_empty() {
        qna = params.into_iter().filter(|(key, _)| key != "qna").collect();
    }
    if qna.is_empty() {
        return Err(ApiError::BadRequest("No Q&A data provided".into()));
    }

    let prediction = match state.llm.clone() {
        Some(client) => {
            // reqwest::blocking must stay off the async runtime threads
            tokio::task::spawn_blocking(move || {
                triage::predict_disease_from_qa(client.as_ref(), &qna)
            })
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
        }
        None => triage::error_fallback("LLM service not configured"),
    };

    Ok(Json(json!({ "success": true, "prediction": prediction })))
}

fn parse_qna_json(raw: &str) -> Option<Vec<(String, String)>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let pairs = object
        .iter()
        .map(|(question, answer)| {
            let answer = match answer {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (question.clone(), answer)
        })
        .collect::<Vec<_>>();
    (!pairs.is_empty()).then_some(pairs)
}

#[derive(Deserialize)]
pub struct SaveQuery {
    pub user_id: Option<String>,
    pub predicted_disease: Option<String>,
    pub symptoms: Option<String>,
    pub severity: Option<String>,
    pub doctor_name: Option<String>,
    pub confidence: Option<String>,
}

/// `GET /api/predictions/save`
pub async fn save(
    State(state): State<AppState>,
    Query(q): Query<SaveQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = required(&q.user_id)?;
    let predicted_disease = required(&q.predicted_disease)?;
    let symptoms = required(&q.symptoms)?;
    let severity = required(&q.severity)?;

    // Non-numeric confidence falls back to the same default that degraded
    // decode would produce anyway.
    let confidence = q
        .confidence
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .map(Confidence::new);

    let conn = state.open_db()?;
    let recorded_at = save_prediction(
        &conn,
        &SavePrediction {
            subject_id: user_id,
            disease_name: predicted_disease,
            symptoms,
            severity,
            doctor_name: q.doctor_name.as_deref(),
            confidence,
        },
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "Prediction saved successfully",
        "date": recorded_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
    })))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
}

/// `GET /api/predictions/get` — decoded history for the caller, with the
/// query shape chosen by their role.
pub async fn get(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = required(&q.user_id)?;

    let conn = state.open_db()?;
    let predictions = fetch_predictions(&conn, user_id)?;

    Ok(Json(json!({
        "success": true,
        "count": predictions.len(),
        "predictions": predictions,
    })))
}

#[derive(Deserialize)]
pub struct PdfQuery {
    pub user_id: Option<String>,
    pub date: Option<String>,
}

/// `GET /api/predictions/pdf` — render the most recent record (optionally
/// pinned to a calendar date) as a PDF download.
pub async fn pdf(
    State(state): State<AppState>,
    Query(q): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    let user_id = required(&q.user_id)?;
    let date = q.date.as_deref().filter(|d| !d.is_empty());

    let conn = state.open_db()?;
    let payload = render_prediction_report(&conn, user_id, date)?;
    let filename = report::report_filename(&payload);
    let bytes = report::generate_report_pdf(&payload)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(bytes.into())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qna_json_object_becomes_pairs() {
        let pairs = parse_qna_json(r#"{"Do you have a fever?": "Yes", "How long?": "3 days"}"#)
            .expect("object should parse");
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|(q, a)| q == "How long?" && a == "3 days"));
    }

    #[test]
    fn qna_json_rejects_non_objects() {
        assert!(parse_qna_json("not json").is_none());
        assert!(parse_qna_json(r#"["a", "b"]"#).is_none());
        assert!(parse_qna_json("{}").is_none());
    }
}
