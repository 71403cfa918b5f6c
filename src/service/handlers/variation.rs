//! `/variation` endpoints
//!
//! Each handler validates its text parameters and delegates to the
//! [`QueryHandler`](crate::query::QueryHandler). Responses are always
//! `200 OK`; failures are reported in `warnings`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};

use crate::query::{
    AmplificationQuery, AmplificationToCxVarResponse, HgvsToCopyNumberChangeResponse,
    HgvsToCopyNumberCountResponse, NormalizeResponse, ParsedToCnVarQuery, ParsedToCnVarResponse,
    ParsedToCxVarQuery, ParsedToCxVarResponse, ToCdnaResponse, ToGenomicResponse, ToVrsResponse,
};
use crate::service::{
    server::AppState,
    types::{
        CdnaToGenomicParams, ErrorResponse, HgvsToCopyNumberChangeParams,
        HgvsToCopyNumberCountParams, NormalizeParams, ProteinToCdnaParams,
        ProteinToGenomicParams, ServiceError, ToVrsParams,
    },
    validation::{validate_accession, validate_query, ValidationError},
};

type Rejection = (StatusCode, Json<ErrorResponse>);

fn check(result: Result<(), ValidationError>) -> Result<(), Rejection> {
    result.map_err(|e| ServiceError::InvalidQuery(e.to_string()).into_rejection())
}

/// All VRS variations a query denotes
pub async fn to_vrs(
    State(state): State<AppState>,
    Query(params): Query<ToVrsParams>,
) -> Result<Json<ToVrsResponse>, Rejection> {
    check(validate_query(&params.q))?;
    Ok(Json(state.handler.to_vrs(&params.q).await))
}

/// The single representative variation for a query
pub async fn normalize(
    State(state): State<AppState>,
    Query(params): Query<NormalizeParams>,
) -> Result<Json<NormalizeResponse>, Rejection> {
    check(validate_query(&params.q))?;
    let response = state
        .handler
        .normalize(
            &params.q,
            params.hgvs_dup_del_mode,
            params.baseline_copies,
            params.copy_change,
        )
        .await;
    Ok(Json(response))
}

pub async fn hgvs_to_copy_number_count(
    State(state): State<AppState>,
    Query(params): Query<HgvsToCopyNumberCountParams>,
) -> Result<Json<HgvsToCopyNumberCountResponse>, Rejection> {
    check(validate_query(&params.hgvs_expr))?;
    let response = state
        .handler
        .hgvs_to_copy_number_count(&params.hgvs_expr, params.baseline_copies, params.do_liftover)
        .await;
    Ok(Json(response))
}

pub async fn hgvs_to_copy_number_change(
    State(state): State<AppState>,
    Query(params): Query<HgvsToCopyNumberChangeParams>,
) -> Result<Json<HgvsToCopyNumberChangeResponse>, Rejection> {
    check(validate_query(&params.hgvs_expr))?;
    let response = state
        .handler
        .hgvs_to_copy_number_change(&params.hgvs_expr, params.copy_change, params.do_liftover)
        .await;
    Ok(Json(response))
}

pub async fn parsed_to_cn_var(
    State(state): State<AppState>,
    Json(request): Json<ParsedToCnVarQuery>,
) -> Json<ParsedToCnVarResponse> {
    Json(state.handler.parsed_to_cn_var(&request).await)
}

pub async fn parsed_to_cx_var(
    State(state): State<AppState>,
    Json(request): Json<ParsedToCxVarQuery>,
) -> Json<ParsedToCxVarResponse> {
    Json(state.handler.parsed_to_cx_var(&request).await)
}

pub async fn amplification_to_cx_var(
    State(state): State<AppState>,
    Query(params): Query<AmplificationQuery>,
) -> Result<Json<AmplificationToCxVarResponse>, Rejection> {
    check(validate_query(&params.gene))?;
    if let Some(sequence_id) = &params.sequence_id {
        check(validate_accession(sequence_id))?;
    }
    Ok(Json(state.handler.amplification_to_cx_var(params).await))
}

pub async fn p_to_c(
    State(state): State<AppState>,
    Query(params): Query<ProteinToCdnaParams>,
) -> Result<Json<ToCdnaResponse>, Rejection> {
    check(validate_accession(&params.p_ac))?;
    let response = state
        .handler
        .p_to_c(
            &params.p_ac,
            params.p_start_pos,
            params.p_end_pos,
            params.residue_mode,
        )
        .await;
    Ok(Json(response))
}

pub async fn c_to_g(
    State(state): State<AppState>,
    Query(params): Query<CdnaToGenomicParams>,
) -> Result<Json<ToGenomicResponse>, Rejection> {
    check(validate_accession(&params.c_ac))?;
    let response = state
        .handler
        .c_to_g(
            &params.c_ac,
            params.c_start_pos,
            params.c_end_pos,
            params.cds_start,
            params.residue_mode,
            params.target_genome_assembly,
        )
        .await;
    Ok(Json(response))
}

pub async fn p_to_g(
    State(state): State<AppState>,
    Query(params): Query<ProteinToGenomicParams>,
) -> Result<Json<ToGenomicResponse>, Rejection> {
    check(validate_accession(&params.p_ac))?;
    let response = state
        .handler
        .p_to_g(
            &params.p_ac,
            params.p_start_pos,
            params.p_end_pos,
            params.residue_mode,
            params.target_genome_assembly,
        )
        .await;
    Ok(Json(response))
}
