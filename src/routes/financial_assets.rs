use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::AccessClaims;
use crate::domain::financial_asset::{self, FinancialAssetFilter, FinancialAssetType, NewFinancialAsset};
use crate::error::{AppError, ErrorContext};
use crate::validators::{is_valid_description, is_valid_name, is_valid_symbol};

#[derive(Deserialize)]
pub struct CreateFinancialAssetRequest {
    pub symbol: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Deserialize)]
pub struct FinancialAssetQuery {
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

impl FinancialAssetQuery {
    fn into_filter(self) -> Result<FinancialAssetFilter, AppError> {
        let asset_type = match self.asset_type.as_deref() {
            Some(t) if !t.trim().is_empty() => Some(FinancialAssetType::parse(t)?),
            _ => None,
        };

        Ok(FinancialAssetFilter {
            asset_type,
            symbol: non_empty(self.symbol),
            name: non_empty(self.name),
        })
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /financial-assets
///
/// # Errors
/// - 400: invalid symbol, name, description or type
/// - 409: symbol already exists
pub async fn create_financial_asset(
    body: web::Json<CreateFinancialAssetRequest>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_financial_asset").with_user_id(claims.user_id());

    let new_asset = NewFinancialAsset {
        symbol: is_valid_symbol(&body.symbol)?,
        name: is_valid_name("name", &body.name)?,
        description: is_valid_description("description", &body.description)?,
        asset_type: FinancialAssetType::parse(&body.asset_type)?,
    };

    let created = financial_asset::create(pool.get_ref(), &new_asset)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        financial_asset_id = created.id,
        symbol = %created.symbol,
        "Financial asset created"
    );

    Ok(HttpResponse::Created().json(json!({ "data": created })))
}

/// GET /financial-assets?type=&symbol=&name=
pub async fn list_financial_assets(
    query: web::Query<FinancialAssetQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("list_financial_assets");
    let filter = query.into_inner().into_filter()?;

    let assets = financial_asset::list(pool.get_ref(), &filter)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(json!({ "data": assets })))
}
