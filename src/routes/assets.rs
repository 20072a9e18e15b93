/// Asset Routes
///
/// CRUD over the caller's own assets. The user id always comes from the
/// access token, so another user's asset looks exactly like a missing one.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::AccessClaims;
use crate::domain::asset::{self, AssetChanges, AssetFilter, NewAsset};
use crate::error::{AppError, DatabaseError, ErrorContext, ValidationError};
use crate::routes::financial_assets::non_empty;
use crate::validators::{is_valid_amount, is_valid_description, is_valid_id, is_valid_name};

#[derive(Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub value: f64,
    pub description: String,
    pub fin_asset_id: i64,
    pub category_id: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub description: Option<String>,
    pub fin_asset_id: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct AssetQuery {
    pub fin_asset_id: Option<i64>,
    pub category_id: Option<i64>,
    pub name: Option<String>,
}

impl CreateAssetRequest {
    fn validate(self) -> Result<NewAsset, ValidationError> {
        Ok(NewAsset {
            name: is_valid_name("name", &self.name)?,
            value: is_valid_amount("value", self.value)?,
            description: is_valid_description("description", &self.description)?,
            financial_asset_id: is_valid_id("fin_asset_id", self.fin_asset_id)?,
            category_id: self
                .category_id
                .map(|id| is_valid_id("category_id", id))
                .transpose()?,
        })
    }
}

impl UpdateAssetRequest {
    fn validate(self) -> Result<AssetChanges, ValidationError> {
        let changes = AssetChanges {
            name: self.name.map(|n| is_valid_name("name", &n)).transpose()?,
            value: self.value.map(|v| is_valid_amount("value", v)).transpose()?,
            description: self
                .description
                .map(|d| is_valid_description("description", &d))
                .transpose()?,
            financial_asset_id: self
                .fin_asset_id
                .map(|id| is_valid_id("fin_asset_id", id))
                .transpose()?,
            category_id: self
                .category_id
                .map(|id| is_valid_id("category_id", id))
                .transpose()?,
        };

        if changes.is_empty() {
            return Err(ValidationError::EmptyField("body".to_string()));
        }
        Ok(changes)
    }
}

fn asset_not_found(asset_id: i64) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("Asset {} not found", asset_id)))
}

/// POST /assets
///
/// # Errors
/// - 400: invalid fields, or unknown fin_asset_id / category_id
pub async fn create_asset(
    body: web::Json<CreateAssetRequest>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id();
    let context = ErrorContext::new("create_asset").with_user_id(user_id);
    let new_asset = body.into_inner().validate()?;

    let created = asset::create(pool.get_ref(), user_id, &new_asset)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id,
        asset_id = created.id,
        "Asset created"
    );

    Ok(HttpResponse::Created().json(json!({ "data": created })))
}

/// GET /assets?fin_asset_id=&category_id=&name=
pub async fn list_assets(
    query: web::Query<AssetQuery>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id();
    let context = ErrorContext::new("list_assets").with_user_id(user_id);
    let query = query.into_inner();

    let filter = AssetFilter {
        financial_asset_id: query.fin_asset_id,
        category_id: query.category_id,
        name: non_empty(query.name),
    };

    let assets = asset::list(pool.get_ref(), user_id, &filter)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(json!({ "data": assets })))
}

/// GET /assets/{id}
pub async fn get_asset(
    path: web::Path<i64>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let asset_id = path.into_inner();
    let user_id = claims.user_id();
    let context = ErrorContext::new("get_asset").with_user_id(user_id);

    let found = asset::find(pool.get_ref(), user_id, asset_id)
        .await
        .map_err(|e| context.log_error(e.into()))?
        .ok_or_else(|| asset_not_found(asset_id))?;

    Ok(HttpResponse::Ok().json(json!({ "data": found })))
}

/// PUT /assets/{id}
///
/// Only the fields present in the body are changed.
pub async fn update_asset(
    path: web::Path<i64>,
    body: web::Json<UpdateAssetRequest>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let asset_id = path.into_inner();
    let user_id = claims.user_id();
    let context = ErrorContext::new("update_asset").with_user_id(user_id);
    let changes = body.into_inner().validate()?;

    let updated = asset::update(pool.get_ref(), user_id, asset_id, &changes)
        .await
        .map_err(|e| context.log_error(e.into()))?
        .ok_or_else(|| asset_not_found(asset_id))?;

    tracing::info!(request_id = %context.request_id, user_id, asset_id, "Asset updated");

    Ok(HttpResponse::Ok().json(json!({ "data": updated })))
}

/// DELETE /assets/{id}
pub async fn delete_asset(
    path: web::Path<i64>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let asset_id = path.into_inner();
    let user_id = claims.user_id();
    let context = ErrorContext::new("delete_asset").with_user_id(user_id);

    let deleted = asset::delete(pool.get_ref(), user_id, asset_id)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    if !deleted {
        return Err(asset_not_found(asset_id));
    }

    tracing::info!(request_id = %context.request_id, user_id, asset_id, "Asset deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Asset deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let request = CreateAssetRequest {
            name: " Savings ".to_string(),
            value: 1500.0,
            description: "Emergency fund".to_string(),
            fin_asset_id: 1,
            category_id: None,
        };

        let new_asset = request.validate().unwrap();
        assert_eq!(new_asset.name, "Savings");
        assert!(new_asset.category_id.is_none());
    }

    #[test]
    fn test_create_request_rejects_bad_ids() {
        let request = CreateAssetRequest {
            name: "Car".to_string(),
            value: 9000.0,
            description: "Sedan".to_string(),
            fin_asset_id: 1,
            category_id: Some(0),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_requires_a_field() {
        assert!(matches!(
            UpdateAssetRequest::default().validate(),
            Err(ValidationError::EmptyField(_))
        ));

        let request = UpdateAssetRequest {
            value: Some(42.0),
            ..Default::default()
        };
        let changes = request.validate().unwrap();
        assert_eq!(changes.value, Some(42.0));
        assert!(changes.name.is_none());
    }
}
