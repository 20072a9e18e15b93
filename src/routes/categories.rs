use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::AccessClaims;
use crate::domain::category::{self, CategoryFilter, CategoryType, NewCategory};
use crate::error::{AppError, ErrorContext};
use crate::routes::financial_assets::non_empty;
use crate::validators::{is_valid_description, is_valid_name};

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category_type: String,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub name: Option<String>,
}

/// POST /categories
pub async fn create_category(
    body: web::Json<CreateCategoryRequest>,
    claims: web::ReqData<AccessClaims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_category").with_user_id(claims.user_id());

    let new_category = NewCategory {
        name: is_valid_name("name", &body.name)?,
        description: is_valid_description("description", &body.description)?,
        category_type: CategoryType::parse(&body.category_type)?,
    };

    let created = category::create(pool.get_ref(), &new_category)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        category_id = created.id,
        "Category created"
    );

    Ok(HttpResponse::Created().json(json!({ "data": created })))
}

/// GET /categories?type=&name=
pub async fn list_categories(
    query: web::Query<CategoryQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("list_categories");
    let query = query.into_inner();

    let category_type = match non_empty(query.category_type) {
        Some(t) => Some(CategoryType::parse(&t)?),
        None => None,
    };
    let filter = CategoryFilter {
        category_type,
        name: non_empty(query.name),
    };

    let categories = category::list(pool.get_ref(), &filter)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(json!({ "data": categories })))
}
