//! Handlers for `/websites` (owner CRUD and publishing), the public
//! `/sites/{slug}` view and the section template catalogue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopforge_core::error::CoreError;
use shopforge_core::sections::{templates, Section, SectionKind, SectionTemplate};
use shopforge_core::types::{DbId, Timestamp};
use shopforge_db::models::website::{CreateWebsite, UpdateWebsite, Website};
use shopforge_db::repositories::WebsiteRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::products::validate_slug;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest website name.
const MAX_WEBSITE_NAME_LEN: usize = 120;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

/// What visitors of a published site receive.
#[derive(Debug, Serialize)]
pub struct PublicSite {
    pub name: String,
    pub slug: String,
    pub sections: Vec<Section>,
    pub published_at: Option<Timestamp>,
}

/// GET /api/v1/sections/templates
pub async fn list_templates() -> Json<DataResponse<Vec<SectionTemplate>>> {
    Json(DataResponse { data: templates() })
}

/// GET /api/v1/websites
pub async fn list_websites(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Website>>>> {
    let sites = WebsiteRepo::list_for_owner(
        &state.pool,
        auth_user.user_id,
        shopforge_db::clamp_limit(page.limit),
        shopforge_db::clamp_offset(page.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: sites }))
}

/// POST /api/v1/websites
///
/// New websites start with a hero, a text block and a contact section.
pub async fn create_website(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<CreateWebsite>,
) -> AppResult<(StatusCode, Json<DataResponse<Website>>)> {
    validate_name(&input.name)?;
    validate_slug(&input.slug)?;

    let starter: Vec<Section> = [SectionKind::Hero, SectionKind::Text, SectionKind::Contact]
        .into_iter()
        .map(Section::from_template)
        .collect();

    let site = WebsiteRepo::create(&state.pool, auth_user.user_id, &input, &starter).await?;
    tracing::info!(website_id = site.id, owner_id = auth_user.user_id, "Website created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: site })))
}

/// GET /api/v1/websites/{id}
pub async fn get_website(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Website>>> {
    let site = load_owned_website(&state, &auth_user, id).await?;
    Ok(Json(DataResponse { data: site }))
}

/// PATCH /api/v1/websites/{id}
pub async fn update_website(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWebsite>,
) -> AppResult<Json<DataResponse<Website>>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    if let Some(slug) = &input.slug {
        validate_slug(slug)?;
    }
    load_owned_website(&state, &auth_user, id).await?;

    let site = WebsiteRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(website_not_found(id))?;
    Ok(Json(DataResponse { data: site }))
}

/// DELETE /api/v1/websites/{id}
///
/// Also drops every open editor session on the site.
pub async fn delete_website(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_website(&state, &auth_user, id).await?;
    if !WebsiteRepo::delete(&state.pool, id).await? {
        return Err(website_not_found(id));
    }
    let closed = state.editor_sessions.close_website(id).await;
    tracing::info!(website_id = id, closed_sessions = closed, "Website deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/websites/{id}/publish
///
/// Publishes the last saved document; unsaved editor changes stay private.
pub async fn set_published(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<PublishRequest>,
) -> AppResult<Json<DataResponse<Website>>> {
    let site = load_owned_website(&state, &auth_user, id).await?;
    if input.published && site.sections.0.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Eine leere Seite kann nicht veröffentlicht werden".into(),
        )));
    }

    let site = WebsiteRepo::set_published(&state.pool, id, input.published)
        .await?
        .ok_or(website_not_found(id))?;
    tracing::info!(website_id = id, published = input.published, "Website publication changed");
    Ok(Json(DataResponse { data: site }))
}

/// GET /api/v1/sites/{slug}
pub async fn get_public_site(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<PublicSite>>> {
    let site = WebsiteRepo::find_published_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Die Seite '{slug}' wurde nicht gefunden")))?;
    Ok(Json(DataResponse {
        data: PublicSite {
            name: site.name,
            slug: site.slug,
            sections: site.sections.0,
            published_at: site.published_at,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn load_owned_website(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Website> {
    let site = WebsiteRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(website_not_found(id))?;
    user.ensure_owner(site.owner_id)?;
    Ok(site)
}

pub(crate) fn website_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Webseite",
        id,
    })
}

fn validate_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_WEBSITE_NAME_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Der Name muss 1 bis {MAX_WEBSITE_NAME_LEN} Zeichen lang sein"
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_names_are_bounded() {
        assert!(validate_name("Mein Shop").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"a".repeat(MAX_WEBSITE_NAME_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(MAX_WEBSITE_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn public_site_hides_owner_details() {
        let site = PublicSite {
            name: "Shop".into(),
            slug: "shop".into(),
            sections: vec![Section::from_template(SectionKind::Hero)],
            published_at: None,
        };
        let json = serde_json::to_value(&site).unwrap();
        assert!(json.get("owner_id").is_none());
        assert_eq!(json["sections"][0]["kind"], "hero");
    }
}
