use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::actions::BingoService;
use crate::card::GenerateOptions;
use crate::defs::USER_ID_HEADER;
use crate::error::{ActionState, BingoError, BingoResult};
use crate::logging::{log_error, log_info};
use crate::models::{
    Card, CreateGameRequest, CreateItemsRequest, Game, GenerateCardsRequest, Item, ItemUpdate,
    MembershipRequest, Profile,
};
use crate::server::AppState;

type Reply<T> = (StatusCode, Json<ActionState<T>>);

// Rejection raised before an operation runs (missing identity and the like)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ActionState::<()>::failure(self.message))).into_response()
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// JSON body extractor whose rejections (bad syntax, wrong types, missing
/// content type) answer with the same envelope as every other failure.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                log_error(&format!("Rejected request body: {}", rejection.body_text()));
                Err(ApiError::new(rejection.status(), rejection.body_text()))
            }
        }
    }
}

fn status_for(error: &BingoError) -> StatusCode {
    match error {
        BingoError::Validation(_) => StatusCode::BAD_REQUEST,
        BingoError::LimitReached(_) => StatusCode::CONFLICT,
        BingoError::NotFound(_) => StatusCode::NOT_FOUND,
        BingoError::Persistence(_) | BingoError::Serialization(_) | BingoError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// SQLite calls block; keep them off the async workers
async fn with_service<T, F>(app_state: &Arc<AppState>, operation: F) -> BingoResult<T>
where
    F: FnOnce(&BingoService) -> BingoResult<T> + Send + 'static,
    T: Send + 'static,
{
    let app_state = Arc::clone(app_state);
    tokio::task::spawn_blocking(move || operation(&app_state.service)).await?
}

fn reply<T>(
    result: BingoResult<T>,
    ok_status: StatusCode,
    success_message: impl FnOnce(&T) -> String,
    failure_message: &str,
) -> Reply<T> {
    let status = match &result {
        Ok(_) => ok_status,
        Err(e) => status_for(e),
    };
    (status, Json(ActionState::from_result(result, success_message, failure_message)))
}

// Identity comes from the upstream provider as a header
fn user_id_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    match headers.get(USER_ID_HEADER) {
        Some(value) => match value.to_str() {
            Ok(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            _ => {
                log_error("Invalid user ID in header");
                Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid user ID in header"))
            }
        },
        None => {
            log_error(&format!("User ID header ({USER_ID_HEADER}) is required"));
            Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                format!("User ID header ({USER_ID_HEADER}) is required"),
            ))
        }
    }
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ----------------------------------------------------------------------
// Profile
// ----------------------------------------------------------------------

pub async fn handle_get_profile(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Reply<Profile>, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    Ok(reply(
        with_service(&app_state, move |service| service.get_profile(&user_id)).await,
        StatusCode::OK,
        |_| "Profile retrieved successfully".to_string(),
        "Failed to retrieve profile",
    ))
}

pub async fn handle_set_membership(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<MembershipRequest>,
) -> Result<Reply<Profile>, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    log_info(&format!("Membership change for {user_id}: {}", request.membership.as_str()));
    Ok(reply(
        with_service(&app_state, move |service| service.set_membership(&user_id, request.membership)).await,
        StatusCode::OK,
        |p| format!("Membership set to {}", p.membership.as_str()),
        "Failed to update membership",
    ))
}

// ----------------------------------------------------------------------
// Games
// ----------------------------------------------------------------------

pub async fn handle_create_game(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateGameRequest>,
) -> Result<Reply<Game>, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    log_info(&format!("Create game request from {user_id}: '{}' ({})", request.title, request.variant));
    Ok(reply(
        with_service(&app_state, move |service| service.create_game(&user_id, &request.title, &request.variant)).await,
        StatusCode::CREATED,
        |_| "Bingo game created successfully".to_string(),
        "Failed to create bingo game",
    ))
}

pub async fn handle_list_games(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Reply<Vec<Game>>, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    Ok(reply(
        with_service(&app_state, move |service| service.list_games(&user_id)).await,
        StatusCode::OK,
        |games| format!("Retrieved {} bingo games", games.len()),
        "Failed to retrieve bingo games",
    ))
}

pub async fn handle_get_game(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Reply<Game> {
    reply(
        with_service(&app_state, move |service| service.get_game(&game_id)).await,
        StatusCode::OK,
        |_| "Bingo game retrieved successfully".to_string(),
        "Failed to retrieve bingo game",
    )
}

pub async fn handle_delete_game(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Reply<()> {
    log_info(&format!("Delete game request for game: {game_id}"));
    reply(
        with_service(&app_state, move |service| service.delete_game(&game_id)).await,
        StatusCode::OK,
        |_| "Bingo game deleted successfully".to_string(),
        "Failed to delete bingo game",
    )
}

// ----------------------------------------------------------------------
// Items
// ----------------------------------------------------------------------

pub async fn handle_create_items(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    ApiJson(request): ApiJson<CreateItemsRequest>,
) -> Reply<Vec<Item>> {
    log_info(&format!("Create {} items request for game: {game_id}", request.items.len()));
    reply(
        with_service(&app_state, move |service| service.create_items(&game_id, &request.items)).await,
        StatusCode::CREATED,
        |items| format!("Created {} bingo items", items.len()),
        "Failed to create bingo items",
    )
}

pub async fn handle_list_items(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Reply<Vec<Item>> {
    reply(
        with_service(&app_state, move |service| service.list_items(&game_id)).await,
        StatusCode::OK,
        |items| format!("Retrieved {} bingo items", items.len()),
        "Failed to retrieve bingo items",
    )
}

pub async fn handle_update_item(
    State(app_state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    ApiJson(update): ApiJson<ItemUpdate>,
) -> Reply<Item> {
    reply(
        with_service(&app_state, move |service| service.update_item(&item_id, &update)).await,
        StatusCode::OK,
        |_| "Bingo item updated successfully".to_string(),
        "Failed to update bingo item",
    )
}

pub async fn handle_delete_item(
    State(app_state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Reply<()> {
    reply(
        with_service(&app_state, move |service| service.delete_item(&item_id)).await,
        StatusCode::OK,
        |_| "Bingo item deleted successfully".to_string(),
        "Failed to delete bingo item",
    )
}

// ----------------------------------------------------------------------
// Cards
// ----------------------------------------------------------------------

pub async fn handle_generate_cards(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    ApiJson(request): ApiJson<GenerateCardsRequest>,
) -> Reply<Vec<Card>> {
    log_info(&format!("Generate {} cards request for game: {game_id}", request.quantity));
    let options = GenerateOptions {
        include_free_space: request.include_free_space,
    };
    reply(
        with_service(&app_state, move |service| service.generate_cards(&game_id, request.quantity, options)).await,
        StatusCode::CREATED,
        |cards| format!("Created {} bingo cards", cards.len()),
        "Failed to generate bingo cards",
    )
}

pub async fn handle_list_cards(
    State(app_state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Reply<Vec<Card>> {
    reply(
        with_service(&app_state, move |service| service.list_cards(&game_id)).await,
        StatusCode::OK,
        |cards| format!("Retrieved {} bingo cards", cards.len()),
        "Failed to retrieve bingo cards",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderName, Request as HttpRequest};
    use crate::config::ServerConfig;
    use crate::models::{NewItem, Tier};
    use crate::store::Database;

    // Helper function to create test app state
    fn create_test_app_state() -> Arc<AppState> {
        let config = ServerConfig::default();
        let service = BingoService::new(Database::open_in_memory().unwrap(), config.plan_limits());
        Arc::new(AppState { service })
    }

    fn user_headers(user_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(USER_ID_HEADER.as_bytes()).unwrap();
        headers.insert(name, user_id.parse().unwrap());
        headers
    }

    async fn create_test_game(app_state: &Arc<AppState>, variant: &str) -> Game {
        let request = CreateGameRequest { title: "Test game".to_string(), variant: variant.to_string() };
        let (status, Json(state)) =
            handle_create_game(State(app_state.clone()), user_headers("host"), ApiJson(request))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        state.data.unwrap()
    }

    async fn add_items(app_state: &Arc<AppState>, game_id: &str, count: usize, mandatory: bool) -> Reply<Vec<Item>> {
        let items = (0..count).map(|i| NewItem::new(&format!("Item {mandatory} {i}"), mandatory)).collect();
        handle_create_items(
            State(app_state.clone()),
            Path(game_id.to_string()),
            ApiJson(CreateItemsRequest { items }),
        )
        .await
    }

    #[tokio::test]
    async fn test_create_game_requires_user_header() {
        let app_state = create_test_app_state();
        let request = CreateGameRequest { title: "t".into(), variant: "5x5".into() };
        let result = handle_create_game(State(app_state), HeaderMap::new(), ApiJson(request)).await;

        let error = result.unwrap_err();
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        assert!(error.message.contains(USER_ID_HEADER));
    }

    #[tokio::test]
    async fn test_create_and_list_games() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "5×5 Standard").await;
        assert_eq!(game.owner_id, "host");

        let (status, Json(state)) = handle_list_games(State(app_state.clone()), user_headers("host")).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(state.is_success);
        assert_eq!(state.data.unwrap().len(), 1);

        let (_, Json(state)) = handle_list_games(State(app_state), user_headers("other")).await.unwrap();
        assert!(state.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_game_validation_failure() {
        let app_state = create_test_app_state();
        let request = CreateGameRequest { title: "".into(), variant: "5x5".into() };
        let (status, Json(state)) =
            handle_create_game(State(app_state), user_headers("host"), ApiJson(request)).await.unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!state.is_success);
        assert_eq!(state.message, "Title and variant required");
    }

    #[tokio::test]
    async fn test_item_limit_reached() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "5x5").await;

        let (status, _) = add_items(&app_state, &game.id, 74, false).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, Json(state)) = add_items(&app_state, &game.id, 2, false).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!state.is_success);
        assert!(state.message.contains("Item limit reached"));

        let (_, Json(state)) = handle_list_items(State(app_state), Path(game.id)).await;
        assert_eq!(state.data.unwrap().len(), 74);
    }

    #[tokio::test]
    async fn test_generate_and_list_cards() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "5x5").await;
        add_items(&app_state, &game.id, 2, true).await;
        add_items(&app_state, &game.id, 30, false).await;

        let request = GenerateCardsRequest { quantity: 4, include_free_space: true };
        let (status, Json(state)) =
            handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(state.message, "Created 4 bingo cards");

        let (_, Json(state)) = handle_list_cards(State(app_state), Path(game.id)).await;
        let cards = state.data.unwrap();
        assert_eq!(cards.len(), 4);
        for card in cards {
            assert_eq!(card.layout.len(), 25);
            assert_eq!(card.layout.items[12].label, "FREE SPACE");
        }
    }

    #[tokio::test]
    async fn test_generate_cards_limit_exceeded() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "3x3").await;
        add_items(&app_state, &game.id, 9, false).await;

        let request = GenerateCardsRequest { quantity: 48, include_free_space: false };
        let (status, _) =
            handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request)).await;
        assert_eq!(status, StatusCode::CREATED);

        let request = GenerateCardsRequest { quantity: 5, include_free_space: false };
        let (status, Json(state)) =
            handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(state.message.contains("Card limit exceeded"));

        let (_, Json(state)) = handle_list_cards(State(app_state.clone()), Path(game.id.clone())).await;
        assert_eq!(state.data.unwrap().len(), 48);

        // Upgrading lifts the ceiling
        let (status, _) = handle_set_membership(
            State(app_state.clone()),
            user_headers("host"),
            ApiJson(MembershipRequest { membership: Tier::Pro }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);

        let request = GenerateCardsRequest { quantity: 5, include_free_space: false };
        let (status, _) = handle_generate_cards(State(app_state), Path(game.id), ApiJson(request)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_generate_cards_failures() {
        let app_state = create_test_app_state();
        let request = GenerateCardsRequest { quantity: 1, include_free_space: false };
        let (status, Json(state)) =
            handle_generate_cards(State(app_state.clone()), Path("nope".into()), ApiJson(request.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.message.contains("not found"));

        let game = create_test_game(&app_state, "5x5").await;
        let (status, Json(state)) =
            handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.message.contains("No items found"));

        add_items(&app_state, &game.id, 5, false).await;
        let (status, Json(state)) =
            handle_generate_cards(State(app_state), Path(game.id), ApiJson(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.message.contains("Insufficient items"));
    }

    #[tokio::test]
    async fn test_delete_game_cascades() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "3x3").await;
        add_items(&app_state, &game.id, 9, false).await;
        let request = GenerateCardsRequest { quantity: 2, include_free_space: true };
        handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request)).await;

        let (status, Json(state)) = handle_delete_game(State(app_state.clone()), Path(game.id.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.is_success);

        let db = app_state.service.database();
        assert_eq!(db.count_items(&game.id).unwrap(), 0);
        assert_eq!(db.count_cards(&game.id).unwrap(), 0);

        let (status, _) = handle_get_game(State(app_state.clone()), Path(game.id.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = handle_delete_game(State(app_state), Path(game.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_and_delete_item() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "5x5").await;
        let (_, Json(state)) = add_items(&app_state, &game.id, 1, false).await;
        let item = state.data.unwrap().remove(0);

        let update = ItemUpdate { label: Some("Renamed".into()), image_url: None, is_mandatory: Some(true) };
        let (status, Json(state)) =
            handle_update_item(State(app_state.clone()), Path(item.id.clone()), ApiJson(update)).await;
        assert_eq!(status, StatusCode::OK);
        let updated = state.data.unwrap();
        assert_eq!(updated.label, "Renamed");
        assert!(updated.is_mandatory);

        let (status, _) = handle_delete_item(State(app_state.clone()), Path(item.id.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, Json(state)) = handle_delete_item(State(app_state), Path(item.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!state.is_success);
    }

    #[tokio::test]
    async fn test_profile_routes() {
        let app_state = create_test_app_state();
        let (status, _) = handle_get_profile(State(app_state.clone()), user_headers("newcomer")).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        create_test_game(&app_state, "5x5").await;
        let (status, Json(state)) = handle_get_profile(State(app_state), user_headers("host")).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.data.unwrap().membership, Tier::Free);
    }

    async fn reject_body(content_type: Option<&str>, body: &str) -> (StatusCode, ActionState<()>) {
        let mut builder = HttpRequest::builder().method("POST").uri("/games/x/cards");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let error = ApiJson::<GenerateCardsRequest>::from_request(request, &()).await.unwrap_err();
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_bodies_answer_with_envelope() {
        let (status, state) = reject_body(Some("application/json"), r#"{"quantity": -5}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!state.is_success);
        assert!(state.message.contains("quantity"));
        assert!(state.data.is_none());

        let (status, state) = reject_body(Some("application/json"), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!state.is_success);

        let (status, state) = reject_body(None, r#"{"quantity": 1}"#).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(!state.is_success);
    }

    #[tokio::test]
    async fn test_well_formed_body_is_extracted() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/games/x/cards")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"quantity": 3, "includeFreeSpace": true}"#))
            .unwrap();
        let ApiJson(body) = ApiJson::<GenerateCardsRequest>::from_request(request, &()).await.unwrap();
        assert_eq!(body.quantity, 3);
        assert!(body.include_free_space);
    }

    #[tokio::test]
    async fn test_oversized_card_request_is_rejected() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "3x3").await;
        add_items(&app_state, &game.id, 9, false).await;
        handle_set_membership(
            State(app_state.clone()),
            user_headers("host"),
            ApiJson(MembershipRequest { membership: Tier::Pro }),
        )
        .await
        .unwrap();

        let request = GenerateCardsRequest { quantity: usize::MAX, include_free_space: false };
        let (status, Json(state)) =
            handle_generate_cards(State(app_state.clone()), Path(game.id.clone()), ApiJson(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!state.is_success);

        let (_, Json(state)) = handle_list_cards(State(app_state), Path(game.id)).await;
        assert!(state.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_blocking_task_is_reported_generically() {
        let join_error = tokio::task::spawn_blocking::<_, ()>(|| panic!("worker died")).await.unwrap_err();
        let (status, Json(state)) =
            reply::<()>(Err(join_error.into()), StatusCode::OK, |_| String::new(), "Failed to retrieve bingo game");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.message, "Failed to retrieve bingo game");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handlers_on_multi_thread_runtime() {
        let app_state = create_test_app_state();
        let game = create_test_game(&app_state, "3x3").await;
        let (status, Json(state)) = handle_get_game(State(app_state), Path(game.id.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.data.unwrap().id, game.id);
    }

    #[tokio::test]
    async fn test_api_error_body_is_action_state() {
        let response = ApiError::new(StatusCode::UNAUTHORIZED, "nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
