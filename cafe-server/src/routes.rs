//! Drink resource handlers.
//!
//! A non-numeric `{id}` is rejected as 404 before anything else, matching an
//! unmatched route. Protected handlers then take an [`Authorized`] extractor,
//! so an unauthorized request is rejected before any lookup or body parsing.

use cafe_core::http::header::Parts;
use cafe_core::http::{Bytes, FromRequestParts, Json, Path, State};
use cafe_core::{validate_body, HealthReport, HttpError};
use cafe_data::{DataError, Drink, DrinkPatch, DrinkRepository, NewDrink, Repository};
use cafe_security::Authorized;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::permissions::{DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks};

/// Numeric drink id from the `{id}` path segment. Anything else is a 404,
/// as if the route had not matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrinkId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for DrinkId {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| HttpError::NotFound("Resource Not Found".into()))?;
        raw.parse()
            .map(DrinkId)
            .map_err(|_| HttpError::NotFound("Resource Not Found".into()))
    }
}

pub async fn health(State(drinks): State<DrinkRepository>) -> HealthReport {
    let database = cafe_data::ping(drinks.pool())
        .await
        .map_err(|e| e.to_string());
    HealthReport::new().check("database", database)
}

/// `GET /drinks`: every drink in short form. Public.
pub async fn list_drinks(State(drinks): State<DrinkRepository>) -> Result<Json<Value>, HttpError> {
    let drinks = drinks.find_all().await?;
    let short: Vec<_> = drinks.iter().map(Drink::short).collect();
    Ok(Json(json!({ "success": true, "drinks": short })))
}

/// `GET /drinks-detail`: every drink in long form.
pub async fn list_drinks_detail(
    _auth: Authorized<GetDrinksDetail>,
    State(drinks): State<DrinkRepository>,
) -> Result<Json<Value>, HttpError> {
    let drinks = drinks.find_all().await?;
    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// `POST /drinks`
pub async fn create_drink(
    auth: Authorized<PostDrinks>,
    State(drinks): State<DrinkRepository>,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let body = json_object(&body)?;
    if !body.contains_key("recipe") || !body.contains_key("title") {
        return Err(HttpError::BadRequest(
            "Invalid JSON, \"recipe\" or \"title\" key is not present".into(),
        ));
    }

    let new: NewDrink = from_object(body)?;
    validate_body(&new)?;

    if drinks.find_by_title(&new.title).await?.is_some() {
        return Err(already_exists(&new.title));
    }

    let drink = drinks
        .insert(&new)
        .await
        .map_err(|e| title_conflict(e, &new.title))?;
    info!(id = drink.id, title = %drink.title, sub = ?auth.claims().subject(), "Drink created");
    Ok(Json(json!({ "success": true, "drinks": [drink] })))
}

/// `PATCH /drinks/{id}`: rename a drink and optionally replace its recipe.
pub async fn update_drink(
    DrinkId(id): DrinkId,
    auth: Authorized<PatchDrinks>,
    State(drinks): State<DrinkRepository>,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let body = json_object(&body)?;

    let mut drink = drinks
        .find_by_id(id)
        .await?
        .ok_or_else(|| drink_not_found(id))?;

    if matches!(body.get("title"), None | Some(Value::Null)) {
        return Err(HttpError::BadRequest(
            "JSON error, \"Title\" key is not present".into(),
        ));
    }

    let patch: DrinkPatch = from_object(body)?;
    validate_body(&patch)?;

    let taken = drinks
        .find_by_title(&patch.title)
        .await?
        .is_some_and(|other| other.id != id);
    if taken {
        return Err(already_exists(&patch.title));
    }

    patch.apply_to(&mut drink);
    let drink = drinks
        .update(&drink)
        .await
        .map_err(|e| title_conflict(e, &drink.title))?;
    info!(id, title = %drink.title, sub = ?auth.claims().subject(), "Drink updated");
    Ok(Json(json!({ "success": true, "drinks": [drink] })))
}

/// `DELETE /drinks/{id}`
pub async fn delete_drink(
    DrinkId(id): DrinkId,
    auth: Authorized<DeleteDrinks>,
    State(drinks): State<DrinkRepository>,
) -> Result<Json<Value>, HttpError> {
    if !drinks.delete(id).await? {
        return Err(drink_not_found(id));
    }
    info!(id, sub = ?auth.claims().subject(), "Drink deleted");
    Ok(Json(json!({ "success": true, "deleted": id })))
}

/// Parse a request body that must be a non-empty JSON object.
///
/// An empty body, `null`, `{}` and `[]` all count as empty.
fn json_object(body: &[u8]) -> Result<Map<String, Value>, HttpError> {
    let empty = || HttpError::BadRequest("JSON passed is empty".into());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(empty());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.is_empty() => Err(empty()),
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Err(empty()),
        Ok(Value::Array(items)) if items.is_empty() => Err(empty()),
        Ok(_) => Err(HttpError::BadRequest("JSON body must be an object".into())),
        Err(e) => Err(HttpError::BadRequest(format!("Malformed JSON: {e}"))),
    }
}

fn from_object<T: serde::de::DeserializeOwned>(body: Map<String, Value>) -> Result<T, HttpError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| HttpError::BadRequest(format!("Invalid drink: {e}")))
}

fn drink_not_found(id: i64) -> HttpError {
    HttpError::NotFound(format!("No drink found with the id \"{id}\""))
}

fn already_exists(title: &str) -> HttpError {
    HttpError::Conflict(format!("Drink with name {title} already exists."))
}

/// A unique violation on write means another request took the title after
/// the lookup.
fn title_conflict(err: DataError, title: &str) -> HttpError {
    match err {
        DataError::Conflict(_) => already_exists(title),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: HttpError) -> String {
        match err {
            HttpError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other}"),
        }
    }

    #[test]
    fn empty_bodies() {
        for body in ["", "  \n", "{}", "null", "[]"] {
            assert_eq!(message(json_object(body.as_bytes()).unwrap_err()), "JSON passed is empty");
        }
    }

    #[test]
    fn non_object_body() {
        let err = json_object(b"[1, 2]").unwrap_err();
        assert_eq!(message(err), "JSON body must be an object");
    }

    #[test]
    fn malformed_body() {
        let err = json_object(b"{\"title\": ").unwrap_err();
        assert!(message(err).starts_with("Malformed JSON"));
    }

    #[tokio::test]
    async fn unique_violation_on_insert_reads_as_taken_title() {
        let pool = cafe_data::connect("sqlite::memory:").await.unwrap();
        cafe_data::reset_and_seed(&pool).await.unwrap();
        let drinks = DrinkRepository::new(pool);

        let dup: NewDrink = serde_json::from_value(json!({
            "title": "water",
            "recipe": [{ "name": "water", "color": "blue", "parts": 1 }],
        }))
        .unwrap();
        let err = drinks.insert(&dup).await.unwrap_err();
        assert!(matches!(err, DataError::Conflict(_)));

        match title_conflict(err, &dup.title) {
            HttpError::Conflict(msg) => assert_eq!(msg, "Drink with name water already exists."),
            other => panic!("expected Conflict, got {other}"),
        }
    }

    #[test]
    fn other_data_errors_pass_through() {
        let err = title_conflict(DataError::Other("bad row".into()), "water");
        assert!(matches!(err, HttpError::Internal(_)));
    }

    #[test]
    fn object_body_is_returned() {
        let map = json_object(br#"{"title": "mocha"}"#).unwrap();
        assert_eq!(map["title"], "mocha");
    }
}
