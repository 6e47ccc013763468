use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;

use sigcolle_types::forms::{CampaignCreateForm, CampaignParams, SignatureForm};

use crate::auth::{self, AppState, AppStateInner};
use crate::campaign;
use crate::error::CampaignError;
use crate::session::{self, CurrentSession, load_session};
use crate::views::Outcome;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/campaign", post(create_campaign))
        .route("/campaign/new", get(new_campaign))
        .route("/campaign/sign", post(sign_campaign))
        .route("/campaign/{campaign_id}", get(show_campaign))
        .route("/my/campaigns", get(list_campaigns))
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}

/// Turn a handler outcome into an HTTP response, storing any flash in `jar`.
fn respond(state: &AppStateInner, jar: CookieJar, outcome: Outcome) -> Response {
    match outcome {
        Outcome::Page(view) => (jar, state.page(view)).into_response(),
        Outcome::Redirect { location, flash } => {
            let jar = match flash {
                Some(message) => session::put_flash(jar, &message),
                None => jar,
            };
            (jar, Redirect::to(&location)).into_response()
        }
        Outcome::Invalid => (StatusCode::BAD_REQUEST, jar, "Invalid").into_response(),
    }
}

async fn show_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    jar: CookieJar,
) -> Response {
    // The flash is consumed even when the page fails to render.
    let (jar, flash) = session::take_flash(jar);
    let params = CampaignParams::new(campaign_id);

    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || campaign::index(&db.db, &params, flash))
        .await
        .map_err(CampaignError::from)
        .and_then(|result| result);
    match outcome {
        Ok(outcome) => respond(&state, jar, outcome),
        Err(e) => (jar, e).into_response(),
    }
}

async fn sign_campaign(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    form: Result<Form<SignatureForm>, FormRejection>,
) -> Result<Response, CampaignError> {
    // Without a session the body is irrelevant: `sign` redirects to registration.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) if session.is_some() => return Ok(rejection.into_response()),
        Err(_) => SignatureForm::default(),
    };

    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        campaign::sign(&db.db, form, session.as_ref())
    })
    .await??;
    Ok(respond(&state, jar, outcome))
}

async fn new_campaign(State(state): State<AppState>, jar: CookieJar) -> Response {
    respond(&state, jar, campaign::new_campaign())
}

async fn create_campaign(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    Form(form): Form<CampaignCreateForm>,
) -> Result<Response, CampaignError> {
    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        campaign::create(&db.db, form, session.as_ref())
    })
    .await??;
    Ok(respond(&state, jar, outcome))
}

async fn list_campaigns(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> Result<Response, CampaignError> {
    let outcome = campaign::list_campaigns(session.as_ref())?;
    Ok(respond(&state, jar, outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use sigcolle_db::Database;
    use sigcolle_db::models::NewCampaign;
    use sigcolle_db::queries;
    use sigcolle_types::models::LoginPrincipal;

    use super::*;
    use crate::session::{FLASH_COOKIE, SESSION_COOKIE, create_token};
    use crate::views::Views;

    const SECRET: &str = "test-secret";

    struct Harness {
        state: AppState,
        user_id: i64,
        campaign_id: i64,
    }

    fn harness() -> Harness {
        let db = Database::open_in_memory().unwrap();
        let user_id = db.create_user("Hanako", "hanako@example.com", "hash").unwrap();
        let campaign_id = db
            .transaction(|tx| {
                queries::insert_campaign(
                    tx,
                    &NewCampaign {
                        title: "Quiet trains",
                        statement: "<p>Please</p>",
                        goal: 2,
                        create_user_id: user_id,
                    },
                )
            })
            .unwrap();
        let state = Arc::new(AppStateInner {
            db,
            views: Views::new().unwrap(),
            session_secret: SECRET.into(),
        });
        Harness {
            state,
            user_id,
            campaign_id,
        }
    }

    fn session_cookie_header(user_id: i64) -> String {
        let token = create_token(
            SECRET,
            &LoginPrincipal {
                user_id,
                name: "Hanako".into(),
            },
        )
        .unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    /// The `name=value` part of the flash cookie set on a response.
    fn flash_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", FLASH_COOKIE)))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    fn signature_count(h: &Harness) -> i64 {
        h.state
            .db
            .with_conn(|conn| queries::count_signatures_by_campaign_id(conn, h.campaign_id))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_campaign_id_is_400() {
        let h = harness();
        let response = router(h.state.clone())
            .oneshot(get("/campaign/abc", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid");
    }

    #[tokio::test]
    async fn flash_is_cleared_when_campaign_id_is_malformed() {
        let h = harness();
        let cookie = format!("{}=c3RhbGU", FLASH_COOKIE);
        let response = router(h.state.clone())
            .oneshot(get("/campaign/abc", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let cleared = flash_cookie(&response).expect("flash removal cookie");
        assert_eq!(cleared, format!("{}=", FLASH_COOKIE));
    }

    #[tokio::test]
    async fn flash_is_cleared_when_campaign_lookup_fails() {
        let h = harness();
        let cookie = format!("{}=c3RhbGU", FLASH_COOKIE);
        let response = router(h.state.clone())
            .oneshot(get("/campaign/999", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let cleared = flash_cookie(&response).expect("flash removal cookie");
        assert_eq!(cleared, format!("{}=", FLASH_COOKIE));
    }

    #[tokio::test]
    async fn unknown_campaign_is_server_error() {
        let h = harness();
        let response = router(h.state.clone())
            .oneshot(get("/campaign/999", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn campaign_page_shows_progress() {
        let h = harness();
        let response = router(h.state.clone())
            .oneshot(get(&format!("/campaign/{}", h.campaign_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Quiet trains"));
        assert!(body.contains("2 more supporters are needed to reach the goal of 2!"));
    }

    #[tokio::test]
    async fn sign_without_session_redirects_to_register() {
        let h = harness();
        let body = format!("campaign_id={}&name=Taro&signature_comment=hi", h.campaign_id);
        let response = router(h.state.clone())
            .oneshot(form_post("/campaign/sign", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "../../register");
        assert_eq!(signature_count(&h), 0);
    }

    #[tokio::test]
    async fn sign_without_session_ignores_unparseable_body() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/campaign/sign")
            .body(Body::from("not a form"))
            .unwrap();
        let response = router(h.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "../../register");
    }

    #[tokio::test]
    async fn sign_with_session_rejects_unparseable_body() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/campaign/sign")
            .header(header::COOKIE, session_cookie_header(h.user_id))
            .body(Body::from("not a form"))
            .unwrap();
        let response = router(h.state.clone()).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
        assert_eq!(signature_count(&h), 0);
    }

    #[tokio::test]
    async fn signature_input_is_stored_untrimmed() {
        let h = harness();
        let body = format!(
            "campaign_id={}&name=++Taro++&signature_comment=+hi+",
            h.campaign_id
        );
        let cookie = session_cookie_header(h.user_id);
        let response = router(h.state.clone())
            .oneshot(form_post("/campaign/sign", &body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let rows = h
            .state
            .db
            .with_conn(|conn| queries::select_signatures_by_campaign_id(conn, h.campaign_id))
            .unwrap();
        assert_eq!(rows[0].name, "  Taro  ");
        assert_eq!(rows[0].signature_comment.as_deref(), Some(" hi "));
    }

    #[tokio::test]
    async fn forged_session_counts_as_missing() {
        let h = harness();
        let body = format!("campaign_id={}&name=Taro", h.campaign_id);
        let cookie = format!("{}=forged", SESSION_COOKIE);
        let response = router(h.state.clone())
            .oneshot(form_post("/campaign/sign", &body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "../../register");
    }

    #[tokio::test]
    async fn invalid_signature_rerenders_campaign() {
        let h = harness();
        let body = format!(
            "campaign_id={}&name=&signature_comment=keep+this",
            h.campaign_id
        );
        let cookie = session_cookie_header(h.user_id);
        let response = router(h.state.clone())
            .oneshot(form_post("/campaign/sign", &body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("keep this"));
        assert!(html.contains("must not be blank"));
        assert_eq!(signature_count(&h), 0);
    }

    #[tokio::test]
    async fn sign_then_view_shows_flash_once() {
        let h = harness();
        let app = router(h.state.clone());
        let session = session_cookie_header(h.user_id);

        let body = format!("campaign_id={}&name=Taro&signature_comment=yes", h.campaign_id);
        let response = app
            .clone()
            .oneshot(form_post("/campaign/sign", &body, Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("/campaign/{}", h.campaign_id));
        assert_eq!(signature_count(&h), 1);

        let flash = flash_cookie(&response).expect("flash cookie set");
        let cookies = format!("{}; {}", session, flash);
        let response = app
            .clone()
            .oneshot(get(&format!("/campaign/{}", h.campaign_id), Some(&cookies)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // the flash cookie is cleared on the response that displays it
        let cleared = flash_cookie(&response).expect("flash removal cookie");
        assert_eq!(cleared, format!("{}=", FLASH_COOKIE));

        let html = body_text(response).await;
        assert!(html.contains(campaign::SIGNED_FLASH));
        assert!(html.contains("1 more supporters are needed to reach the goal of 2!"));
    }

    #[tokio::test]
    async fn create_campaign_redirects_to_new_campaign() {
        let h = harness();
        let session = session_cookie_header(h.user_id);
        let body = "title=Parks&goal=10&statement=%23+Green+spaces";
        let response = router(h.state.clone())
            .oneshot(form_post("/campaign", body, Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let new_id: i64 = location(&response)
            .strip_prefix("/campaign/")
            .and_then(|id| id.parse().ok())
            .unwrap();
        let row = h
            .state
            .db
            .with_conn(|conn| queries::select_campaign_by_id(conn, new_id))
            .unwrap();
        assert_eq!(row.statement, "<h1>Green spaces</h1>\n");
        assert!(flash_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn new_campaign_form_renders() {
        let h = harness();
        let response = router(h.state.clone())
            .oneshot(get("/campaign/new", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("action=\"/campaign\""));
    }

    #[tokio::test]
    async fn list_campaigns_is_not_implemented() {
        let h = harness();
        let session = session_cookie_header(h.user_id);
        let response = router(h.state.clone())
            .oneshot(get("/my/campaigns", Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn register_then_login() {
        let h = harness();
        let app = router(h.state.clone());

        let response = app
            .clone()
            .oneshot(form_post(
                "/register",
                "name=Jiro&email=jiro%40example.com&password=long+enough",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/campaign/new");
        assert!(response.headers().contains_key(header::SET_COOKIE));

        let response = app
            .clone()
            .oneshot(form_post(
                "/register",
                "name=Jiro&email=jiro%40example.com&password=long+enough",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("is already registered"));

        let response = app
            .clone()
            .oneshot(form_post(
                "/login",
                "email=jiro%40example.com&password=wrong+password",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Email or password is incorrect"));

        let response = app
            .oneshot(form_post(
                "/login",
                "email=jiro%40example.com&password=long+enough",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/campaign/new");
    }
}
