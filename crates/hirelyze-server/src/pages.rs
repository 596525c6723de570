//! Page handlers.
//!
//! The auth pages are public; everything else is mounted behind
//! [`crate::middleware::require_session`] and reads the signed-in user from
//! [`CurrentUser`].

use crate::actions::{self, SignInParams, SignUpParams};
use crate::api::{run_blocking, ApiError};
use crate::forms::{validate, AuthFormInput, FormType};
use crate::middleware::CurrentUser;
use crate::render::{self, CardView, Toast};
use crate::session::clear_session_cookie;
use crate::AppState;
use axum::{
    extract::{Extension, Form, Path, Query},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use hirelyze_identity::IdentityError;
use hirelyze_records::{
    get_feedback_by_interview_id, get_interview_by_id, get_interviews_by_user_id,
    get_latest_interviews, FeedbackQuery, LatestInterviewsQuery, RecordError,
};
use hirelyze_types::Interview;
use hirelyze_voice::{AgentMode, AgentProps};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::Arc;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";
const SIGN_UP_FALLBACK: &str = "Failed to create account. Please try again.";
const SIGN_IN_FALLBACK: &str = "Failed to sign in. Please try again.";

/// `?notice=` carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    fn toast(&self) -> Option<Toast> {
        self.notice.as_deref().and_then(Toast::from_notice)
    }
}

/// Attaches the viewer's feedback to each interview.
fn card_views(
    conn: &Connection,
    viewer_id: &str,
    interviews: Vec<Interview>,
) -> Result<Vec<CardView>, RecordError> {
    interviews
        .into_iter()
        .map(|interview| {
            let feedback = get_feedback_by_interview_id(
                conn,
                &FeedbackQuery {
                    interview_id: interview.id.clone(),
                    user_id: viewer_id.to_string(),
                },
            )?;
            Ok(CardView {
                interview,
                feedback,
            })
        })
        .collect()
}

/// `GET /`: the dashboard. Both lists are fetched concurrently.
pub async fn home_page(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, ApiError> {
    let own_user_id = user.id.clone();
    let latest_user_id = user.id.clone();
    let limit = state.feed_limit;

    let (own, latest) = tokio::join!(
        run_blocking(&state, move |_, conn| {
            let interviews = get_interviews_by_user_id(conn, &own_user_id)?;
            Ok(card_views(conn, &own_user_id, interviews)?)
        }),
        run_blocking(&state, move |_, conn| {
            let interviews = get_latest_interviews(
                conn,
                &LatestInterviewsQuery {
                    user_id: latest_user_id.clone(),
                    limit: Some(limit),
                },
            )?;
            Ok(card_views(conn, &latest_user_id, interviews)?)
        }),
    );

    Ok(render::home_page(&user, &own?, &latest?, query.toast().as_ref()))
}

/// `GET /interview`: the generation agent.
pub async fn interview_page(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Html<String> {
    let props = AgentProps {
        user_name: user.name,
        user_id: user.id,
        mode: AgentMode::Generate,
    };
    let agent = render::agent_panel(&props, &state.agent, &state.voice_web_token);
    render::generate_page(&agent)
}

/// `GET /interview/{id}`: a missing interview redirects to `/interview`.
pub async fn interview_detail_page(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let interview = run_blocking(&state, move |_, conn| Ok(get_interview_by_id(conn, &id)?)).await?;
    let Some(interview) = interview else {
        return Ok(Redirect::to("/interview").into_response());
    };

    let props = AgentProps {
        user_name: user.name,
        user_id: user.id,
        mode: AgentMode::Interview {
            interview_id: interview.id.clone(),
            questions: interview.questions.clone(),
        },
    };
    let agent = render::agent_panel(&props, &state.agent, &state.voice_web_token);
    Ok(render::interview_page(&interview, &agent).into_response())
}

/// `GET /interview/{id}/feedback`: a missing interview redirects to `/`.
pub async fn feedback_page(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let found = run_blocking(&state, move |_, conn| {
        let Some(interview) = get_interview_by_id(conn, &id)? else {
            return Ok(None);
        };
        let feedback = get_feedback_by_interview_id(
            conn,
            &FeedbackQuery {
                interview_id: interview.id.clone(),
                user_id: user.id,
            },
        )?;
        Ok(Some((interview, feedback)))
    })
    .await?;

    match found {
        Some((interview, feedback)) => {
            Ok(render::feedback_page(&interview, feedback.as_ref()).into_response())
        }
        None => Ok(Redirect::to("/").into_response()),
    }
}

/// `GET /sign-in`.
pub async fn sign_in_page(Query(query): Query<NoticeQuery>) -> Html<String> {
    render::auth_page(
        FormType::SignIn,
        &AuthFormInput::default(),
        &[],
        query.toast().as_ref(),
    )
}

/// `GET /sign-up`.
pub async fn sign_up_page() -> Html<String> {
    render::auth_page(FormType::SignUp, &AuthFormInput::default(), &[], None)
}

fn form_error(form: FormType, input: &AuthFormInput, message: &str) -> Response {
    render::auth_page(form, input, &[], Some(&Toast::error(message))).into_response()
}

/// Message for an identity error raised by the client half of the flow.
fn identity_failure(e: &IdentityError, fallback: &str) -> String {
    match e {
        IdentityError::Database(_)
        | IdentityError::PasswordHash(_)
        | IdentityError::Serialization(_) => {
            tracing::error!(error = %e, "identity provider failure");
            fallback.to_string()
        }
        _ => e.user_message().to_string(),
    }
}

/// `POST /sign-up`: creates the identity account, then the profile.
pub async fn sign_up_submit(
    Extension(state): Extension<Arc<AppState>>,
    Form(input): Form<AuthFormInput>,
) -> Response {
    let errors = validate(FormType::SignUp, &input);
    if !errors.is_empty() {
        return render::auth_page(FormType::SignUp, &input, &errors, None).into_response();
    }

    let submitted = input.clone();
    let result = run_blocking(&state, move |state, conn| {
        let account = match state.identity.create_user(
            conn,
            &submitted.email,
            &submitted.password,
            Some(&submitted.name),
        ) {
            Ok(account) => account,
            Err(e) => return Ok(Err(identity_failure(&e, SIGN_UP_FALLBACK))),
        };

        let response = actions::sign_up(
            state,
            conn,
            &SignUpParams {
                uid: account.uid,
                name: submitted.name,
                email: submitted.email,
            },
        );
        if response.success {
            Ok(Ok(()))
        } else {
            Ok(Err(response.message))
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Redirect::to("/sign-in?notice=account-created").into_response(),
        Ok(Err(message)) => form_error(FormType::SignUp, &input, &message),
        Err(e) => {
            tracing::error!(error = %e, "sign up form failed");
            form_error(FormType::SignUp, &input, UNEXPECTED_ERROR)
        }
    }
}

/// `POST /sign-in`: password sign-in, then the session exchange.
pub async fn sign_in_submit(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    Form(input): Form<AuthFormInput>,
) -> Response {
    let errors = validate(FormType::SignIn, &input);
    if !errors.is_empty() {
        return render::auth_page(FormType::SignIn, &input, &errors, None).into_response();
    }

    let submitted = input.clone();
    let result = run_blocking(&state, move |state, conn| {
        let id_token =
            match state
                .identity
                .sign_in_with_password(conn, &submitted.email, &submitted.password)
            {
                Ok(token) => token,
                Err(e) => return Ok(Err(identity_failure(&e, SIGN_IN_FALLBACK))),
            };

        let outcome = actions::sign_in(
            state,
            conn,
            &SignInParams {
                email: submitted.email,
                id_token,
            },
        );
        match outcome.session_cookie {
            Some(cookie) if outcome.response.success => Ok(Ok(cookie)),
            _ => Ok(Err(outcome.response.message)),
        }
    })
    .await;

    match result {
        Ok(Ok(cookie)) => (jar.add(cookie), Redirect::to("/?notice=signed-in")).into_response(),
        Ok(Err(message)) => form_error(FormType::SignIn, &input, &message),
        Err(e) => {
            tracing::error!(error = %e, "sign in form failed");
            form_error(FormType::SignIn, &input, UNEXPECTED_ERROR)
        }
    }
}

/// `POST /sign-out`.
pub async fn sign_out_submit(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let response = actions::sign_out();
    tracing::debug!(message = %response.message, "session cleared");
    (
        clear_session_cookie(jar, &state.session),
        Redirect::to("/sign-in?notice=signed-out"),
    )
}
