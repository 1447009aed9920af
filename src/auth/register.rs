use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session::{self, USER_ID}, AppResult};

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    password2: String,
}

impl RegisterForm {
    /// Every problem with the form, in the order they are shown.
    fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();

        if [&self.name, &self.email, &self.password, &self.password2]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            problems.push("Please enter all fields");
        }
        if self.password != self.password2 {
            problems.push("Passwords do not match");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push("Password must be at least 6 characters");
        }

        problems
    }
}

fn register_form(name: &str, email: &str, errors: &[&str]) -> Html<String> {
    Html(
        include_res!(str, "/pages/register.html")
            .replace("{alerts}", &res::alerts(&[], errors))
            .replace("{name}", &res::escape_html(name))
            .replace("{email}", &res::escape_html(email))
    )
}

#[debug_handler]
pub(crate) async fn register_page(session: Session) -> AppResult<Response> {
    if session.get::<String>(USER_ID).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(register_form("", "", &[]).into_response())
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let name = form.name.trim();
    let email = form.email.trim();

    let problems = form.problems();
    if !problems.is_empty() {
        return Ok(register_form(name, email, &problems).into_response());
    }

    if db::users::find_local_by_email(&db_pool, email).await?.is_some() {
        return Ok(register_form(name, email, &["Email already exists"]).into_response());
    }

    let password = form.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??;
    let user = db::users::create_local(&db_pool, name, email, &password_hash).await?;
    tracing::info!(user_id = %user.id, "registered {}", user.name);

    session::sign_in(&session, &user.id).await?;
    Ok(Redirect::to("/dashboard").into_response())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn form(name: &str, email: &str, password: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password2: password2.into(),
        }
    }

    #[test]
    fn valid_form_has_no_problems() {
        assert!(form("Bob", "bob@example.com", "hunter22", "hunter22").problems().is_empty());
    }

    #[test]
    fn collects_every_problem() {
        assert_eq!(
            form("", "bob@example.com", "abc", "abd").problems(),
            ["Please enter all fields", "Passwords do not match", "Password must be at least 6 characters"]
        );
        assert_eq!(
            form("Bob", "bob@example.com", "abcdef", "abcdeg").problems(),
            ["Passwords do not match"]
        );
        assert_eq!(
            RegisterForm::default().problems(),
            ["Please enter all fields", "Password must be at least 6 characters"]
        );
    }
}
