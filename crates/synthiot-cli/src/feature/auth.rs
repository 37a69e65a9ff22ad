/*
 * Copyright 2026 sukawasatoru
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::data::repository::{
    GetPreferencesRepository, GetSynthiotApi, PreferencesRepository, SynthiotApi,
};
use crate::model::{RegisterForm, Session};
use synthiot::prelude::*;

pub fn validate_register(form: &RegisterForm) -> Fallible<()> {
    ensure!(
        !form.name.is_empty() && !form.email.is_empty() && !form.password.is_empty(),
        "Fill all fields"
    );
    ensure!(form.password == form.confirm, "Passwords don't match");
    ensure!(
        form.password.chars().count() >= 8,
        "Password must be 8+ characters"
    );

    Ok(())
}

pub async fn register<Ctx>(context: &Ctx, form: &RegisterForm) -> Fallible<()>
where
    Ctx: GetSynthiotApi,
{
    validate_register(form)?;

    context
        .get_synthiot_api()
        .register_user(&form.name, &form.email, &form.password)
        .await?;
    info!(email = %form.email, "registered");
    println!("Account created. Run `synthiot login` to continue.");

    Ok(())
}

pub async fn login<Ctx>(context: &Ctx, email: &str, password: &str) -> Fallible<Session>
where
    Ctx: GetSynthiotApi,
    Ctx: GetPreferencesRepository,
{
    let user_id = context
        .get_synthiot_api()
        .login_user(email, password)
        .await?;

    let prefs_repo = context.get_prefs_repo();
    let mut prefs = prefs_repo.load_preferences()?;
    prefs.user_id = Some(user_id.clone());
    prefs_repo.save_preferences(&prefs)?;
    info!(%user_id, "logged in");

    Ok(Session { user_id })
}

pub fn logout<Ctx>(context: &Ctx) -> Fallible<()>
where
    Ctx: GetPreferencesRepository,
{
    let prefs_repo = context.get_prefs_repo();
    let mut prefs = prefs_repo.load_preferences()?;
    if prefs.user_id.take().is_none() {
        debug!("not logged in");
        return Ok(());
    }
    prefs_repo.save_preferences(&prefs)?;
    info!("logged out");

    Ok(())
}

/// The stored session, for commands that act on behalf of the user.
pub fn require_session<Ctx>(context: &Ctx) -> Fallible<Session>
where
    Ctx: GetPreferencesRepository,
{
    context
        .get_prefs_repo()
        .load_preferences()?
        .session()
        .context("not logged in. run `synthiot login` first")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::test_helpers::MockContext;
    use crate::model::Preferences;
    use url::Url;

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    #[test]
    fn register_validation() {
        let e = validate_register(&form("", "a@example.com", "password", "password"));
        assert_eq!("Fill all fields", e.unwrap_err().to_string());

        let e = validate_register(&form("alice", "a@example.com", "password", "passw0rd"));
        assert_eq!("Passwords don't match", e.unwrap_err().to_string());

        let e = validate_register(&form("alice", "a@example.com", "short", "short"));
        assert_eq!("Password must be 8+ characters", e.unwrap_err().to_string());

        validate_register(&form("alice", "a@example.com", "password", "password")).unwrap();
    }

    #[tokio::test]
    async fn register_invalid_form_is_not_sent() {
        let mut context = MockContext::default();
        context.api.expect_register_user().never();

        let ret = register(&context, &form("alice", "a@example.com", "short", "short")).await;
        assert!(ret.is_err());
    }

    #[tokio::test]
    async fn register_sends_form() {
        let mut context = MockContext::default();
        context
            .api
            .expect_register_user()
            .withf(|name, email, password| {
                name == "alice" && email == "a@example.com" && password == "password"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        register(&context, &form("alice", "a@example.com", "password", "password"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn login_keeps_other_preferences() {
        let base_url = Url::parse("http://192.168.1.10:8000").unwrap();

        let mut context = MockContext::default();
        context
            .api
            .expect_login_user()
            .withf(|email, password| email == "a@example.com" && password == "password")
            .times(1)
            .returning(|_, _| Ok("42".into()));
        let loaded = Preferences {
            base_url: Some(base_url.clone()),
            ..Default::default()
        };
        context
            .prefs_repo
            .expect_load_preferences()
            .times(1)
            .returning(move || Ok(loaded.clone()));
        context
            .prefs_repo
            .expect_save_preferences()
            .withf(move |prefs| {
                prefs.user_id.as_ref().map(|data| data.0.as_str()) == Some("42")
                    && prefs.base_url.as_ref() == Some(&base_url)
            })
            .times(1)
            .returning(|_| Ok(()));

        let session = login(&context, "a@example.com", "password").await.unwrap();
        assert_eq!("42", session.user_id.0);
    }

    #[tokio::test]
    async fn login_failure_stores_nothing() {
        let mut context = MockContext::default();
        context
            .api
            .expect_login_user()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("Invalid email or password")));
        context.prefs_repo.expect_save_preferences().never();

        let e = login(&context, "a@example.com", "wrong").await.unwrap_err();
        assert_eq!("Invalid email or password", e.to_string());
    }

    #[test]
    fn logout_clears_session() {
        let mut context = MockContext::default();
        context.prefs_repo.expect_load_preferences().returning(|| {
            Ok(Preferences {
                user_id: Some("42".into()),
                ..Default::default()
            })
        });
        context
            .prefs_repo
            .expect_save_preferences()
            .withf(|prefs| prefs.user_id.is_none())
            .times(1)
            .returning(|_| Ok(()));

        logout(&context).unwrap();
    }

    #[test]
    fn require_session_without_login() {
        let mut context = MockContext::default();
        context
            .prefs_repo
            .expect_load_preferences()
            .returning(|| Ok(Preferences::default()));

        let e = require_session(&context).unwrap_err();
        assert_eq!("not logged in. run `synthiot login` first", e.to_string());
    }
}
