//! Who is calling and which dashboard they picked.
//!
//! Identity travels in private (encrypted) cookies. Protected handlers get an
//! immutable [`RequestContext`] from the auth middleware instead of reading
//! shared state.

use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, Key};
use uuid::Uuid;

pub const ACCOUNT_COOKIE: &str = "qnnect_account";
pub const PORTAL_COOKIE: &str = "qnnect_portal";

/// Key used to encrypt session cookies.
#[derive(Clone)]
pub struct SessionKey(pub Key);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    User,
    Business,
}

impl Portal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Portal::User => "user",
            Portal::Business => "business",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Portal::User),
            "business" => Some(Portal::Business),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Landing,
    RoleChooser,
    UserDashboard,
    BusinessDashboard,
}

impl Screen {
    pub fn resolve(authenticated: bool, portal: Option<Portal>) -> Self {
        match (authenticated, portal) {
            (false, _) => Screen::Landing,
            (true, None) => Screen::RoleChooser,
            (true, Some(Portal::User)) => Screen::UserDashboard,
            (true, Some(Portal::Business)) => Screen::BusinessDashboard,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub account_id: Uuid,
    pub portal: Option<Portal>,
}

impl RequestContext {
    pub fn screen(&self) -> Screen {
        Screen::resolve(true, self.portal)
    }
}

pub fn context_from_cookies(cookies: &Cookies, key: &SessionKey) -> Option<RequestContext> {
    let private = cookies.private(&key.0);
    let account_id = private.get(ACCOUNT_COOKIE)?.value().parse::<Uuid>().ok()?;
    let portal = private
        .get(PORTAL_COOKIE)
        .and_then(|cookie| Portal::parse(cookie.value()));
    Some(RequestContext { account_id, portal })
}

pub fn start_session(cookies: &Cookies, key: &SessionKey, account_id: Uuid) {
    let private = cookies.private(&key.0);
    private.add(session_cookie(ACCOUNT_COOKIE, account_id.to_string()));
    // A fresh sign-in always goes through the role chooser
    private.remove(session_cookie(PORTAL_COOKIE, String::new()));
}

pub fn choose_portal(cookies: &Cookies, key: &SessionKey, portal: Portal) {
    cookies
        .private(&key.0)
        .add(session_cookie(PORTAL_COOKIE, portal.as_str().to_string()));
}

pub fn end_session(cookies: &Cookies, key: &SessionKey) {
    let private = cookies.private(&key.0);
    private.remove(session_cookie(ACCOUNT_COOKIE, String::new()));
    private.remove(session_cookie(PORTAL_COOKIE, String::new()));
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_is_a_function_of_auth_and_portal() {
        assert_eq!(Screen::resolve(false, None), Screen::Landing);
        assert_eq!(Screen::resolve(false, Some(Portal::Business)), Screen::Landing);
        assert_eq!(Screen::resolve(true, None), Screen::RoleChooser);
        assert_eq!(Screen::resolve(true, Some(Portal::User)), Screen::UserDashboard);
        assert_eq!(
            Screen::resolve(true, Some(Portal::Business)),
            Screen::BusinessDashboard
        );
    }

    #[test]
    fn portal_round_trips_through_its_cookie_value() {
        for portal in [Portal::User, Portal::Business] {
            assert_eq!(Portal::parse(portal.as_str()), Some(portal));
        }
        assert_eq!(Portal::parse("admin"), None);
    }
}
