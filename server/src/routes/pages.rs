//! Server-rendered pages behind the route guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages carry little content. Every protected path runs through
//! `RouteGuard`, and navigation links are shown or hidden with `Gate`.
//! Labels come from a two-locale table.

use axum::Extension;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use storefront::guard::LOGIN_PATH;
use storefront::locale::{localized_path, split_locale};
use storefront::{AuthView, Gate, GuardView, Locale, Requirement, Role, RouteGuard, Session, UserType};

use super::auth::CurrentSession;

pub const USERS_MANAGE: &str = "users.manage";
pub const REVENUE_VIEW: &str = "revenue.view";

// =============================================================================
// LABELS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Home,
    Welcome,
    Login,
    LoginHint,
    Account,
    Admin,
    AdminUsers,
    Revenue,
    Business,
    OwnerTools,
    Unauthorized,
    UnauthorizedHint,
    Loading,
    NotFound,
}

#[must_use]
pub fn label(locale: Locale, key: Label) -> &'static str {
    match (locale, key) {
        (Locale::Vi, Label::Home) => "Trang chủ",
        (Locale::En, Label::Home) => "Home",
        (Locale::Vi, Label::Welcome) => "Chào mừng đến sàn đấu giá",
        (Locale::En, Label::Welcome) => "Welcome to the auction floor",
        (Locale::Vi, Label::Login) => "Đăng nhập",
        (Locale::En, Label::Login) => "Log in",
        (Locale::Vi, Label::LoginHint) => "Vui lòng đăng nhập để tiếp tục.",
        (Locale::En, Label::LoginHint) => "Please log in to continue.",
        (Locale::Vi, Label::Account) => "Tài khoản",
        (Locale::En, Label::Account) => "Account",
        (Locale::Vi, Label::Admin) => "Quản trị",
        (Locale::En, Label::Admin) => "Admin",
        (Locale::Vi, Label::AdminUsers) => "Người dùng",
        (Locale::En, Label::AdminUsers) => "Users",
        (Locale::Vi, Label::Revenue) => "Doanh thu",
        (Locale::En, Label::Revenue) => "Revenue",
        (Locale::Vi, Label::Business) => "Doanh nghiệp",
        (Locale::En, Label::Business) => "Business",
        (Locale::Vi, Label::OwnerTools) => "Công cụ chủ doanh nghiệp",
        (Locale::En, Label::OwnerTools) => "Owner tools",
        (Locale::Vi, Label::Unauthorized) => "Không có quyền truy cập",
        (Locale::En, Label::Unauthorized) => "Access denied",
        (Locale::Vi, Label::UnauthorizedHint) => "Tài khoản của bạn không được phép xem trang này.",
        (Locale::En, Label::UnauthorizedHint) => "Your account may not view this page.",
        (Locale::Vi, Label::Loading) => "Đang tải…",
        (Locale::En, Label::Loading) => "Loading…",
        (Locale::Vi, Label::NotFound) => "Không tìm thấy trang",
        (Locale::En, Label::NotFound) => "Page not found",
    }
}

// =============================================================================
// PAGE REQUIREMENTS
// =============================================================================

#[must_use]
pub fn account_requirement() -> Requirement {
    Requirement::authenticated()
}

#[must_use]
pub fn admin_requirement() -> Requirement {
    Requirement::authenticated().user_type(UserType::Admin)
}

#[must_use]
pub fn admin_users_requirement() -> Requirement {
    admin_requirement().capability(USERS_MANAGE)
}

#[must_use]
pub fn business_requirement() -> Requirement {
    Requirement::authenticated().user_type(UserType::Business)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /{locale}`
pub async fn home(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    let body = format!("<p>{}</p>", label(locale, Label::Welcome));
    Html(layout(locale, &session, Label::Home, &body)).into_response()
}

/// `GET /{locale}/login`
pub async fn login(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    if session.is_authenticated {
        return Redirect::temporary(&localized_path(locale, "/account")).into_response();
    }
    let body = format!(
        "<p>{}</p><form method=\"post\" action=\"/api/auth/login\">\
         <input name=\"email\" type=\"email\"><input name=\"password\" type=\"password\">\
         <button type=\"submit\">{}</button></form>",
        label(locale, Label::LoginHint),
        label(locale, Label::Login),
    );
    Html(layout(locale, &session, Label::Login, &body)).into_response()
}

/// `GET /{locale}/unauthorized`
pub async fn unauthorized(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    let body = format!("<p>{}</p>", label(locale, Label::UnauthorizedHint));
    (StatusCode::FORBIDDEN, Html(layout(locale, &session, Label::Unauthorized, &body))).into_response()
}

/// `GET /{locale}/account`
pub async fn account(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    guarded(locale, &session, account_requirement(), Label::Account, |s| {
        let user = s.user.as_ref().map(|u| (u.display_name(), u.email.as_str(), u.user_type.as_str()));
        let (name, email, user_type) = user.unwrap_or_default();
        format!(
            "<dl><dt>{}</dt><dd>{}</dd><dt>Email</dt><dd>{}</dd><dt>Type</dt><dd>{}</dd></dl>",
            label(locale, Label::Account),
            escape_html(name),
            escape_html(email),
            user_type,
        )
    })
}

/// `GET /{locale}/admin`
pub async fn admin(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    guarded(locale, &session, admin_requirement(), Label::Admin, |s| {
        let users = Gate::new(Requirement::authenticated().capability(USERS_MANAGE)).render_or_empty(s, || {
            link(locale, "/admin/users", label(locale, Label::AdminUsers))
        });
        let revenue = Gate::new(Requirement::authenticated().capability(REVENUE_VIEW))
            .render_or_empty(s, || format!("<section>{}</section>", label(locale, Label::Revenue)));
        format!("<ul>{users}</ul>{revenue}")
    })
}

/// `GET /{locale}/admin/users`
pub async fn admin_users(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    guarded(locale, &session, admin_users_requirement(), Label::AdminUsers, |_| {
        format!("<table><caption>{}</caption></table>", label(locale, Label::AdminUsers))
    })
}

/// `GET /{locale}/business`
pub async fn business(Extension(locale): Extension<Locale>, CurrentSession(session): CurrentSession) -> Response {
    guarded(locale, &session, business_requirement(), Label::Business, |s| {
        let company = s
            .user
            .as_ref()
            .and_then(|u| u.company_name.as_deref())
            .unwrap_or_default();
        let owner_tools = Gate::new(Requirement::authenticated().role(Role::CompanyOwner))
            .render_or_empty(s, || format!("<section>{}</section>", label(locale, Label::OwnerTools)));
        format!("<h2>{}</h2>{owner_tools}", escape_html(company))
    })
}

/// Fallback for unknown localized paths.
pub async fn not_found(uri: Uri) -> Response {
    let locale = split_locale(uri.path()).0.unwrap_or_default();
    (StatusCode::NOT_FOUND, Html(format!("<h1>{}</h1>", label(locale, Label::NotFound)))).into_response()
}

// =============================================================================
// RENDERING
// =============================================================================

fn guarded(
    locale: Locale,
    session: &Session,
    requirement: Requirement,
    title: Label,
    body: impl FnOnce(&Session) -> String,
) -> Response {
    let mut guard = RouteGuard::new(requirement, locale);
    let step = guard.evaluate(AuthView::Ready(session));
    match (step.view, step.redirect) {
        (GuardView::Content, _) => Html(layout(locale, session, title, &body(session))).into_response(),
        (GuardView::Loading, _) => {
            let body = format!("<p>{}</p>", label(locale, Label::Loading));
            Html(layout(locale, session, title, &body)).into_response()
        }
        (GuardView::Blank, Some(target)) => Redirect::temporary(&target).into_response(),
        (GuardView::Blank, None) => StatusCode::NO_CONTENT.into_response(),
    }
}

fn layout(locale: Locale, session: &Session, title: Label, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"{locale}\"><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><nav>{nav}</nav><main><h1>{title}</h1>{body}</main></body></html>",
        title = label(locale, title),
        nav = nav(locale, session),
    )
}

fn nav(locale: Locale, session: &Session) -> String {
    let home = link(locale, "/", label(locale, Label::Home));
    let admin = Gate::new(admin_requirement()).render_or_empty(session, || link(locale, "/admin", label(locale, Label::Admin)));
    let business = Gate::new(business_requirement())
        .render_or_empty(session, || link(locale, "/business", label(locale, Label::Business)));
    let account = Gate::new(account_requirement()).render(
        session,
        || {
            let name = session.user.as_ref().map(|u| u.display_name()).unwrap_or_default();
            format!("<a href=\"{}\">{}</a>", localized_path(locale, "/account"), escape_html(name))
        },
        || link(locale, LOGIN_PATH, label(locale, Label::Login)),
    );
    format!("{home}{admin}{business}{account}")
}

fn link(locale: Locale, path: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", localized_path(locale, path), escape_html(text))
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
