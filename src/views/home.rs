//! Landing page.

use axum::{
    body::Body,
    http::Request,
    response::{Html, IntoResponse, Response},
};

use crate::http::response::{require_method, ViewError, GET_HEAD};
use crate::http::server::AppState;
use crate::routing::Params;
use crate::views::page;

/// Links to every enabled route that takes no parameters.
pub async fn home(state: AppState, request: Request<Body>) -> Result<Response, ViewError> {
    require_method(request.method(), GET_HEAD)?;

    let table = state.routes.load();
    let links: String = table
        .iter()
        .filter(|route| route.is_enabled() && route.name() != "home")
        .filter_map(|route| {
            table
                .reverse(route.name(), &Params::new())
                .ok()
                .map(|url| format!("<li><a href=\"{url}\">{}</a></li>\n", route.name()))
        })
        .collect();

    Ok(Html(page("Dehaze server", &format!("<ul>\n{links}</ul>"))).into_response())
}
