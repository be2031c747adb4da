//! HTTP span helpers.

use pizzeria_app::domain::identity::{Actor, Identity};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = normalise_path_for_span_name(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Who made the request, without identifying them.
pub(super) fn actor_kind(actor: Option<&Actor>) -> &'static str {
    match actor {
        None => "anonymous",
        Some(actor) if actor.is_admin() => "admin",
        Some(Actor {
            identity: Identity::User(_),
            ..
        }) => "customer",
        Some(Actor {
            identity: Identity::Guest(_),
            ..
        }) => "guest",
    }
}

/// Replace id segments so routes share one span name and metric label.
fn normalise_path_for_span_name(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}
