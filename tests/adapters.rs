use std::num::NonZeroUsize;

use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::IntoResponse;
use canopy::application::adapters::{AdapterError, stream_factory};
use canopy::infra::http::{ErrorReport, HTML_CONTENT_TYPE, html_response, stream_response};
use canopy::{
    Component, Node, RenderConfig, RenderError, Renderer, element, render_factory,
    render_template,
};
use http_body_util::BodyExt;
use serde_json::json;

const TEMPLATE: &str = "<!doctype html><html><body>{{content}}</body></html>";

struct Request {
    user: Option<&'static str>,
}

fn greeting(request: Request) -> Result<Node, String> {
    let user = request.user.ok_or_else(|| "missing user".to_string())?;
    Ok(element("h1").text(format!("Hello, {user}")).build())
}

#[test]
fn template_wraps_the_rendered_body() {
    let renderer = Renderer::default();
    let node = Node::from(json!({ "p": "<hi>" }));

    let document = render_template(TEMPLATE, &node, &renderer).expect("template render");
    assert_eq!(
        document,
        "<!doctype html><html><body><p>&lt;hi&gt;</p></body></html>"
    );
}

#[test]
fn template_without_placeholder_fails_before_rendering() {
    let renderer = Renderer::default();
    let broken = Node::from(Component::fallible(|_| Err("should not run".into())));

    let err = render_template("<html></html>", &broken, &renderer).expect_err("no placeholder");
    assert!(matches!(err, AdapterError::MissingPlaceholder));
}

#[test]
fn factory_output_is_rendered() {
    let renderer = Renderer::default();
    let html = render_factory(&renderer, greeting, Request { user: Some("ada") })
        .expect("factory render");
    assert_eq!(html, "<h1>Hello, ada</h1>");
}

#[test]
fn factory_and_render_failures_are_adapter_errors() {
    let renderer = Renderer::default();

    let err = render_factory(&renderer, greeting, Request { user: None }).expect_err("factory");
    assert!(matches!(err, AdapterError::Factory(_)));
    assert_eq!(err.to_string(), "factory failed to produce a node");

    let err = render_factory(
        &renderer,
        |_: ()| Ok::<_, String>(Node::from(json!({ "a": {}, "b": {} }))),
        (),
    )
    .expect_err("render");
    assert!(matches!(err, AdapterError::Render(RenderError::InvalidNode(_))));
}

#[tokio::test]
async fn html_response_sets_the_content_type() {
    let response = html_response("<p>ok</p>".to_string());

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some(HTML_CONTENT_TYPE)
    );
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&body[..], b"<p>ok</p>");
}

#[tokio::test]
async fn adapter_errors_map_to_a_generic_500() {
    let renderer = Renderer::default();
    let err = render_factory(&renderer, greeting, Request { user: None }).expect_err("factory");

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let report = response
        .extensions()
        .get::<ErrorReport>()
        .cloned()
        .expect("error report attached");
    assert_eq!(report.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        report.messages,
        [
            "factory failed to produce a node".to_string(),
            "missing user".to_string()
        ]
    );

    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&body[..], b"Internal server error");
}

#[test]
fn error_report_lists_each_cause_once() {
    let renderer = Renderer::default();
    let node = Node::from(Component::fallible(|_| Err("quota exceeded".into())).named("Usage"));
    let err = render_factory(&renderer, |()| Ok::<_, String>(node), ()).expect_err("render");

    let response = err.into_response();
    let report = response
        .extensions()
        .get::<ErrorReport>()
        .cloned()
        .expect("error report attached");
    assert_eq!(
        report.messages,
        ["render failed", "component `Usage` failed", "quota exceeded"]
    );
}

#[tokio::test]
async fn streamed_response_carries_the_whole_document() {
    let renderer = Renderer::new(RenderConfig {
        chunk_size: NonZeroUsize::new(8).expect("non-zero"),
        ..RenderConfig::default()
    });
    let items = || {
        Ok::<_, String>(
            element("ul")
                .children((1..=20).map(|i| element("li").text(i)))
                .build(),
        )
    };
    let expected = render_factory(&renderer, |()| items(), ()).expect("full render");

    let stream = stream_factory(&renderer, |()| items(), ()).expect("factory");
    let response = stream_response(stream);
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(String::from_utf8(body.to_vec()).expect("utf-8"), expected);
}

#[tokio::test]
async fn streamed_response_aborts_the_body_on_error() {
    let renderer = Renderer::default();
    let node = element("main")
        .child(Component::fallible(|_| Err("late failure".into())))
        .build();

    let response = stream_response(renderer.render_stream(node));
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}
