//! End-to-end behavior of mounts inside composed apps.

mod common;

use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use siren_mount::routing::RawCaptures;
use siren_mount::{
    from_fn, mount, App, BoxError, Context, Matcher, Mount, MountPath, ParamKey, PathPattern,
};

use common::{append, get, no_content, prepend_after};

fn body_if_path(expected: &'static str, body: &'static str) -> impl siren_mount::IntoMiddleware {
    from_fn(move |ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            if ctx.path == expected {
                ctx.set_body(body);
            }
            Ok(())
        })
    })
}

#[tokio::test]
async fn test_mounts_at_root() {
    let mut a = App::new();
    a.use_middleware(body_if_path("/hello", "Hello"));
    let mut b = App::new();
    b.use_middleware(body_if_path("/world", "World"));

    let mut app = App::new();
    app.use_middleware(mount("/", a).unwrap());
    app.use_middleware(Mount::root(b));

    assert_eq!(get(&app, "/").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/hello").await.body, "Hello");
    assert_eq!(get(&app, "/world").await.body, "World");
}

fn record_path(label: &'static str) -> impl siren_mount::IntoMiddleware {
    from_fn(move |ctx, next| {
        Box::pin(async move {
            let seen = format!("{label}{}", ctx.path);
            ctx.append_body(&seen);
            next.run(ctx).await?;
            assert_eq!(ctx.params.get("keep"), Some("1"));
            Ok(())
        })
    })
}

#[tokio::test]
async fn test_root_mount_leaves_path_and_params_untouched() {
    let mut sub = App::new();
    sub.use_middleware(record_path("a")).use_middleware(record_path("b"));

    let mut app = App::new();
    app.use_middleware(mount("/", sub).unwrap());
    app.use_middleware(record_path("c"));

    let mut ctx = Context::new(Method::GET, "/x/y");
    ctx.params.insert("keep", "1");
    app.call(&mut ctx).await.unwrap();

    assert_eq!(ctx.body_text(), Some("a/x/yb/x/yc/x/y"));
    assert_eq!(ctx.path, "/x/y");
    assert_eq!(ctx.params.get("keep"), Some("1"));
    assert_eq!(ctx.params.len(), 1);
}

#[tokio::test]
async fn test_mounts_regular_expression() {
    let mut a = App::new();
    a.use_fn(|ctx, _next| {
        Box::pin(async move {
            assert_eq!(ctx.params.get_index(0), Some("abc"));
            assert_eq!(ctx.path, "/");
            ctx.set_status(StatusCode::NO_CONTENT);
            Ok(())
        })
    });

    let regex = fancy_regex::Regex::new(r"(?i)/([^/]+)/?").unwrap();
    let pattern = PathPattern::from_regex(regex);

    let mut app = App::new();
    app.use_middleware(Mount::with_path(MountPath::from(pattern), a));

    assert_eq!(get(&app, "/abc").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cascades_nested_mounts() {
    let mut c = App::new();
    c.use_middleware(prepend_after("baz"));
    let mut b = App::new();
    b.use_middleware(prepend_after("bar"));
    b.use_middleware(mount("/baz", c).unwrap());
    let mut a = App::new();
    a.use_middleware(prepend_after("foo"));
    a.use_middleware(mount("/bar", b).unwrap());

    let mut app = App::new();
    app.use_middleware(mount("/foo", a).unwrap());

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");
    assert_eq!(get(&app, "/foo/bar/baz").await.body, "foobarbaz");
}

#[tokio::test]
async fn test_innermost_mount_sees_root_path() {
    let mut c = App::new();
    c.use_fn(|ctx, _next| {
        Box::pin(async move {
            assert_eq!(ctx.path, "/");
            assert_eq!(ctx.original_path(), "/foo/bar/baz");
            ctx.set_body("deep");
            Ok(())
        })
    });
    let mut b = App::new();
    b.use_middleware(mount("/baz", c).unwrap());
    let mut a = App::new();
    a.use_middleware(mount("/bar", b).unwrap());
    let mut app = App::new();
    app.use_middleware(mount("/foo", a).unwrap());

    let outcome = get(&app, "/foo/bar/baz").await;
    assert_eq!(outcome.body, "deep");
    assert_eq!(outcome.path, "/foo/bar/baz");
}

#[tokio::test]
async fn test_restores_prefix_for_mounted_apps() {
    let mut a = App::new();
    a.use_middleware(append("foo"));
    let mut b = App::new();
    b.use_middleware(append("bar"));
    let mut c = App::new();
    c.use_middleware(append("baz"));

    let mut app = App::new();
    app.use_middleware(mount("/foo", a).unwrap());
    app.use_middleware(mount("/foo/bar", b).unwrap());
    app.use_middleware(mount("/foo/bar/baz", c).unwrap());

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");
    assert_eq!(get(&app, "/foo/bar/baz").await.body, "foobarbaz");
}

#[tokio::test]
async fn test_restores_prefix_for_mounted_middleware() {
    let mut app = App::new();
    app.use_middleware(mount("/foo", append("foo")).unwrap());
    app.use_middleware(mount("/foo/bar", append("bar")).unwrap());
    app.use_middleware(mount("/foo/bar/baz", append("baz")).unwrap());

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");
    assert_eq!(get(&app, "/foo/bar/baz").await.body, "foobarbaz");
}

async fn assert_paths_around_next(prefix: &str) {
    let mut a = App::new();
    a.use_fn(|ctx, next| {
        Box::pin(async move {
            assert_eq!(ctx.path, "/");
            next.run(ctx).await?;
            assert_eq!(ctx.path, "/");
            Ok(())
        })
    });

    let mut app = App::new();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            assert_eq!(ctx.path, "/foo");
            next.run(ctx).await?;
            assert_eq!(ctx.path, "/foo");
            ctx.set_body("checked");
            Ok(())
        })
    });
    app.use_middleware(mount(prefix, a).unwrap());

    assert_eq!(get(&app, "/foo").await.body, "checked");
}

#[tokio::test]
async fn test_has_correct_path_with_literal_prefix() {
    assert_paths_around_next("/foo").await;
}

#[tokio::test]
async fn test_has_correct_path_with_param_prefix() {
    assert_paths_around_next("/:id").await;
}

#[tokio::test]
async fn test_matches_on_segment_boundary() {
    let mut app = App::new();
    app.use_middleware(mount("/prefix", no_content()).unwrap());

    assert_eq!(get(&app, "/abcds").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefixasdf").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix").await.status, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, "/prefix/vcasda").await.status, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, "/PREFIX/vcasda").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_matches_directory_prefix() {
    let mut app = App::new();
    app.use_middleware(mount("/prefix/", no_content()).unwrap());

    assert_eq!(get(&app, "/abcds").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefixasdf").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix/").await.status, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, "/prefix/vcasda").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_matches_param_prefix() {
    let mut app = App::new();
    app.use_middleware(mount("/prefix/:id", no_content()).unwrap());

    assert_eq!(get(&app, "/abcds").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefixasdf").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix/vcasda").await.status, StatusCode::NO_CONTENT);
    assert_eq!(
        get(&app, "/prefix/vsfdsf/asdfsaf").await.status,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn test_matches_param_directory_prefix() {
    let mut app = App::new();
    app.use_middleware(mount("/prefix/:id/", no_content()).unwrap());

    assert_eq!(get(&app, "/abcds").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefixasdf").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix/fafsaf").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/prefix/fafsaf/").await.status, StatusCode::NO_CONTENT);
    assert_eq!(
        get(&app, "/prefix/vcasdasdf/dfdfd").await.status,
        StatusCode::NO_CONTENT
    );
}

fn describe(label: &'static str) -> App {
    let mut app = App::new();
    app.use_fn(move |ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            let id = ctx.params.get("id").unwrap_or_default().to_string();
            ctx.set_body(format!("{}{}{}", ctx.path, label, id));
            Ok(())
        })
    });
    app
}

#[tokio::test]
async fn test_mounts_at_param_prefix() {
    let mut app = App::new();
    app.use_middleware(mount("/a/:id", describe("a")).unwrap());
    app.use_middleware(mount("/b/:id", describe("b")).unwrap());

    assert_eq!(get(&app, "/").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/a/ida").await.body, "/aida");
    assert_eq!(get(&app, "/b/idb").await.body, "/bidb");
    assert_eq!(get(&app, "/a/ida/b").await.body, "/baida");
    assert_eq!(get(&app, "/b/idb/a").await.body, "/abidb");
}

fn prepend_id() -> App {
    let mut app = App::new();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            let id = ctx.params.get("id").unwrap_or_default().to_string();
            ctx.prepend_body(&id);
            Ok(())
        })
    });
    app
}

#[tokio::test]
async fn test_cascades_param_prefix() {
    let c = prepend_id();
    let mut b = prepend_id();
    b.use_middleware(mount("/:id", c).unwrap());
    let mut a = prepend_id();
    a.use_middleware(mount("/:id", b).unwrap());

    let mut app = App::new();
    app.use_middleware(mount("/:id", a).unwrap());

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");
    assert_eq!(get(&app, "/foo/bar/baz").await.body, "foobarbaz");
}

/// Appends the param named `key`, then checks which params are visible
/// once downstream has run.
fn append_param(
    key: &'static str,
    present: &'static [(&'static str, &'static str)],
    absent: &'static [&'static str],
) -> App {
    let mut app = App::new();
    app.use_fn(move |ctx, next| {
        Box::pin(async move {
            let value = ctx.params.get(key).unwrap_or_default().to_string();
            ctx.append_body(&value);
            next.run(ctx).await?;
            for (name, value) in present {
                assert_eq!(ctx.params.get(name), Some(*value), "param {name}");
            }
            for name in absent {
                assert!(ctx.params.get(name).is_none(), "param {name} leaked");
            }
            Ok(())
        })
    });
    app
}

#[tokio::test]
async fn test_restores_prefix_and_params_for_mounted_apps() {
    let mut app = App::new();
    app.use_middleware(
        mount("/:id", append_param("id", &[("id", "foo")], &["id2", "id3"])).unwrap(),
    );
    app.use_middleware(
        mount(
            "/:id/:id2",
            append_param("id2", &[("id", "foo"), ("id2", "bar")], &["id3"]),
        )
        .unwrap(),
    );
    app.use_middleware(
        mount(
            "/:id/:id2/:id3",
            append_param("id3", &[("id", "foo"), ("id2", "bar"), ("id3", "baz")], &[]),
        )
        .unwrap(),
    );

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");

    let outcome = get(&app, "/foo/bar/baz").await;
    assert_eq!(outcome.body, "foobarbaz");
    assert_eq!(outcome.path, "/foo/bar/baz");
    assert!(outcome.params_empty);
}

#[tokio::test]
async fn test_restores_params_for_mounted_middleware() {
    let mut app = App::new();
    for (prefix, key) in [("/:id", "id"), ("/:id/:id2", "id2"), ("/:id/:id2/:id3", "id3")] {
        let stage = from_fn(move |ctx, next| {
            Box::pin(async move {
                let value = ctx.params.get(key).unwrap_or_default().to_string();
                ctx.append_body(&value);
                let seen = ctx.params.clone();
                next.run(ctx).await?;
                assert_eq!(ctx.params, seen);
                Ok(())
            })
        });
        app.use_middleware(mount(prefix, stage).unwrap());
    }

    assert_eq!(get(&app, "/foo").await.body, "foo");
    assert_eq!(get(&app, "/foo/bar").await.body, "foobar");
    assert_eq!(get(&app, "/foo/bar/baz").await.body, "foobarbaz");
}

#[tokio::test]
async fn test_merges_params_when_enabled() {
    let mut c = App::new();
    c.use_fn(|ctx, next| {
        Box::pin(async move {
            assert_eq!(ctx.params.get("id"), Some("foo"));
            assert_eq!(ctx.params.get("id2"), Some("bar"));
            assert_eq!(ctx.params.get("id3"), Some("baz"));
            next.run(ctx).await
        })
    });

    let mut b = App::new();
    b.use_fn(|ctx, next| {
        Box::pin(async move {
            assert_eq!(ctx.params.get("id"), Some("foo"));
            next.run(ctx).await?;
            assert_eq!(ctx.params.get("id2"), Some("bar"));
            assert!(ctx.params.get("id3").is_none());
            Ok(())
        })
    });
    b.use_middleware(Mount::new("/:id3", c).unwrap().merge_params(true));

    let mut a = App::new();
    a.use_fn(|ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            assert_eq!(ctx.params.get("id"), Some("foo"));
            assert!(ctx.params.get("id2").is_none());
            assert!(ctx.params.get("id3").is_none());
            ctx.set_status(StatusCode::NO_CONTENT);
            Ok(())
        })
    });
    a.use_middleware(Mount::new("/:id2", b).unwrap().merge_params(true));

    let mut app = App::new();
    app.use_middleware(mount("/:id", a).unwrap());

    assert_eq!(get(&app, "/foo/bar/baz").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_replaces_params_by_default() {
    let mut b = App::new();
    b.use_fn(|ctx, _next| {
        Box::pin(async move {
            assert!(ctx.params.get("id").is_none());
            assert_eq!(ctx.params.get("id2"), Some("bar"));
            ctx.set_body("inner");
            Ok(())
        })
    });
    let mut a = App::new();
    a.use_middleware(mount("/:id2", b).unwrap());

    let mut app = App::new();
    app.use_middleware(mount("/:id", a).unwrap());

    assert_eq!(get(&app, "/foo/bar").await.body, "inner");
}

#[tokio::test]
async fn test_restores_state_when_downstream_fails() {
    let failing = from_fn(|ctx, _next| {
        Box::pin(async move {
            assert_eq!(ctx.path, "/bar");
            Err::<(), _>(BoxError::from("downstream exploded"))
        })
    });

    let mut app = App::new();
    app.use_fn(|ctx, next| {
        Box::pin(async move {
            let outcome = next.run(ctx).await;
            assert!(outcome.is_err());
            assert_eq!(ctx.path, "/foo/bar");
            assert!(ctx.params.is_empty());
            ctx.set_body("recovered");
            Ok(())
        })
    });
    app.use_middleware(mount("/:id", failing).unwrap());

    assert_eq!(get(&app, "/foo/bar").await.body, "recovered");
}

#[tokio::test]
async fn test_restores_nested_state_when_upstream_fails() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut inner = App::new();
    let inner_log = log.clone();
    inner.use_fn(move |ctx, next| {
        let log = inner_log.clone();
        Box::pin(async move {
            assert_eq!(ctx.path, "/baz");
            assert_eq!(ctx.params.get("id2"), Some("bar"));
            let outcome = next.run(ctx).await;
            assert!(outcome.is_err());
            assert_eq!(ctx.path, "/baz");
            assert_eq!(ctx.params.get("id"), Some("foo"));
            assert_eq!(ctx.params.get("id2"), Some("bar"));
            log.lock().unwrap().push("inner restored");
            outcome
        })
    });

    let mut a = App::new();
    a.use_middleware(Mount::new("/:id2", inner).unwrap().merge_params(true));
    let sibling_log = log.clone();
    a.use_fn(move |ctx, _next| {
        let log = sibling_log.clone();
        Box::pin(async move {
            assert_eq!(ctx.path, "/bar/baz");
            assert_eq!(ctx.params.get("id"), Some("foo"));
            assert!(ctx.params.get("id2").is_none());
            log.lock().unwrap().push("sibling failed");
            Err::<(), _>(BoxError::from("sibling exploded"))
        })
    });

    let mut app = App::new();
    app.use_middleware(mount("/:id", a).unwrap());

    let mut ctx = Context::new(Method::GET, "/foo/bar/baz");
    let err = app.call(&mut ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "sibling exploded");
    assert_eq!(ctx.path, "/foo/bar/baz");
    assert!(ctx.params.is_empty());
    assert_eq!(*log.lock().unwrap(), vec!["sibling failed", "inner restored"]);
}

#[tokio::test]
async fn test_propagates_downstream_errors() {
    let mut app = App::new();
    app.use_middleware(
        mount(
            "/foo",
            from_fn(|_ctx, _next| {
                Box::pin(async move { Err::<(), _>(BoxError::from("nope")) })
            }),
        )
        .unwrap(),
    );

    let mut ctx = Context::new(Method::GET, "/foo/bar");
    let err = app.call(&mut ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "nope");
    assert_eq!(ctx.path, "/foo/bar");
}

#[tokio::test]
async fn test_keeps_raw_param_when_decoding_fails() {
    let mut app = App::new();
    app.use_middleware(
        mount(
            "/:id/:id2",
            from_fn(|ctx, _next| {
                Box::pin(async move {
                    assert_eq!(ctx.params.get("id"), Some("100%"));
                    assert_eq!(ctx.params.get("id2"), Some("101%"));
                    ctx.set_status(StatusCode::NO_CONTENT);
                    Ok(())
                })
            }),
        )
        .unwrap(),
    );

    assert_eq!(get(&app, "/100%/101%").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_decodes_percent_encoded_params() {
    let mut app = App::new();
    app.use_middleware(
        mount(
            "/users/:name",
            from_fn(|ctx, _next| {
                Box::pin(async move {
                    let name = ctx.params.get("name").unwrap_or_default().to_string();
                    ctx.set_body(name);
                    Ok(())
                })
            }),
        )
        .unwrap(),
    );

    assert_eq!(get(&app, "/users/caf%C3%A9").await.body, "café");
    assert_eq!(get(&app, "/users/a%20b/posts").await.body, "a b");
}

#[derive(Debug)]
struct Version;

impl Matcher for Version {
    fn captures<'p>(&self, path: &'p str) -> Option<RawCaptures<'p>> {
        let rest = path.strip_prefix("/v")?;
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 || !(rest.len() == digits || rest[digits..].starts_with('/')) {
            return None;
        }
        Some(RawCaptures {
            matched: 2 + digits,
            groups: vec![(ParamKey::from("version"), &rest[..digits])],
        })
    }
}

#[tokio::test]
async fn test_mounts_custom_matcher() {
    let mut api = App::new();
    api.use_fn(|ctx, _next| {
        Box::pin(async move {
            let version = ctx.params.get("version").unwrap_or_default().to_string();
            ctx.set_body(format!("v{version} {}", ctx.path));
            Ok(())
        })
    });

    let mut app = App::new();
    app.use_middleware(Mount::with_matcher("/v:version", Version, api));

    assert_eq!(get(&app, "/v2/users").await.body, "v2 /users");
    assert_eq!(get(&app, "/v10").await.body, "v10 /");
    assert_eq!(get(&app, "/vx/users").await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/v2users").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_skips_non_matching_mounts() {
    let mut app = App::new();
    app.use_middleware(mount("/api", append("api")).unwrap());
    app.use_middleware(append("fallthrough"));

    let outcome = get(&app, "/static/app.js").await;
    assert_eq!(outcome.body, "fallthrough");
    assert_eq!(outcome.path, "/static/app.js");
}

#[test]
fn test_rejects_relative_prefix() {
    assert!(mount("api", App::new()).is_err());
    assert!(Mount::new("", App::new()).is_err());
}
