//! Links to dynamic routes.
//!
//! Content often stores plain URLs (`/blog/spring-sale`) that the front end
//! serves from a dynamic route template (`/blog/[slug]`). A [`LinkConverter`]
//! maps such URLs onto their template so navigation can address the route
//! by template plus parameters, and [`Link`] renders the anchor with
//! active-state detection.
//!
//! ## Route Templates
//!
//! | Segment        | Matches                          |
//! |----------------|----------------------------------|
//! | `[id]`         | exactly one path segment         |
//! | `[...path]`    | one or more segments (last only) |
//! | `[[...path]]`  | zero or more segments (last only)|

use crate::content::Content;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("route \"{0}\" is not dynamic")]
    NotDynamic(String),
    #[error("invalid route \"{route}\": {reason}")]
    InvalidRoute { route: String, reason: &'static str },
}

/// A route parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

pub type Params = BTreeMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
    OptionalCatchAll(String),
}

/// Template for navigation: the route pathname plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlObject {
    pub pathname: String,
    pub query: Params,
}

/// A dynamic link: where the router should go (`href`) and what the address
/// bar shows (`as_path`). An empty `as_path` means the parameters did not
/// satisfy the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicLink {
    pub href: UrlObject,
    pub as_path: String,
}

/// A parsed dynamic route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRoute {
    route: String,
    segments: Vec<Segment>,
}

impl DynamicRoute {
    pub fn parse(route: &str) -> Result<Self, LinkError> {
        let invalid = |reason| LinkError::InvalidRoute {
            route: route.to_string(),
            reason,
        };
        let raw: Vec<&str> = split_path(route);
        let mut segments = Vec::with_capacity(raw.len());
        for (i, part) in raw.iter().enumerate() {
            let is_last = i + 1 == raw.len();
            let segment = if let Some(name) = part
                .strip_prefix("[[...")
                .and_then(|p| p.strip_suffix("]]"))
            {
                if !is_last {
                    return Err(invalid("optional catch-all must be the last segment"));
                }
                Segment::OptionalCatchAll(name.to_string())
            } else if let Some(name) = part.strip_prefix("[...").and_then(|p| p.strip_suffix(']')) {
                if !is_last {
                    return Err(invalid("catch-all must be the last segment"));
                }
                Segment::CatchAll(name.to_string())
            } else if let Some(name) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                Segment::Param(name.to_string())
            } else {
                Segment::Static(part.to_string())
            };
            if let Segment::Param(name) | Segment::CatchAll(name) | Segment::OptionalCatchAll(name) =
                &segment
            {
                if name.is_empty() {
                    return Err(invalid("empty parameter name"));
                }
            }
            segments.push(segment);
        }
        if segments.iter().all(|s| matches!(s, Segment::Static(_))) {
            return Err(LinkError::NotDynamic(route.to_string()));
        }
        Ok(Self {
            route: route.to_string(),
            segments,
        })
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Parameters extracted from `url`'s path, or `None` if it doesn't fit.
    pub fn matches(&self, url: &str) -> Option<Params> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let parts = split_path(path);
        let mut params = Params::new();
        let mut rest = parts.as_slice();

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    let (first, tail) = rest.split_first()?;
                    if *first != expected.as_str() {
                        return None;
                    }
                    rest = tail;
                }
                Segment::Param(name) => {
                    let (first, tail) = rest.split_first()?;
                    params.insert(name.clone(), ParamValue::from(*first));
                    rest = tail;
                }
                Segment::CatchAll(name) => {
                    if rest.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), ParamValue::from(rest.to_vec()));
                    rest = &[];
                }
                Segment::OptionalCatchAll(name) => {
                    if !rest.is_empty() {
                        params.insert(name.clone(), ParamValue::from(rest.to_vec()));
                    }
                    rest = &[];
                }
            }
        }
        rest.is_empty().then_some(params)
    }

    /// Interpolate `query` into the route.
    pub fn build(&self, query: &Params) -> DynamicLink {
        let as_path = self.interpolate(query).unwrap_or_default();
        DynamicLink {
            href: UrlObject {
                pathname: self.route.clone(),
                query: query.clone(),
            },
            as_path,
        }
    }

    fn interpolate(&self, query: &Params) -> Option<String> {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(s) => parts.push(s.clone()),
                Segment::Param(name) => {
                    let value = match query.get(name)? {
                        ParamValue::Single(v) => escape_path_delimiters(v),
                        ParamValue::Multi(vs) => escape_path_delimiters(&vs.join(",")),
                    };
                    parts.push(value);
                }
                Segment::CatchAll(name) => parts.push(join_segments(query.get(name)?)),
                Segment::OptionalCatchAll(name) => {
                    if let Some(value) = query.get(name) {
                        let joined = join_segments(value);
                        if !joined.is_empty() {
                            parts.push(joined);
                        }
                    }
                }
            }
        }
        Some(format!("/{}", parts.join("/")))
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

fn join_segments(value: &ParamValue) -> String {
    match value {
        ParamValue::Single(v) => escape_path_delimiters(v),
        ParamValue::Multi(vs) => vs
            .iter()
            .map(|v| escape_path_delimiters(v))
            .collect::<Vec<_>>()
            .join("/"),
    }
}

fn escape_path_delimiters(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            c => out.push(c),
        }
    }
    out
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkTarget {
    Static(String),
    Dynamic(DynamicLink),
}

impl LinkTarget {
    /// The path the browser ends up on.
    pub fn path(&self) -> &str {
        match self {
            LinkTarget::Static(path) => path,
            LinkTarget::Dynamic(link) => &link.as_path,
        }
    }
}

impl From<&str> for LinkTarget {
    fn from(path: &str) -> Self {
        LinkTarget::Static(path.to_string())
    }
}

impl From<DynamicLink> for LinkTarget {
    fn from(link: DynamicLink) -> Self {
        LinkTarget::Dynamic(link)
    }
}

/// Maps plain URLs onto dynamic routes, caching each answer.
#[derive(Debug, Default)]
pub struct LinkConverter {
    builders: Vec<DynamicRoute>,
    static_links: HashSet<String>,
    cache: RefCell<HashMap<String, LinkTarget>>,
}

impl LinkConverter {
    pub fn new(builders: Vec<DynamicRoute>, static_links: impl IntoIterator<Item = String>) -> Self {
        Self {
            builders,
            static_links: static_links.into_iter().collect(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn convert(&self, link: Option<&str>) -> LinkTarget {
        let link = match link {
            Some(link) if !link.is_empty() => link,
            _ => return LinkTarget::Static(String::new()),
        };
        if let Some(cached) = self.cache.borrow().get(link) {
            return cached.clone();
        }

        let result = if self.static_links.contains(link) {
            LinkTarget::from(link)
        } else {
            self.builders
                .iter()
                .find_map(|builder| builder.matches(link).map(|params| builder.build(&params)))
                .map(LinkTarget::Dynamic)
                .unwrap_or_else(|| LinkTarget::from(link))
        };

        self.cache
            .borrow_mut()
            .insert(link.to_string(), result.clone());
        result
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// The router's view of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    /// Route template of the current page, e.g. `/blog/[slug]`.
    pub pathname: String,
    /// Path shown in the address bar, e.g. `/blog/spring-sale`.
    pub as_path: String,
}

/// How a link decides whether it points at the current page.
#[derive(Clone, Default)]
pub enum ActiveRule {
    #[default]
    Auto,
    Fixed(bool),
    Check(Rc<dyn Fn() -> bool>),
}

impl fmt::Debug for ActiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveRule::Auto => f.write_str("Auto"),
            ActiveRule::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            ActiveRule::Check(_) => f.write_str("Check(..)"),
        }
    }
}

/// What a render-function child receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRenderProps {
    pub href: Option<String>,
    pub class: String,
    pub is_active: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct Link {
    pub to: LinkTarget,
    pub class: Option<String>,
    pub active_class: Option<String>,
    pub active: ActiveRule,
    pub disabled: bool,
    pub content: Content<LinkRenderProps>,
}

impl Link {
    pub fn new(to: impl Into<LinkTarget>, content: impl Into<Content<LinkRenderProps>>) -> Self {
        Self {
            to: to.into(),
            class: None,
            active_class: None,
            active: ActiveRule::Auto,
            disabled: false,
            content: content.into(),
        }
    }

    /// Never active without a router.
    pub fn is_active(&self, router: Option<&RouterState>) -> bool {
        let Some(router) = router else {
            return false;
        };
        match &self.active {
            ActiveRule::Fixed(active) => *active,
            ActiveRule::Check(check) => check(),
            ActiveRule::Auto => match &self.to {
                LinkTarget::Static(path) => *path == router.pathname,
                LinkTarget::Dynamic(link) => link.as_path == router.as_path,
            },
        }
    }

    /// Clicks are swallowed without a router, on the current page, and
    /// when disabled.
    pub fn should_prevent_navigation(&self, router: Option<&RouterState>) -> bool {
        match router {
            None => true,
            Some(router) => self.disabled || router.as_path == self.to.path(),
        }
    }

    pub fn render_props(&self, router: Option<&RouterState>) -> LinkRenderProps {
        let is_active = self.is_active(router);
        let active_class = if is_active {
            self.active_class.as_deref()
        } else {
            None
        };
        let class = [active_class, self.class.as_deref()]
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        LinkRenderProps {
            href: (!self.disabled).then(|| self.to.path().to_string()),
            class,
            is_active,
            disabled: self.disabled,
        }
    }

    pub fn render(&self, router: Option<&RouterState>) -> Markup {
        let props = self.render_props(router);
        match &self.content {
            Content::Render(f) => f(&props),
            Content::Node(children) => {
                let cursor = if props.is_active || props.disabled {
                    "cursor: default;"
                } else {
                    "cursor: pointer;"
                };
                let class = (!props.class.is_empty()).then_some(props.class.as_str());
                html! {
                    a href=[props.href.as_deref()]
                        class=[class]
                        style=(cursor)
                        aria-disabled=[props.disabled.then_some("true")]
                        aria-current=[props.is_active.then_some("page")] {
                        (children)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, ParamValue)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn static_route_is_rejected() {
        assert_eq!(
            DynamicRoute::parse("/about"),
            Err(LinkError::NotDynamic("/about".into()))
        );
    }

    #[test]
    fn catch_all_must_be_last() {
        let err = DynamicRoute::parse("/docs/[...path]/edit").unwrap_err();
        assert!(matches!(err, LinkError::InvalidRoute { .. }));
    }

    #[test]
    fn matches_single_param() {
        let route = DynamicRoute::parse("/blog/[slug]").unwrap();
        assert_eq!(
            route.matches("/blog/spring-sale?utm=x"),
            Some(params(&[("slug", "spring-sale".into())]))
        );
        assert_eq!(route.matches("/blog/spring-sale/"), Some(params(&[("slug", "spring-sale".into())])));
        assert_eq!(route.matches("/blog"), None);
        assert_eq!(route.matches("/blog/a/b"), None);
        assert_eq!(route.matches("/news/a"), None);
    }

    #[test]
    fn matches_catch_all() {
        let route = DynamicRoute::parse("/docs/[...path]").unwrap();
        assert_eq!(
            route.matches("/docs/a/b"),
            Some(params(&[("path", vec!["a", "b"].into())]))
        );
        assert_eq!(route.matches("/docs"), None);
    }

    #[test]
    fn matches_optional_catch_all() {
        let route = DynamicRoute::parse("/shop/[[...filters]]").unwrap();
        assert_eq!(route.matches("/shop"), Some(Params::new()));
        assert_eq!(
            route.matches("/shop/red"),
            Some(params(&[("filters", vec!["red"].into())]))
        );
    }

    #[test]
    fn build_interpolates_and_escapes() {
        let route = DynamicRoute::parse("/blog/[slug]").unwrap();
        let link = route.build(&params(&[("slug", "a/b?c".into())]));
        assert_eq!(link.as_path, "/blog/a%2Fb%3Fc");
        assert_eq!(link.href.pathname, "/blog/[slug]");
    }

    #[test]
    fn build_converts_numbers() {
        let route = DynamicRoute::parse("/products/[id]").unwrap();
        let link = route.build(&params(&[("id", 42i64.into())]));
        assert_eq!(link.as_path, "/products/42");
        assert_eq!(link.href.query["id"], ParamValue::Single("42".into()));
    }

    #[test]
    fn build_catch_all_joins_segments() {
        let route = DynamicRoute::parse("/docs/[...path]").unwrap();
        let link = route.build(&params(&[("path", vec!["guide", "intro"].into())]));
        assert_eq!(link.as_path, "/docs/guide/intro");
        let single = route.build(&params(&[("path", "guide".into())]));
        assert_eq!(single.as_path, "/docs/guide");
    }

    #[test]
    fn build_drops_missing_optional_catch_all() {
        let route = DynamicRoute::parse("/shop/[[...filters]]").unwrap();
        assert_eq!(route.build(&Params::new()).as_path, "/shop");
    }

    #[test]
    fn build_missing_required_param_yields_empty_path() {
        let route = DynamicRoute::parse("/blog/[slug]").unwrap();
        assert_eq!(route.build(&Params::new()).as_path, "");
    }

    #[test]
    fn converter_prefers_static_and_caches() {
        let converter = LinkConverter::new(
            vec![DynamicRoute::parse("/[page]").unwrap()],
            vec!["/contacts".to_string()],
        );
        assert_eq!(converter.convert(Some("/contacts")), LinkTarget::from("/contacts"));

        let converted = converter.convert(Some("/about"));
        match &converted {
            LinkTarget::Dynamic(link) => {
                assert_eq!(link.href.pathname, "/[page]");
                assert_eq!(link.as_path, "/about");
            }
            other => panic!("expected dynamic link, got {other:?}"),
        }
        assert_eq!(converter.convert(Some("/about")), converted);
        assert_eq!(converter.cached_len(), 2);
    }

    #[test]
    fn converter_passes_unmatched_and_empty() {
        let converter = LinkConverter::new(vec![DynamicRoute::parse("/blog/[slug]").unwrap()], vec![]);
        assert_eq!(converter.convert(Some("/a/b/c")), LinkTarget::from("/a/b/c"));
        assert_eq!(converter.convert(None), LinkTarget::from(""));
        assert_eq!(converter.convert(Some("")), LinkTarget::from(""));
    }

    #[test]
    fn first_matching_builder_wins() {
        let converter = LinkConverter::new(
            vec![
                DynamicRoute::parse("/blog/[slug]").unwrap(),
                DynamicRoute::parse("/[...all]").unwrap(),
            ],
            vec![],
        );
        match converter.convert(Some("/blog/x")) {
            LinkTarget::Dynamic(link) => assert_eq!(link.href.pathname, "/blog/[slug]"),
            other => panic!("expected dynamic link, got {other:?}"),
        }
    }

    fn router(pathname: &str, as_path: &str) -> RouterState {
        RouterState {
            pathname: pathname.into(),
            as_path: as_path.into(),
        }
    }

    #[test]
    fn static_link_active_by_pathname() {
        let mut link = Link::new("/about", html! { "About" });
        link.class = Some("nav".into());
        link.active_class = Some("current".into());
        let html = link.render(Some(&router("/about", "/about"))).into_string();
        assert_eq!(
            html,
            r#"<a href="/about" class="current nav" style="cursor: default;" aria-current="page">About</a>"#
        );
    }

    #[test]
    fn dynamic_link_active_by_as_path() {
        let route = DynamicRoute::parse("/blog/[slug]").unwrap();
        let target = route.build(&params(&[("slug", "x".into())]));
        let link = Link::new(target, html! { "X" });
        assert!(link.is_active(Some(&router("/blog/[slug]", "/blog/x"))));
        assert!(!link.is_active(Some(&router("/blog/[slug]", "/blog/y"))));
    }

    #[test]
    fn no_router_means_inactive_and_prevented() {
        let mut link = Link::new("/about", html! { "About" });
        link.active = ActiveRule::Fixed(true);
        assert!(!link.is_active(None));
        assert!(link.should_prevent_navigation(None));
    }

    #[test]
    fn explicit_active_rules() {
        let r = router("/", "/");
        let mut link = Link::new("/about", html! { "About" });
        link.active = ActiveRule::Fixed(true);
        assert!(link.is_active(Some(&r)));
        link.active = ActiveRule::Check(Rc::new(|| false));
        assert!(!link.is_active(Some(&r)));
    }

    #[test]
    fn disabled_link_has_no_href() {
        let mut link = Link::new("/about", html! { "About" });
        link.disabled = true;
        let r = router("/", "/");
        assert!(link.should_prevent_navigation(Some(&r)));
        let html = link.render(Some(&r)).into_string();
        assert!(!html.contains("href="));
        assert!(html.contains(r#"aria-disabled="true""#));
    }

    #[test]
    fn current_page_click_is_prevented() {
        let link = Link::new("/about", html! { "About" });
        assert!(link.should_prevent_navigation(Some(&router("/about", "/about"))));
        assert!(!link.should_prevent_navigation(Some(&router("/", "/"))));
    }

    #[test]
    fn render_function_child_gets_props() {
        let link = Link::new(
            "/about",
            Content::render_fn(|p: &LinkRenderProps| {
                html! { button data-href=[p.href.as_deref()] data-active=(p.is_active.to_string()) { "Go" } }
            }),
        );
        let html = link.render(Some(&router("/about", "/about"))).into_string();
        assert_eq!(html, r#"<button data-href="/about" data-active="true">Go</button>"#);
    }
}
