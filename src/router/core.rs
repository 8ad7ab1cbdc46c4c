use crate::config::ApiConfig;
use crate::dataclass::DataclassInfo;
use crate::dispatcher::ApiView;
use crate::error::{CollectionError, ViewError};
use crate::ids::REQUEST_ID_HEADER;
use crate::server::{ApiRequest, ApiResponse};
use http::{Method, StatusCode};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Plain function mounted with [`Api::raw_route`].
pub type RawHandler = Arc<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

enum Target {
    View(ApiView),
    /// Routed but left out of the generated schema
    Raw(Vec<(Method, RawHandler)>),
}

struct Route {
    pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    target: Target,
}

/// A set of views mounted on URL patterns.
///
/// Patterns are literal paths with `{name}` segments, e.g. `/pets/{pet_id}`.
/// Routes are tried in mount order.
pub struct Api {
    config: ApiConfig,
    routes: Vec<Route>,
    components: BTreeMap<&'static str, DataclassInfo>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

impl Api {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Api {
            config,
            routes: Vec::new(),
            components: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Mount `view` on `pattern`.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::DuplicateRoute`] when `pattern` is already mounted
    /// - [`CollectionError::InvalidPattern`] when it does not compile
    /// - [`CollectionError::PathParameterMismatch`] when the `{captures}` and the
    ///   fields of a `Path<T>` argument differ
    /// - [`CollectionError::NameInUse`] when a dataclass name clashes with one
    ///   from another view
    pub fn route(&mut self, pattern: &str, view: ApiView) -> Result<&mut Self, CollectionError> {
        if self.find_pattern(pattern).is_some() {
            return Err(CollectionError::DuplicateRoute {
                pattern: pattern.to_string(),
            });
        }
        let (regex, param_names) = path_to_regex(pattern)?;
        check_path_params(pattern, &param_names, &view)?;

        let mut components = self.components.clone();
        for info in view.components().values() {
            info.collect_into(&mut components)?;
        }
        self.components = components;

        info!(
            pattern = %pattern,
            methods = ?view.methods(),
            total_routes = self.routes.len() + 1,
            "View mounted"
        );
        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            param_names,
            target: Target::View(view),
        });
        Ok(self)
    }

    /// Mount a plain function for one method on `pattern`.
    ///
    /// Several methods may share a pattern by calling this repeatedly; a pattern
    /// used by a view cannot take raw handlers.
    ///
    /// # Errors
    ///
    /// [`CollectionError::DuplicateRoute`] if a view owns `pattern`,
    /// [`CollectionError::OverlappingMethods`] if `method` is already mounted
    /// there, [`CollectionError::InvalidPattern`] if it does not compile.
    pub fn raw_route<F>(
        &mut self,
        pattern: &str,
        method: Method,
        handler: F,
    ) -> Result<&mut Self, CollectionError>
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        let handler: RawHandler = Arc::new(handler);
        if let Some(idx) = self.find_pattern(pattern) {
            return match &mut self.routes[idx].target {
                Target::View(_) => Err(CollectionError::DuplicateRoute {
                    pattern: pattern.to_string(),
                }),
                Target::Raw(handlers) => {
                    if handlers.iter().any(|(m, _)| *m == method) {
                        return Err(CollectionError::OverlappingMethods {
                            method: method.to_string(),
                        });
                    }
                    handlers.push((method, handler));
                    Ok(self)
                }
            };
        }

        let (regex, param_names) = path_to_regex(pattern)?;
        debug!(pattern = %pattern, method = %method, "Raw route mounted");
        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            param_names,
            target: Target::Raw(vec![(method, handler)]),
        });
        Ok(self)
    }

    /// Mounted views with their patterns, in mount order. Raw routes are skipped.
    pub fn views(&self) -> impl Iterator<Item = (&str, &ApiView)> {
        self.routes.iter().filter_map(|route| match &route.target {
            Target::View(view) => Some((route.pattern.as_str(), view)),
            Target::Raw(_) => None,
        })
    }

    /// Every dataclass used by a mounted view, keyed by component name.
    #[must_use]
    pub fn components(&self) -> &BTreeMap<&'static str, DataclassInfo> {
        &self.components
    }

    /// Route and dispatch `req`.
    ///
    /// An unmatched path is a `404` response, not an error.
    ///
    /// # Errors
    ///
    /// Whatever the matched view's [`ApiView::call`] returns.
    pub fn handle(&self, mut req: ApiRequest) -> Result<ApiResponse, ViewError> {
        let Some((route, captures)) = self.match_route(&req.path) else {
            debug!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                "No route matched"
            );
            return Ok(ApiResponse::not_found());
        };
        debug!(
            request_id = %req.request_id,
            pattern = %route.pattern,
            path_params = captures.len(),
            "Route matched"
        );
        req.path_params.extend(captures);

        match &route.target {
            Target::View(view) => view.call(&req),
            Target::Raw(handlers) => match handlers.iter().find(|(m, _)| *m == req.method) {
                Some((_, handler)) => Ok(handler(&req)),
                None => {
                    let allowed: Vec<Method> = handlers.iter().map(|(m, _)| m.clone()).collect();
                    Ok(ApiResponse::method_not_allowed(&req.method, &allowed))
                }
            },
        }
    }

    /// Like [`Api::handle`], with server faults logged and answered with `500`.
    #[must_use]
    pub fn respond(&self, req: ApiRequest) -> ApiResponse {
        let request_id = req.request_id;
        let path = req.path.clone();
        match self.handle(req) {
            Ok(res) => res,
            Err(err) => {
                error!(
                    request_id = %request_id,
                    path = %path,
                    error = %err,
                    "View failed"
                );
                ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
        }
    }

    /// Serve an `http::Request` end to end.
    ///
    /// # Errors
    ///
    /// Only if the response cannot be encoded.
    pub fn handle_http<B: AsRef<[u8]>>(
        &self,
        req: http::Request<B>,
    ) -> anyhow::Result<http::Response<Vec<u8>>> {
        let req = ApiRequest::from(req);
        let request_id = req.request_id;
        self.respond(req)
            .with_header(REQUEST_ID_HEADER, request_id.to_string())
            .into_http()
    }

    fn find_pattern(&self, pattern: &str) -> Option<usize> {
        self.routes.iter().position(|r| r.pattern == pattern)
    }

    fn match_route(&self, path: &str) -> Option<(&Route, Vec<(Arc<str>, String)>)> {
        self.routes.iter().find_map(|route| {
            let caps = route.regex.captures(path)?;
            let params = route
                .param_names
                .iter()
                .enumerate()
                .filter_map(|(idx, name)| {
                    caps.get(idx + 1)
                        .map(|m| (Arc::clone(name), decode_segment(m.as_str())))
                })
                .collect();
            Some((route, params))
        })
    }
}

/// Percent-decode a captured segment; undecodable input is kept as is.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}

/// Compile a `{name}` pattern into an anchored regex and its capture names.
pub(crate) fn path_to_regex(pattern: &str) -> Result<(Regex, Vec<Arc<str>>), CollectionError> {
    let invalid = |reason: &str| CollectionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };
    if !pattern.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }
    if pattern == "/" {
        let regex = Regex::new(r"^/$").map_err(|e| invalid(&e.to_string()))?;
        return Ok((regex, Vec::new()));
    }

    let mut source = String::with_capacity(pattern.len() + 5);
    source.push('^');
    let mut param_names: Vec<Arc<str>> = Vec::with_capacity(pattern.matches('{').count());

    for segment in pattern.split('/').skip(1) {
        source.push('/');
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(&format!("bad parameter name `{name}`")));
            }
            if param_names.iter().any(|n| &**n == name) {
                return Err(invalid(&format!("parameter `{name}` appears twice")));
            }
            source.push_str("([^/]+)");
            param_names.push(Arc::from(name));
        } else if segment.contains(['{', '}']) {
            return Err(invalid(&format!("segment `{segment}` mixes text and a parameter")));
        } else {
            source.push_str(&regex::escape(segment));
        }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
    Ok((regex, param_names))
}

fn check_path_params(
    pattern: &str,
    captures: &[Arc<str>],
    view: &ApiView,
) -> Result<(), CollectionError> {
    let captured: BTreeSet<&str> = captures.iter().map(|c| &**c).collect();
    let mismatch = |message: String| CollectionError::PathParameterMismatch {
        pattern: pattern.to_string(),
        message,
    };

    for op in view.operations() {
        let declared: BTreeSet<&str> = match op.param("Path").and_then(|t| t.dataclass()) {
            Some(info) => info.fields.iter().map(|f| f.name).collect(),
            // A handler reading the raw request may look the captures up itself
            None if op.params.iter().any(|p| p.label() == "ApiRequest") => continue,
            None => BTreeSet::new(),
        };
        if let Some(missing) = captured.difference(&declared).next() {
            return Err(mismatch(format!(
                "`{{{missing}}}` is not a field of the `Path` argument of the {} handler",
                op.method
            )));
        }
        if let Some(extra) = declared.difference(&captured).next() {
            return Err(mismatch(format!(
                "`Path` field `{extra}` of the {} handler is not captured by the pattern",
                op.method
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_regex() {
        let (regex, names) = path_to_regex("/pets/{pet_id}/toys/{toy_id}").unwrap();
        assert_eq!(names.iter().map(|n| &**n).collect::<Vec<_>>(), vec!["pet_id", "toy_id"]);
        let caps = regex.captures("/pets/7/toys/ball").unwrap();
        assert_eq!(&caps[1], "7");
        assert_eq!(&caps[2], "ball");
        assert!(!regex.is_match("/pets/7/toys"));

        let (regex, _) = path_to_regex("/v1.0/items/").unwrap();
        assert!(regex.is_match("/v1.0/items/"));
        assert!(!regex.is_match("/v1x0/items/"));

        let (regex, names) = path_to_regex("/").unwrap();
        assert!(regex.is_match("/") && names.is_empty());
    }

    #[test]
    fn test_path_to_regex_rejects_bad_patterns() {
        for bad in ["pets", "/pets/{}", "/pets/{id}/{id}", "/pets/id-{id}", "/pets/{a-b}"] {
            assert!(
                matches!(path_to_regex(bad), Err(CollectionError::InvalidPattern { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("hello%20world"), "hello world");
        assert_eq!(decode_segment("a+b"), "a+b");
        assert_eq!(decode_segment("%E0%A4%A"), "%E0%A4%A");
    }

    #[test]
    fn test_raw_routes_share_pattern() {
        let mut api = Api::default();
        api.raw_route("/health", Method::GET, |_| {
            ApiResponse::json(StatusCode::OK, serde_json::json!({ "status": "ok" }))
        })
        .unwrap();
        api.raw_route("/health", Method::HEAD, |_| ApiResponse::new(StatusCode::OK, None))
            .unwrap();
        let err = api
            .raw_route("/health", Method::GET, |_| ApiResponse::not_found())
            .err();
        assert_eq!(
            err,
            Some(CollectionError::OverlappingMethods {
                method: "GET".into()
            })
        );

        let res = api.respond(ApiRequest::get("/health"));
        assert_eq!(res.status, StatusCode::OK);
        let res = api.respond(ApiRequest::post("/health"));
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(api.respond(ApiRequest::get("/nope")).status, StatusCode::NOT_FOUND);
        assert_eq!(api.views().count(), 0);
    }
}
