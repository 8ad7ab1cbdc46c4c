use crate::dataclass::DataclassInfo;
use crate::error::{CollectionError, ViewError};
use crate::security::Permission;
use crate::serializer::serialize;
use crate::server::{ApiRequest, ApiResponse};
use crate::typed::{Handler, ParamKind, TypeRef};
use crate::validator::FieldErrors;
use http::{Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What happened when an erased handler ran.
pub(crate) enum Outcome {
    /// Arguments could not be extracted
    Rejected(FieldErrors),
    /// The view function returned an error
    Failed(anyhow::Error),
    /// The returned value does not match the declared response dataclass
    Invalid(FieldErrors),
    Completed(Value),
}

type ErasedHandler = Arc<dyn Fn(&ApiRequest) -> Outcome + Send + Sync>;

/// Everything the schema generator needs to know about one method of a view.
#[derive(Debug, Clone)]
pub struct OperationMeta {
    pub method: Method,
    /// Argument classifications, in declaration order
    pub params: Vec<ParamKind>,
    pub response: DataclassInfo,
    pub status: StatusCode,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Explicit `operationId`; generated from method and path when `None`
    pub operation_id: Option<String>,
    /// Names of the view's permissions
    pub permissions: Vec<String>,
}

impl OperationMeta {
    /// The wrapped type of the first argument classified as `label`
    /// (`"Query"`, `"Data"` or `"Path"`).
    #[must_use]
    pub fn param(&self, label: &str) -> Option<&TypeRef> {
        self.params
            .iter()
            .find(|p| p.label() == label)
            .and_then(ParamKind::type_ref)
    }

    /// Whether any argument reads validated client input.
    #[must_use]
    pub fn has_input(&self) -> bool {
        self.params.iter().any(|p| p.type_ref().is_some())
    }
}

/// Start declaring a view served for `methods`.
///
/// ```rust
/// use http::Method;
/// use serde::{Deserialize, Serialize};
/// use speccify::{api_view, ApiRequest, Dataclass, Query};
///
/// #[derive(Serialize, Deserialize, Dataclass)]
/// struct Greeting {
///     name: String,
/// }
///
/// #[derive(Serialize, Deserialize, Dataclass)]
/// struct Reply {
///     message: String,
/// }
///
/// let view = api_view([Method::GET])
///     .doc("Say hello\n\nEchoes the name back.")
///     .handler(|q: Query<Greeting>| -> anyhow::Result<Reply> {
///         Ok(Reply { message: format!("hello {}", q.name) })
///     })
///     .unwrap();
///
/// let res = view.call(&ApiRequest::get("/?name=ada")).unwrap();
/// assert_eq!(res.body.unwrap()["message"], "hello ada");
/// ```
pub fn api_view<I>(methods: I) -> ViewBuilder
where
    I: IntoIterator<Item = Method>,
{
    ViewBuilder {
        methods: methods.into_iter().collect(),
        permissions: Vec::new(),
        status: StatusCode::OK,
        summary: None,
        description: None,
        operation_id: None,
    }
}

/// Declaration of a view, finished by [`ViewBuilder::handler`].
#[must_use]
pub struct ViewBuilder {
    methods: Vec<Method>,
    permissions: Vec<Arc<dyn Permission>>,
    status: StatusCode,
    summary: Option<String>,
    description: Option<String>,
    operation_id: Option<String>,
}

impl ViewBuilder {
    /// Require `permission` for every method of the view. Checked in the order added.
    pub fn permission(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions.push(Arc::new(permission));
        self
    }

    /// Status of successful responses (default `200`). With `204` no body is sent.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Documentation text: the part before the first blank line becomes the
    /// summary, the rest the description.
    pub fn doc(mut self, text: &str) -> Self {
        let (summary, description) = split_doc(text);
        self.summary = summary;
        self.description = description;
        self
    }

    /// Explicit `operationId`.
    pub fn name(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Attach the view function and check the whole declaration.
    ///
    /// # Errors
    ///
    /// Any [`CollectionError`] about the methods, the argument classifications or
    /// the dataclasses involved.
    pub fn handler<H, Args>(self, handler: H) -> Result<ApiView, CollectionError>
    where
        H: Handler<Args>,
    {
        let permission_names: Vec<String> =
            self.permissions.iter().map(|p| p.name().to_string()).collect();
        let mut components = BTreeMap::new();
        let operations = self.register(handler, &permission_names, &mut components)?;
        let view = ApiView {
            operations,
            permissions: self.permissions,
            components,
        };
        debug!(
            methods = ?view.methods(),
            components = view.components.len(),
            "View collected"
        );
        Ok(view)
    }

    fn register<H, Args>(
        &self,
        handler: H,
        permission_names: &[String],
        components: &mut BTreeMap<&'static str, DataclassInfo>,
    ) -> Result<Vec<(OperationMeta, ErasedHandler)>, CollectionError>
    where
        H: Handler<Args>,
    {
        if self.methods.is_empty() {
            return Err(CollectionError::NoMethods);
        }
        for (idx, method) in self.methods.iter().enumerate() {
            if self.methods[..idx].contains(method) {
                return Err(CollectionError::OverlappingMethods {
                    method: method.to_string(),
                });
            }
        }

        let params = H::params();
        let mut seen: Vec<&'static str> = Vec::new();
        for (idx, param) in params.iter().enumerate() {
            match param {
                ParamKind::Unclassified(type_name) => {
                    return Err(CollectionError::Unclassified {
                        position: idx + 1,
                        type_name: (*type_name).to_string(),
                    });
                }
                ParamKind::Request => {}
                ParamKind::Query(type_ref) | ParamKind::Body(type_ref) | ParamKind::Path(type_ref) => {
                    let label = param.label();
                    if seen.contains(&label) {
                        return Err(CollectionError::DuplicateClassification {
                            classification: label,
                        });
                    }
                    seen.push(label);
                    collect_dataclass(type_ref, components)?;
                }
            }
        }

        let response = TypeRef::of::<H::Output>();
        let response_info = collect_dataclass(&response, components)?;

        let erased: ErasedHandler = Arc::new(move |req: &ApiRequest| match handler.call(req) {
            Err(errors) => Outcome::Rejected(errors),
            Ok(Err(err)) => Outcome::Failed(err),
            Ok(Ok(value)) => match serialize(&value) {
                Ok(body) => Outcome::Completed(body),
                Err(errors) => Outcome::Invalid(errors),
            },
        });

        Ok(self
            .methods
            .iter()
            .map(|method| {
                let operation_id = self.operation_id.as_ref().map(|name| {
                    if self.methods.len() == 1 {
                        name.clone()
                    } else {
                        format!("{name}_{}", method.as_str().to_ascii_lowercase())
                    }
                });
                let meta = OperationMeta {
                    method: method.clone(),
                    params: params.clone(),
                    response: response_info.clone(),
                    status: self.status,
                    summary: self.summary.clone(),
                    description: self.description.clone(),
                    operation_id,
                    permissions: permission_names.to_vec(),
                };
                (meta, Arc::clone(&erased))
            })
            .collect())
    }
}

fn collect_dataclass(
    type_ref: &TypeRef,
    components: &mut BTreeMap<&'static str, DataclassInfo>,
) -> Result<DataclassInfo, CollectionError> {
    let info = type_ref
        .dataclass()
        .ok_or_else(|| CollectionError::NotADataclass {
            type_name: type_ref.type_name.to_string(),
        })?;
    info.collect_into(components)?;
    Ok(info)
}

fn split_doc(text: &str) -> (Option<String>, Option<String>) {
    let lines: Vec<&str> = text.trim().lines().collect();
    let split = lines
        .iter()
        .position(|line| line.trim().is_empty())
        .unwrap_or(lines.len());
    let summary = lines[..split]
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let description = lines[split..].join("\n").trim().to_string();
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    (non_empty(summary), non_empty(description))
}

/// A view: one handler per HTTP method, sharing permissions.
pub struct ApiView {
    operations: Vec<(OperationMeta, ErasedHandler)>,
    permissions: Vec<Arc<dyn Permission>>,
    components: BTreeMap<&'static str, DataclassInfo>,
}

impl fmt::Debug for ApiView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiView")
            .field("methods", &self.methods())
            .field("permissions", &self.permission_names())
            .field("components", &self.components.keys())
            .finish()
    }
}

impl ApiView {
    /// Serve additional methods with another function.
    ///
    /// The added handler shares this view's permissions, so `builder` must not
    /// declare any. Its status, doc and name apply to its own methods only.
    ///
    /// # Errors
    ///
    /// [`CollectionError::PermissionsOnStackedView`], an overlap with a method
    /// already served, or anything [`ViewBuilder::handler`] would reject.
    pub fn add<H, Args>(mut self, builder: ViewBuilder, handler: H) -> Result<Self, CollectionError>
    where
        H: Handler<Args>,
    {
        if !builder.permissions.is_empty() {
            return Err(CollectionError::PermissionsOnStackedView);
        }
        if let Some(method) = builder.methods.iter().find(|m| self.allows(m)) {
            return Err(CollectionError::OverlappingMethods {
                method: method.to_string(),
            });
        }
        let names = self.permission_names();
        let mut components = self.components.clone();
        let operations = builder.register(handler, &names, &mut components)?;
        debug!(methods = ?builder.methods, "Handler stacked on view");
        self.operations.extend(operations);
        self.components = components;
        Ok(self)
    }

    /// Methods served, in registration order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.operations.iter().map(|(m, _)| m.method.clone()).collect()
    }

    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.operations.iter().any(|(m, _)| &m.method == method)
    }

    /// Per-method metadata for schema generation.
    pub fn operations(&self) -> impl Iterator<Item = &OperationMeta> {
        self.operations.iter().map(|(meta, _)| meta)
    }

    /// Every dataclass reachable from the view, keyed by component name.
    #[must_use]
    pub fn components(&self) -> &BTreeMap<&'static str, DataclassInfo> {
        &self.components
    }

    #[must_use]
    pub fn permission_names(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.name().to_string()).collect()
    }

    /// Dispatch one request.
    ///
    /// Client faults (unknown method, refused permission, invalid input) come
    /// back as `Ok` responses with a 4xx status.
    ///
    /// # Errors
    ///
    /// [`ViewError::Handler`] with the view function's own error, or
    /// [`ViewError::InvalidReturnValue`] when its result does not match the
    /// declared response dataclass.
    pub fn call(&self, req: &ApiRequest) -> Result<ApiResponse, ViewError> {
        let Some((meta, handler)) = self.operations.iter().find(|(m, _)| m.method == req.method)
        else {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                "Method not allowed"
            );
            return Ok(ApiResponse::method_not_allowed(&req.method, &self.methods()));
        };

        if let Some(denied) = self.permissions.iter().find(|p| !p.has_permission(req)) {
            warn!(
                request_id = %req.request_id,
                permission = denied.name(),
                "Permission denied"
            );
            return Ok(ApiResponse::forbidden());
        }

        match handler(req) {
            Outcome::Rejected(errors) => {
                warn!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    issues = errors.len(),
                    "Request validation failed"
                );
                Ok(ApiResponse::validation_error(&errors))
            }
            Outcome::Failed(err) => Err(ViewError::Handler(err)),
            Outcome::Invalid(errors) => {
                error!(
                    request_id = %req.request_id,
                    response = meta.response.name,
                    issues = %errors,
                    "Invalid data returned from view"
                );
                Err(ViewError::InvalidReturnValue(errors))
            }
            Outcome::Completed(body) => {
                debug!(
                    request_id = %req.request_id,
                    status = meta.status.as_u16(),
                    "View completed"
                );
                if meta.status == StatusCode::NO_CONTENT {
                    Ok(ApiResponse::new(meta.status, None))
                } else {
                    Ok(ApiResponse::json(meta.status, body))
                }
            }
        }
    }
}
