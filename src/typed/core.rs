use crate::dataclass::{dataclass_of, DataclassInfo, FieldType, Schema};
use crate::serializer::{coerce_params, validate, Location};
use crate::server::{ApiRequest, RequestBody};
use crate::validator::{FieldErrors, NON_FIELD_ERRORS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::type_name;
use std::ops::{Deref, DerefMut};

/// A Rust type together with the wire type it maps to.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub type_name: &'static str,
    pub ty: FieldType,
}

impl TypeRef {
    #[must_use]
    pub fn of<T: Schema>() -> Self {
        TypeRef {
            type_name: type_name::<T>(),
            ty: T::field_type(),
        }
    }

    /// The dataclass behind this type, or `None` if it is not one.
    #[must_use]
    pub fn dataclass(&self) -> Option<DataclassInfo> {
        self.ty.dataclass()
    }
}

/// Where a handler argument gets its data from.
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// [`Query<T>`]: the query string
    Query(TypeRef),
    /// [`Data<T>`]: the request body
    Body(TypeRef),
    /// [`Path<T>`]: the `{captures}` of the route pattern
    Path(TypeRef),
    /// The raw [`ApiRequest`]
    Request,
    /// An extractor that did not declare a source
    Unclassified(&'static str),
}

impl ParamKind {
    /// Wrapper name as written in handler signatures.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::Query(_) => "Query",
            ParamKind::Body(_) => "Data",
            ParamKind::Path(_) => "Path",
            ParamKind::Request => "ApiRequest",
            ParamKind::Unclassified(_) => "unclassified",
        }
    }

    /// The wrapped type, for the three dataclass-carrying kinds.
    #[must_use]
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            ParamKind::Query(t) | ParamKind::Body(t) | ParamKind::Path(t) => Some(t),
            ParamKind::Request | ParamKind::Unclassified(_) => None,
        }
    }
}

/// Handler argument that can be built from an [`ApiRequest`].
///
/// `classify` is consulted once at registration; `from_request` on every call.
/// Implementations that keep the default `classify` are rejected when the view
/// is built.
pub trait FromApiRequest: Sized {
    fn classify() -> ParamKind {
        ParamKind::Unclassified(type_name::<Self>())
    }

    /// # Errors
    ///
    /// Every problem found in the part of the request this extractor reads.
    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors>;
}

macro_rules! wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name<T>(pub T);

        impl<T> $name<T> {
            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T> DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut T {
                &mut self.0
            }
        }
    };
}

wrapper!(
    /// Dataclass read from the query string.
    Query
);
wrapper!(
    /// Dataclass read from the request body (JSON or form-encoded).
    Data
);
wrapper!(
    /// Dataclass read from the route's `{captures}`.
    Path
);

fn not_a_dataclass<T>(location: Location) -> FieldErrors {
    FieldErrors::single(
        location.as_str(),
        NON_FIELD_ERRORS,
        format!("`{}` must be a dataclass", type_name::<T>()),
    )
}

impl<T: Schema + DeserializeOwned> FromApiRequest for Query<T> {
    fn classify() -> ParamKind {
        ParamKind::Query(TypeRef::of::<T>())
    }

    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors> {
        let info = dataclass_of::<T>().ok_or_else(|| not_a_dataclass::<T>(Location::Query))?;
        let raw = coerce_params(&info, &req.query_params);
        validate(&raw, Location::Query).map(Query)
    }
}

impl<T: Schema + DeserializeOwned> FromApiRequest for Path<T> {
    fn classify() -> ParamKind {
        ParamKind::Path(TypeRef::of::<T>())
    }

    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors> {
        let info = dataclass_of::<T>().ok_or_else(|| not_a_dataclass::<T>(Location::Path))?;
        let raw = coerce_params(&info, &req.path_params);
        validate(&raw, Location::Path).map(Path)
    }
}

impl<T: Schema + DeserializeOwned> FromApiRequest for Data<T> {
    fn classify() -> ParamKind {
        ParamKind::Body(TypeRef::of::<T>())
    }

    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors> {
        let location = Location::Body;
        match &req.body {
            RequestBody::Json(raw) => validate(raw, location).map(Data),
            RequestBody::Form(pairs) => {
                let info = dataclass_of::<T>().ok_or_else(|| not_a_dataclass::<T>(location))?;
                validate(&coerce_params(&info, pairs), location).map(Data)
            }
            // A missing body only passes when every field is optional
            RequestBody::Empty => validate(&Value::Object(Map::new()), location).map(Data),
            RequestBody::Invalid(message) => Err(FieldErrors::single(
                location.as_str(),
                NON_FIELD_ERRORS,
                message.as_str(),
            )),
        }
    }
}

impl FromApiRequest for ApiRequest {
    fn classify() -> ParamKind {
        ParamKind::Request
    }

    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors> {
        Ok(req.clone())
    }
}

/// A function usable as a view.
///
/// Implemented for every `Fn(A1, .., An) -> anyhow::Result<R>` with up to six
/// [`FromApiRequest`] arguments, where `R` is a dataclass.
pub trait Handler<Args>: Send + Sync + 'static {
    type Output: Schema + Serialize;

    /// Classification of every argument, in declaration order.
    fn params() -> Vec<ParamKind>;

    /// Extract every argument and call the function.
    ///
    /// The outer `Err` carries the extraction problems of all arguments
    /// together; the inner result is whatever the function returned.
    fn call(&self, req: &ApiRequest) -> Result<anyhow::Result<Self::Output>, FieldErrors>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_mut, unreachable_patterns)]
        impl<F, R, $($arg,)*> Handler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> anyhow::Result<R> + Send + Sync + 'static,
            R: Schema + Serialize,
            $($arg: FromApiRequest,)*
        {
            type Output = R;

            fn params() -> Vec<ParamKind> {
                vec![$($arg::classify()),*]
            }

            fn call(&self, req: &ApiRequest) -> Result<anyhow::Result<R>, FieldErrors> {
                let mut errors = FieldErrors::new();
                $(
                    let $arg = match $arg::from_request(req) {
                        Ok(value) => Some(value),
                        Err(issues) => {
                            errors.extend(issues);
                            None
                        }
                    };
                )*
                match ($($arg,)*) {
                    ($(Some($arg),)*) if errors.is_empty() => Ok((self)($($arg),*)),
                    _ => Err(errors),
                }
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
