mod common;

use common::{MyQueryData, MyResponse};
use http::Method;
use serde::{Deserialize, Serialize};
use speccify::{
    api_view, Api, ApiRequest, CollectionError, Data, Dataclass, DenyAll, Empty, FieldErrors,
    FromApiRequest, Path, Query,
};

fn length(query: Query<MyQueryData>) -> anyhow::Result<MyResponse> {
    Ok(MyResponse {
        length: query.name.len(),
    })
}

#[test]
fn test_two_query_parameters_rejected() {
    let err = api_view([Method::GET])
        .handler(|_: Query<MyQueryData>, _: Query<MyQueryData>| -> anyhow::Result<Empty> {
            Ok(Empty {})
        })
        .unwrap_err();
    assert_eq!(
        err,
        CollectionError::DuplicateClassification {
            classification: "Query"
        }
    );
    assert!(err.to_string().contains("At most one"));

    let err = api_view([Method::POST])
        .handler(|_: Data<MyQueryData>, _: Data<MyResponse>| -> anyhow::Result<Empty> {
            Ok(Empty {})
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "At most one `Data` parameter is allowed");
}

#[test]
fn test_request_may_appear_next_to_classified_parameters() {
    let view = api_view([Method::GET])
        .handler(
            |req: ApiRequest, q: Query<MyQueryData>| -> anyhow::Result<MyResponse> {
                Ok(MyResponse {
                    length: req.path.len() + q.name.len(),
                })
            },
        )
        .unwrap();
    let res = view.call(&ApiRequest::get("/ab?name=c")).unwrap();
    assert_eq!(res.body.unwrap()["length"], 4);
}

#[test]
fn test_non_dataclass_types_rejected() {
    let err = api_view([Method::GET])
        .handler(|_: Query<String>| -> anyhow::Result<Empty> { Ok(Empty {}) })
        .unwrap_err();
    assert_eq!(
        err,
        CollectionError::NotADataclass {
            type_name: "alloc::string::String".into()
        }
    );
    assert_eq!(err.to_string(), "`alloc::string::String` must be a dataclass");

    let err = api_view([Method::GET])
        .handler(|_: Query<MyQueryData>| -> anyhow::Result<Vec<MyResponse>> { Ok(Vec::new()) })
        .unwrap_err();
    assert!(matches!(err, CollectionError::NotADataclass { .. }));
}

struct Tenant(String);

impl FromApiRequest for Tenant {
    fn from_request(req: &ApiRequest) -> Result<Self, FieldErrors> {
        Ok(Tenant(req.get_header("x-tenant").unwrap_or("").to_string()))
    }
}

#[test]
fn test_unclassified_extractor_rejected() {
    let err = api_view([Method::GET])
        .handler(|_: Query<MyQueryData>, t: Tenant| -> anyhow::Result<Empty> {
            let _ = t.0;
            Ok(Empty {})
        })
        .unwrap_err();
    match err {
        CollectionError::Unclassified {
            position,
            type_name,
        } => {
            assert_eq!(position, 2);
            assert!(type_name.ends_with("Tenant"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

mod v1 {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, speccify::Dataclass)]
    pub struct Pet {
        pub name: String,
    }
}

mod v2 {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, speccify::Dataclass)]
    pub struct Pet {
        pub id: u64,
    }
}

#[derive(Serialize, Deserialize, Dataclass)]
struct Adoption {
    old: v1::Pet,
    new: v2::Pet,
}

#[test]
fn test_name_in_use_within_one_view() {
    let err = api_view([Method::GET])
        .handler(|_: Query<v1::Pet>| -> anyhow::Result<v2::Pet> { Ok(v2::Pet { id: 1 }) })
        .unwrap_err();
    assert!(matches!(err, CollectionError::NameInUse { ref name, .. } if name == "Pet"));
    assert!(err.to_string().starts_with("Name already in use"));

    let err = api_view([Method::GET])
        .handler(|_: ApiRequest| -> anyhow::Result<Adoption> {
            anyhow::bail!("not reached")
        })
        .unwrap_err();
    assert!(matches!(err, CollectionError::NameInUse { .. }));
}

#[test]
fn test_name_in_use_across_views() {
    let mut api = Api::default();
    api.route(
        "/old",
        api_view([Method::GET])
            .handler(|_: ApiRequest| -> anyhow::Result<v1::Pet> {
                Ok(v1::Pet { name: "a".into() })
            })
            .unwrap(),
    )
    .unwrap();
    let err = api
        .route(
            "/new",
            api_view([Method::GET])
                .handler(|_: ApiRequest| -> anyhow::Result<v2::Pet> { Ok(v2::Pet { id: 2 }) })
                .unwrap(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::NameInUse { .. }));
    assert_eq!(api.views().count(), 1);
}

#[test]
fn test_overlapping_methods_rejected() {
    let err = api_view([Method::GET, Method::POST, Method::GET])
        .handler(length)
        .unwrap_err();
    assert_eq!(err.to_string(), "overlapping methods are not allowed (`GET`)");

    let view = api_view([Method::GET, Method::POST]).handler(length).unwrap();
    let err = view
        .add(api_view([Method::PUT, Method::POST]), length)
        .unwrap_err();
    assert_eq!(
        err,
        CollectionError::OverlappingMethods {
            method: "POST".into()
        }
    );
}

#[test]
fn test_stacked_view_cannot_declare_permissions() {
    let view = api_view([Method::GET]).handler(length).unwrap();
    let err = view
        .add(api_view([Method::POST]).permission(DenyAll), length)
        .unwrap_err();
    assert_eq!(err, CollectionError::PermissionsOnStackedView);
    assert!(err.to_string().contains("shared with the parent view"));
}

#[derive(Serialize, Deserialize, Dataclass)]
struct OwnerPath {
    owner: String,
    repo: String,
}

fn repo(path: Path<OwnerPath>) -> anyhow::Result<MyResponse> {
    Ok(MyResponse {
        length: path.owner.len() + path.repo.len(),
    })
}

#[test]
fn test_path_fields_must_match_captures() {
    let mut api = Api::default();
    let err = api
        .route(
            "/repos/{owner}",
            api_view([Method::GET]).handler(repo).unwrap(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::PathParameterMismatch { .. }));
    assert!(err.to_string().contains("`repo`"));

    let err = api
        .route(
            "/repos/{owner}/{repo}/{branch}",
            api_view([Method::GET]).handler(repo).unwrap(),
        )
        .err()
        .unwrap();
    assert!(err.to_string().contains("`{branch}`"));

    let err = api
        .route("/users/{id}", api_view([Method::GET]).handler(length).unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::PathParameterMismatch { .. }));

    api.route(
        "/repos/{owner}/{repo}",
        api_view([Method::GET]).handler(repo).unwrap(),
    )
    .unwrap();
    let res = api.respond(ApiRequest::get("/repos/rust-lang/rust"));
    assert_eq!(res.body.unwrap()["length"], 13);
}

#[test]
fn test_duplicate_and_invalid_routes() {
    let mut api = Api::default();
    api.route("/a", api_view([Method::GET]).handler(length).unwrap())
        .unwrap();
    let err = api
        .route("/a", api_view([Method::POST]).handler(length).unwrap())
        .err()
        .unwrap();
    assert_eq!(err, CollectionError::DuplicateRoute { pattern: "/a".into() });

    let err = api
        .raw_route("/a", Method::PUT, |_| speccify::ApiResponse::not_found())
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::DuplicateRoute { .. }));

    let err = api
        .route("a/{", api_view([Method::GET]).handler(length).unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::InvalidPattern { .. }));
}
