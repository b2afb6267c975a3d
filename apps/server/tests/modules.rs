mod common;

use axum::http::StatusCode;
use common::{Echo, Impostor, get};
use monolith_kernel::domain::config::Configuration;
use monolith_kernel::error::{RoutingError, StartupError};
use monolith_server::Host;

#[tokio::test]
async fn module_endpoints_resolve_under_their_prefix() {
    let host = Host::new(Configuration::default())
        .add_module("artists", Echo::<1>::default)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let whoami = host
        .endpoints()
        .iter()
        .find(|e| e.name == "whoami")
        .expect("module endpoint");
    assert_eq!(whoami.path, "/artists/whoami");
    assert_eq!(whoami.owner.as_deref(), Some("artists"));
    assert_eq!(whoami.route_values.get("module").map(String::as_str), Some("artists"));

    let (status, body) = get(host.router(), "/artists/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "artists");
}

#[tokio::test]
async fn distinct_prefixes_never_share_route_values() {
    let host = Host::new(Configuration::default())
        .add_module("artists", Echo::<1>::default)
        .add_module("venues", Echo::<2>::default)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let owners: Vec<_> = host
        .endpoints()
        .iter()
        .filter(|e| e.owner.is_some())
        .map(|e| (e.owner.clone().unwrap_or_default(), e.route_values.get("module").cloned()))
        .collect();
    assert_eq!(
        owners,
        [
            ("artists".to_owned(), Some("artists".to_owned())),
            ("venues".to_owned(), Some("venues".to_owned())),
        ]
    );

    assert_eq!(get(host.router(), "/artists/whoami").await.1, "artists");
    assert_eq!(get(host.router(), "/venues/whoami").await.1, "venues");
}

#[test]
fn duplicate_prefix_is_rejected() {
    let err = Host::new(Configuration::default())
        .add_module("catalog", Echo::<1>::default)
        .add_module("catalog", Echo::<2>::default)
        .configure_services()
        .expect_err("duplicate prefix");

    assert!(matches!(err, StartupError::DuplicatePrefix { .. }), "{err}");
}

#[test]
fn registering_the_same_module_twice_is_rejected() {
    let err = Host::new(Configuration::default())
        .add_module("artists", Echo::<1>::default)
        .add_module("artists-again", Echo::<1>::default)
        .configure_services()
        .expect_err("duplicate module");

    assert!(matches!(err, StartupError::DuplicateModule { .. }), "{err}");
}

#[test]
fn unresolved_module_placeholder_fails_pipeline() {
    let err = Host::new(Configuration::default())
        .add_module("impostor", || Impostor)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect_err("unresolved placeholder");

    assert!(
        matches!(
            err,
            StartupError::Routing { source: RoutingError::UnresolvedRouteValue { .. }, .. }
        ),
        "{err}"
    );
}

#[test]
fn registry_is_in_registration_order() {
    let host = Host::new(Configuration::default())
        .add_module("venues", Echo::<2>::default)
        .add_module("artists", Echo::<1>::default)
        .configure_services()
        .expect("services");

    let prefixes: Vec<_> = host.registry().iter().map(|d| d.route_prefix().to_owned()).collect();
    assert_eq!(prefixes, ["venues", "artists"]);
}
