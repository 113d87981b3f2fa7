use super::*;
use pretty_assertions::assert_eq;

fn mk_kuard_ingress(host: &str) -> k8s::Ingress {
    mk_ingress(
        "default",
        "kuard",
        k8s::IngressSpec {
            rules: Some(vec![mk_rule(Some(host), [(None, mk_backend("kuard", 8080))])]),
            ..Default::default()
        },
    )
}

#[test]
fn published_snapshots_are_immutable() {
    let test = TestConfig::default();
    test.apply(mk_service("default", "kuard", &[(None, 8080)]));
    test.apply(mk_kuard_ingress("a.example.com"));
    let before = test.dag();

    test.apply(mk_kuard_ingress("b.example.com"));
    let after = test.dag();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(
        render(&before),
        vec![
            "virtualhost a.example.com:80",
            "  route /",
            "    service default/kuard:8080 weight=0",
        ]
    );
    assert_eq!(
        render(&after),
        vec![
            "virtualhost b.example.com:80",
            "  route /",
            "    service default/kuard:8080 weight=0",
        ]
    );
}

#[test]
fn deleting_a_service_invalidates_its_routes() {
    let test = TestConfig::default();
    test.apply(mk_service("default", "kuard", &[(None, 8080)]));
    test.apply(mk_kuard_ingress("kuard.example.com"));
    assert_eq!(test.dag().roots().len(), 1);

    test.delete::<k8s::Service>("default", "kuard");
    let dag = test.dag();
    assert!(dag.roots().is_empty());
    assert_eq!(
        status(&dag, SourceKind::Ingress, "default", "kuard")
            .unwrap()
            .outcome,
        Outcome::Invalid
    );

    test.delete::<k8s::Ingress>("default", "kuard");
    assert!(test.dag().statuses().is_empty());
}

#[test]
fn unchanged_cache_does_not_republish() {
    let test = TestConfig::default();
    test.apply(mk_service("default", "kuard", &[(None, 8080)]));
    let before = test.dag();

    // Neither deleting an unknown object nor applying one without a
    // namespace changes the cache.
    test.delete::<k8s::Secret>("default", "unknown");
    test.apply(k8s::Secret {
        metadata: k8s::ObjectMeta {
            name: Some("cluster-scoped".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    assert!(Arc::ptr_eq(&before, &test.dag()));
}

#[test]
fn equal_caches_build_equal_graphs() {
    let objects = || {
        let mut root = mk_ingress_route(
            "default",
            "root",
            Some("example.com"),
            vec![
                mk_route("/", &[("kuard", 8080)]),
                mk_delegate("/blog", "blog", None),
            ],
        );
        if let Some(vhost) = root.spec.virtualhost.as_mut() {
            vhost.tls = Some(ingressroute::Tls {
                secret_name: "example-tls".to_string(),
                minimum_protocol_version: None,
            });
        }
        (
            mk_service("default", "kuard", &[(None, 8080)]),
            mk_secret("default", "example-tls"),
            root,
            mk_ingress_route(
                "default",
                "blog",
                None,
                vec![mk_route("/blog", &[("kuard", 8080)])],
            ),
            mk_kuard_ingress("kuard.example.com"),
        )
    };

    let forward = TestConfig::default();
    let (service, secret, root, blog, ingress) = objects();
    forward.apply(service);
    forward.apply(secret);
    forward.apply(root);
    forward.apply(blog);
    forward.apply(ingress);

    let reverse = TestConfig::default();
    let (service, secret, root, blog, ingress) = objects();
    reverse.apply(ingress);
    reverse.apply(blog);
    reverse.apply(root);
    reverse.apply(secret);
    reverse.apply(service);

    let (a, b) = (forward.dag(), reverse.dag());
    assert_eq!(render(&a), render(&b));
    assert_eq!(statuses(&a), statuses(&b));

    // The index can also build without publishing.
    assert_eq!(render(&forward.index.read().build()), render(&a));
}

#[tokio::test]
async fn readers_observe_each_publish() {
    let test = TestConfig::default();
    let mut reader = test.index.read().reader();

    test.apply(mk_service("default", "kuard", &[(None, 8080)]));
    let dag = reader.changed().await.expect("index must be alive");
    assert!(dag.roots().is_empty());

    test.apply(mk_kuard_ingress("kuard.example.com"));
    let dag = reader.changed().await.expect("index must be alive");
    assert_eq!(dag.roots().len(), 1);
    assert!(Arc::ptr_eq(&dag, &test.dag()));

    drop(test);
    assert!(reader.changed().await.is_err());
}
