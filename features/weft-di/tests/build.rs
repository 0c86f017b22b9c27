mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::{log_provider, service, Log, Service, A, B};
use rstest::rstest;
use weft_di::{
    errors::{BuildError, TokenRegistryError},
    ContainerBuilder, DynError, Module, Provider, Token, TokenId, TokenRegistry,
};

fn counting_factory(token: &Token<String>, counter: &Arc<AtomicUsize>) -> Provider {
    let counter = counter.clone();
    Provider::factory(token, move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, DynError>("shared".to_string())
        }
    })
    .into()
}

fn names(path: &[TokenId]) -> Vec<&str> {
    path.iter().map(TokenId::name).collect()
}

#[tokio::test]
async fn cycle_is_rejected_with_its_path() {
    let log = Arc::new(Log::default());
    let token_a = Token::<Service<A>>::new("TokenA");
    let token_b = Token::<Service<B>>::new("TokenB");

    let err = ContainerBuilder::new()
        .register_provider(log_provider(&log))
        .register_provider(service(&token_a).inject(&token_b))
        .register_provider(service(&token_b).inject(&token_a))
        .build()
        .await
        .unwrap_err();

    let BuildError::CyclicDependency { path } = err else {
        panic!("expected a cycle, got {err}");
    };
    assert_eq!(names(&path), vec!["TokenA", "TokenB", "TokenA"]);
}

#[tokio::test]
async fn diamond_import_is_instantiated_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let shared = Token::<String>::new("shared");
    let left = Token::<usize>::new("left");
    let right = Token::<usize>::new("right");

    let core = Arc::new(
        Module::new("core")
            .provider(counting_factory(&shared, &counter))
            .export(&shared),
    );
    let length = |token: &Token<usize>| {
        Provider::factory(token, |mut args| async move {
            let shared: Arc<String> = args.next()?;
            Ok::<_, DynError>(shared.len())
        })
        .inject(&shared)
    };
    let left_module = Module::new("left")
        .import(core.clone())
        .provider(length(&left));
    let right_module = Module::new("right")
        .import(core)
        .provider(length(&right));

    let container = ContainerBuilder::new()
        .register_module(left_module)
        .register_module(right_module)
        .build()
        .await
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(container.graph().len(), 3);
    assert_eq!(*container.get(&left).unwrap(), 6);
    assert_eq!(*container.get(&right).unwrap(), 6);
}

#[rstest]
#[case::hidden(false)]
#[case::exported(true)]
#[tokio::test]
async fn imported_tokens_need_an_export(#[case] exported: bool) {
    let url = Token::<String>::new("DatabaseUrl");
    let users = Token::<String>::new("UserRepository");

    let mut database =
        Module::new("database").provider(Provider::value(&url, "postgres://db".to_string()));
    if exported {
        database = database.export(&url);
    }
    let accounts = Module::new("accounts").import(database).provider(
        Provider::factory(&users, |mut args| async move {
            let url: Arc<String> = args.next()?;
            Ok::<_, DynError>(format!("users@{url}"))
        })
        .inject(&url),
    );

    let result = ContainerBuilder::new()
        .register_module(accounts)
        .build()
        .await;

    if exported {
        assert_eq!(*result.unwrap().get(&users).unwrap(), "users@postgres://db");
    } else {
        assert!(matches!(
            result,
            Err(BuildError::TokenNotVisible { ref token, ref module, ref required_by })
                if token.name() == "DatabaseUrl"
                    && module.as_deref() == Some("accounts")
                    && required_by.name() == "UserRepository"
        ));
    }
}

#[tokio::test]
async fn reexported_token_reaches_the_importer_of_the_importer() {
    let url = Token::<String>::new("DatabaseUrl");
    let length = Token::<usize>::new("UrlLength");

    let database = Module::new("database")
        .provider(Provider::value(&url, "postgres://db".to_string()))
        .export(&url);
    let persistence = Module::new("persistence").import(database).export(&url);
    let app = Module::new("app").import(persistence).provider(
        Provider::factory(&length, |mut args| async move {
            let url: Arc<String> = args.next()?;
            Ok::<_, DynError>(url.len())
        })
        .inject(&url),
    );

    let container = ContainerBuilder::new()
        .register_module(app)
        .build()
        .await
        .unwrap();

    assert_eq!(*container.get(&length).unwrap(), 13);
    let url_node = container.node("DatabaseUrl").unwrap();
    assert_eq!(url_node.metadata().module.as_deref(), Some("database"));
}

#[tokio::test]
async fn unexported_module_tokens_are_hidden_from_floating_providers() {
    let secret = Token::<u8>::new("secret");
    let reader = Token::<u8>::new("reader");

    let err = ContainerBuilder::new()
        .register_module(Module::new("vault").provider(Provider::value(&secret, 7)))
        .register_provider(
            Provider::factory(&reader, |mut args| async move {
                let secret: Arc<u8> = args.next()?;
                Ok::<_, DynError>(*secret)
            })
            .inject(&secret),
        )
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::TokenNotVisible { ref module, .. } if module.is_none()
    ));
}

#[tokio::test]
async fn missing_dependency_is_reported_with_dependent() {
    let repository = Token::<String>::new("UserRepository");
    let url = Token::<String>::new("DatabaseUrl");

    let err = ContainerBuilder::new()
        .register_provider(
            Provider::factory(&repository, |_| async { Ok::<_, DynError>(String::new()) })
                .inject(&url),
        )
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::UnresolvedDependency { ref token, ref required_by }
            if token.name() == "DatabaseUrl" && required_by.name() == "UserRepository"
    ));
    assert_eq!(
        err.to_string(),
        "'UserRepository' depends on 'DatabaseUrl' but it is missing"
    );
}

#[tokio::test]
async fn optional_dependency_resolves_to_none_when_missing() {
    let cache = Token::<String>::new("cache");
    let uses_cache = Token::<bool>::new("uses_cache");

    let container = ContainerBuilder::new()
        .register_provider(
            Provider::factory(&uses_cache, |mut args| async move {
                let cache: Option<Arc<String>> = args.next()?;
                Ok::<_, DynError>(cache.is_some())
            })
            .inject_optional(&cache),
        )
        .build()
        .await
        .unwrap();

    assert!(!*container.get(&uses_cache).unwrap());
    assert!(container.node("uses_cache").unwrap().dependencies().next().is_none());
}

#[tokio::test]
async fn duplicate_token_across_modules_is_rejected() {
    let port = Token::<u16>::new("port");

    let err = ContainerBuilder::new()
        .register_module(Module::new("http").provider(Provider::value(&port, 80)))
        .register_module(Module::new("admin").provider(Provider::value(&port, 8080)))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::DuplicateTokenRegistration { ref first, ref second, .. }
            if first.as_deref() == Some("http") && second.as_deref() == Some("admin")
    ));
}

#[tokio::test]
async fn duplicate_token_with_other_type_is_still_a_duplicate() {
    let err = ContainerBuilder::new()
        .register_module(
            Module::new("http").provider(Provider::value(&Token::<u16>::new("port"), 80)),
        )
        .register_module(
            Module::new("admin")
                .provider(Provider::value(&Token::<String>::new("port"), "8080".to_string())),
        )
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::DuplicateTokenRegistration { ref token, ref first, ref second }
            if token.name() == "port"
                && first.as_deref() == Some("http")
                && second.as_deref() == Some("admin")
    ));
}

#[tokio::test]
async fn floating_instances_sharing_a_name_are_duplicates() {
    let err = ContainerBuilder::new()
        .add_instance(&Token::<u8>::new("x"), 1)
        .add_instance(&Token::<u16>::new("x"), 2)
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::DuplicateTokenRegistration { ref token, ref first, ref second }
            if token.name() == "x" && first.is_none() && second.is_none()
    ));
}

#[tokio::test]
async fn exporting_a_foreign_token_is_rejected() {
    let port = Token::<u16>::new("port");

    let err = ContainerBuilder::new()
        .register_module(Module::new("http").export(&port))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::InvalidExport { ref token, ref module } if token.name() == "port" && module == "http"
    ));
}

#[tokio::test]
async fn registry_rejects_rebinding_a_name_to_another_type() {
    let mut registry = TokenRegistry::new();
    let port = registry.token::<u16>("port").unwrap();
    assert!(matches!(
        registry.token::<String>("port"),
        Err(TokenRegistryError::Conflict { .. })
    ));

    let builder = ContainerBuilder::with_registry(registry.clone())
        .add_instance(&Token::<String>::new("port"), "80".to_string());
    assert!(matches!(
        builder.build().await,
        Err(BuildError::TypeMismatch { ref token, .. }) if token.name() == "port"
    ));

    let container = ContainerBuilder::with_registry(registry)
        .add_instance(&port, 80)
        .build()
        .await
        .unwrap();
    assert_eq!(*container.get(&port).unwrap(), 80);
    assert!(container.registry().contains("port"));
}

#[tokio::test]
async fn build_records_every_token_in_the_registry() {
    let mut registry = TokenRegistry::new();
    let port = registry.token::<u16>("port").unwrap();
    let host = Token::<String>::new("host");

    let container = ContainerBuilder::with_registry(registry)
        .add_instance(&port, 80)
        .register_module(Module::new("net").provider(Provider::value(&host, "::1".to_string())))
        .build()
        .await
        .unwrap();

    let names: Vec<&str> = container
        .registry()
        .tokens()
        .into_iter()
        .map(|token| token.name())
        .collect();
    assert_eq!(names, vec!["host", "port"]);
    assert_eq!(
        container.registry().type_of("host").map(|info| info.type_name),
        Some(std::any::type_name::<String>())
    );
}

#[tokio::test]
async fn failing_provider_fails_the_build() {
    let broken = Token::<u8>::new("broken");

    let err = ContainerBuilder::new()
        .register_provider(Provider::factory(&broken, |_| async {
            Err::<u8, DynError>("connection refused".into())
        }))
        .build()
        .await
        .unwrap_err();

    let BuildError::ProviderFailed { token, error } = err else {
        panic!("expected a provider failure");
    };
    assert_eq!(token.name(), "broken");
    assert_eq!(error.to_string(), "connection refused");
}

#[tokio::test]
async fn unknown_hook_name_fails_the_build() {
    let log = Arc::new(Log::default());
    let token_a = Token::<Service<A>>::new("TokenA");

    let err = ContainerBuilder::new()
        .register_provider(log_provider(&log))
        .register_provider(service(&token_a).on_init("warm_up"))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::HookBinding { ref token, ref source }
            if token.name() == "TokenA" && source.hook == "warm_up"
    ));
}

#[tokio::test]
async fn deferred_providers_load_once_per_build() {
    let loads = Arc::new(AtomicUsize::new(0));
    let flag = Token::<bool>::new("feature_flag");

    let features = {
        let loads = loads.clone();
        let flag = flag.clone();
        let deferred_flag = flag.clone();
        Arc::new(
            Module::deferred("features", move || {
                let loads = loads.clone();
                let flag = deferred_flag.clone();
                async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<Vec<Provider>, DynError>(vec![Provider::value(&flag, true).into()])
                }
            })
            .export(&flag),
        )
    };
    let builder = ContainerBuilder::new()
        .register_module(Module::new("one").import(features.clone()))
        .register_module(Module::new("two").import(features));

    let first = builder.build().await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(*first.get(&flag).unwrap());

    let second = builder.build().await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert!(!first.get_instance("feature_flag").unwrap().ptr_eq(
        &second.get_instance("feature_flag").unwrap()
    ));
}

#[tokio::test]
async fn failing_deferred_module_fails_the_build() {
    let err = ContainerBuilder::new()
        .register_module(Module::deferred("remote", || async {
            Err::<Vec<Provider>, DynError>("unreachable".into())
        }))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::ModuleProvidersFailed { ref module, .. } if module == "remote"
    ));
}
