#![allow(dead_code)]

use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
};

use weft_di::{
    provider::ClassProvider, Args, Class, DynError, HookFuture, HookMethod, HookNames, Hookable,
    Instance, Provider, Token,
};

/// Shared hook log, injected into every [`Service`]
#[derive(Default)]
pub struct Log(Mutex<Vec<String>>);

impl Log {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub trait Named: Send + Sync + 'static {
    const NAME: &'static str;
}

macro_rules! named {
    ($($name:ident),*) => {
        $(
            pub struct $name;
            impl Named for $name {
                const NAME: &'static str = stringify!($name);
            }
        )*
    };
}
named!(A, B, C, D);

/// Records its hooks as `<name>:init` / `<name>:destroy`
pub struct Service<N> {
    pub log: Arc<Log>,
    pub dependencies: Vec<Instance>,
    marker: PhantomData<N>,
}

impl<N: Named> Service<N> {
    pub fn new(log: Arc<Log>) -> Self {
        Service {
            log,
            dependencies: Vec::new(),
            marker: PhantomData,
        }
    }

    fn init(&self) -> HookFuture<'_> {
        Box::pin(async move {
            self.log.push(format!("{}:init", N::NAME));
            Ok(())
        })
    }

    fn destroy(&self) -> HookFuture<'_> {
        Box::pin(async move {
            self.log.push(format!("{}:destroy", N::NAME));
            Ok(())
        })
    }

    /// Suspends once before completing
    fn pause(&self) -> HookFuture<'_> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(())
        })
    }

    fn explode(&self) -> HookFuture<'_> {
        Box::pin(async move { Err::<(), DynError>(format!("{} exploded", N::NAME).into()) })
    }
}

impl<N: Named> Hookable for Service<N> {
    fn lifecycle() -> HookNames {
        HookNames::new().on_init("init").on_destroy("destroy")
    }

    fn hook(name: &str) -> Option<HookMethod<Self>> {
        match name {
            "init" => Some(Self::init),
            "destroy" => Some(Self::destroy),
            "pause" => Some(Self::pause),
            "explode" => Some(Self::explode),
            _ => None,
        }
    }
}

impl<N: Named> Class for Service<N> {
    async fn construct(mut args: Args) -> Result<Self, DynError> {
        let mut service = Service::new(args.next()?);
        while !args.is_empty() {
            service.dependencies.push(args.next()?);
        }
        Ok(service)
    }
}

pub fn log_token() -> Token<Log> {
    Token::new("Log")
}

pub fn log_provider(log: &Arc<Log>) -> Provider {
    Provider::shared(&log_token(), log.clone()).into()
}

/// Class provider of a [`Service`], the log is always its first argument
pub fn service<N: Named>(token: &Token<Service<N>>) -> ClassProvider {
    Provider::class(token).inject(&log_token())
}
