use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing_subscriber::EnvFilter;
use weft_di::{
    Args, Class, ContainerBuilder, DynError, HookFuture, HookMethod, HookNames, Hookable, Module,
    Provider, Token,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft_di=debug")),
        )
        .init();

    let url = Token::<String>::new("DatabaseUrl");
    let pool = Token::<Pool>::new("Pool");
    let users = Token::<UserRepository>::new("UserRepository");

    let database = Module::new("database")
        .provider(Provider::value(&url, "postgres://localhost/app".to_string()))
        .provider(Provider::class(&pool).inject(&url))
        .export(&pool);
    let accounts = Module::new("accounts")
        .import(database)
        .provider(
            Provider::factory(&users, |mut args| async move {
                Ok::<_, DynError>(UserRepository { pool: args.next()? })
            })
            .inject(&pool),
        )
        .export(&users);

    let builder = ContainerBuilder::new().register_module(accounts);

    futures::executor::block_on(async {
        let container = builder.build().await.unwrap();
        container.init().await.unwrap();

        let repository = container.get(&users).unwrap();
        println!("{:?}", container);
        println!("connected: {}", repository.pool.connected.load(Ordering::SeqCst));
        println!("{:#}", container.to_json().unwrap());

        container.destroy().await.unwrap();
    });
}

struct Pool {
    url: Arc<String>,
    connected: AtomicBool,
}
impl Pool {
    fn connect(&self) -> HookFuture<'_> {
        Box::pin(async move {
            tracing::info!("Connecting to {}", self.url);
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn close(&self) -> HookFuture<'_> {
        Box::pin(async move {
            tracing::info!("Closing {}", self.url);
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        })
    }
}
impl Hookable for Pool {
    fn lifecycle() -> HookNames {
        HookNames::new().on_init("connect").on_destroy("close")
    }

    fn hook(name: &str) -> Option<HookMethod<Self>> {
        match name {
            "connect" => Some(Pool::connect),
            "close" => Some(Pool::close),
            _ => None,
        }
    }
}
impl Class for Pool {
    async fn construct(mut args: Args) -> Result<Self, DynError> {
        Ok(Pool {
            url: args.next()?,
            connected: AtomicBool::new(false),
        })
    }
}

struct UserRepository {
    pool: Arc<Pool>,
}
