//! # Example: Basic application
//!
//! Two modules with a dependency between them. `db` is registered first, so it
//! starts first and stops last. The run ends after two seconds, or on Ctrl-C.
//!
//! ```bash
//! cargo run --example basic
//! ```

use std::time::Duration;

use async_trait::async_trait;
use modvisor::{
    AppInfo, Application, BoxError, Context, Module, ModuleFn, PostStarter, PreStarter,
};

/// A module using the optional hooks.
struct Database;

#[async_trait]
impl PreStarter for Database {
    async fn pre_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        println!("[db] checking schema");
        Ok(())
    }
}

#[async_trait]
impl PostStarter for Database {
    async fn post_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        println!("[db] warm-up done");
        Ok(())
    }
}

#[async_trait]
impl Module for Database {
    async fn start(&self, ctx: &Context) -> Result<(), BoxError> {
        if let Some(info) = AppInfo::from_context(ctx) {
            println!("[db] connecting for {info}");
        }
        Ok(())
    }

    async fn stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        println!("[db] disconnected");
        Ok(())
    }

    fn as_pre_starter(&self) -> Option<&dyn PreStarter> {
        Some(self)
    }

    fn as_post_starter(&self) -> Option<&dyn PostStarter> {
        Some(self)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let app = Application::bootstrap("basic", env!("CARGO_PKG_VERSION"))
        .with_module("db", Database)
        .with_module(
            "http",
            ModuleFn::new(
                |_ctx: Context| async {
                    println!("[http] listening");
                    Ok::<_, BoxError>(())
                },
                |_ctx: Context| async {
                    println!("[http] closed");
                    Ok::<_, BoxError>(())
                },
            ),
        );

    println!("running {app}");
    let sup = app.supervisor();
    let exit = sup.exit_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        exit.exit(None);
    });

    match app.run_with(&sup, None).await {
        Ok(()) => println!("clean shutdown"),
        Err(err) => println!("finished with: {err}"),
    }
    Ok(())
}
