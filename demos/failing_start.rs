//! # Example: Failing start
//!
//! `cache` fails to start. The modules started before it are stopped in reverse
//! order and the run returns the combined error.
//!
//! ```bash
//! cargo run --example failing_start
//! ```

use std::sync::Arc;

use modvisor::{BoxError, Context, Controller, ModuleFn, PhaseError, Subscribe};

fn module(name: &'static str, fail_start: bool) -> ModuleFn<
    impl Fn(Context) -> std::future::Ready<Result<(), BoxError>> + Send + Sync + 'static,
    impl Fn(Context) -> std::future::Ready<Result<(), BoxError>> + Send + Sync + 'static,
> {
    ModuleFn::new(
        move |_ctx: Context| {
            println!("[{name}] start");
            if fail_start {
                std::future::ready(Err::<(), BoxError>(format!("{name} refused").into()))
            } else {
                std::future::ready(Ok(()))
            }
        },
        move |_ctx: Context| {
            println!("[{name}] stop");
            std::future::ready(Ok(()))
        },
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(modvisor::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let controller = Controller::builder().with_subscribers(subs).build();
    #[cfg(feature = "logging")]
    controller.add("logging", modvisor::LoggingModule::new());
    controller.add("config", module("config", false));
    controller.add("db", module("db", false));
    controller.add("cache", module("cache", true));
    controller.add("http", module("http", false));

    let err = match controller.run(Some(Context::new())).await {
        Ok(()) => anyhow::bail!("expected the run to fail"),
        Err(err) => err,
    };

    println!("run failed: {err}");
    if let Some(phase) = err.find::<PhaseError>() {
        println!("first failure: phase={} module={}", phase.phase, phase.module);
    }
    Ok(())
}
